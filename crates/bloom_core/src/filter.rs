//! Sized Bloom filter with a shared, lock-free read path.
//!
//! Indices come from two XXH64 rounds: `a = h(key, HASH_SEED)`,
//! `b = h(key, a)`, `x_i = (a + b*i) mod bits`. `add` is serialized by a
//! per-filter mutex; `check` never locks and may miss an insertion that is
//! still in flight on another thread.

use crate::bits::BitBuf;
use crate::consts::{HASH_SEED, VERSION_MAJOR, VERSION_MINOR};
use crate::errors::{BloomError, Result};
use crate::info::BloomInfo;
use crate::meta::Meta;
use crate::params::BloomParams;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

#[inline]
fn h64(key: &[u8], seed: u64) -> u64 { xxhash_rust::xxh64::xxh64(key, seed) }

/// Outcome of [`Bloom::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Added {
    /// At least one indexed bit was clear before the call.
    Inserted,
    /// Every indexed bit was already set (possibly a false positive).
    AlreadyPresent,
}

pub struct Bloom {
    params: BloomParams,
    bits: Option<BitBuf>,
    major: u8,
    minor: u8,
    write_lock: Mutex<()>,
}

impl Default for Bloom {
    /// An empty, unready filter; the state a failed load leaves behind.
    fn default() -> Self {
        Self { params: BloomParams::default(), bits: None, major: 0, minor: 0, write_lock: Mutex::new(()) }
    }
}

impl std::fmt::Debug for Bloom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bloom")
            .field("params", &self.params)
            .field("ready", &self.is_ready())
            .field("version", &(self.major, self.minor))
            .finish()
    }
}

impl Bloom {
    /// Sizes and allocates a filter for `entries` elements at `error` false-positive rate.
    pub fn new(entries: u64, error: f64) -> Result<Self> {
        let params = BloomParams::derive(entries, error)?;
        let bits = BitBuf::zeroed(params.bytes)?;
        debug!(entries, error, bits = params.bits, bytes = params.bytes, hashes = params.hashes, "bloom filter created");
        Ok(Self {
            params,
            bits: Some(bits),
            major: VERSION_MAJOR,
            minor: VERSION_MINOR,
            write_lock: Mutex::new(()),
        })
    }

    /// Computes every parameter but allocates nothing; the result is never ready.
    /// Use it to see what a filter would cost before building one.
    pub fn dummy(entries: u64, error: f64) -> Result<Self> {
        let params = BloomParams::derive(entries, error)?;
        Ok(Self { params, major: VERSION_MAJOR, minor: VERSION_MINOR, ..Self::default() })
    }

    pub(crate) fn from_parts(meta: Meta, bits: BitBuf) -> Self {
        Self {
            params: meta.params,
            bits: Some(bits),
            major: meta.major,
            minor: meta.minor,
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn meta(&self) -> Meta {
        Meta { params: self.params, ready: self.is_ready(), major: self.major, minor: self.minor }
    }

    fn not_ready(&self) -> BloomError {
        warn!("bloom filter at {:p} not initialized", self);
        BloomError::NotReady
    }

    pub(crate) fn buffer(&self) -> Result<&BitBuf> {
        self.bits.as_ref().ok_or_else(|| self.not_ready())
    }

    pub fn is_ready(&self) -> bool { self.bits.is_some() }
    pub fn params(&self) -> &BloomParams { &self.params }
    pub fn entries(&self) -> u64 { self.params.entries }
    pub fn error(&self) -> f64 { self.params.error }
    pub fn bits(&self) -> u64 { self.params.bits }
    pub fn bytes(&self) -> u64 { self.params.bytes }
    pub fn hashes(&self) -> u8 { self.params.hashes }
    pub fn version(&self) -> (u8, u8) { (self.major, self.minor) }

    #[inline]
    fn indices(&self, key: &[u8]) -> impl Iterator<Item = u64> {
        let a = h64(key, HASH_SEED);
        let b = h64(key, a);
        let m = self.params.bits;
        (0..u64::from(self.params.hashes)).map(move |i| a.wrapping_add(b.wrapping_mul(i)) % m)
    }

    /// True if `key` may have been added; false means it never was.
    pub fn check(&self, key: &[u8]) -> Result<bool> {
        let buf = self.buffer()?;
        Ok(self.indices(key).all(|x| buf.test(x)))
    }

    pub fn add(&self, key: &[u8]) -> Result<Added> {
        let buf = self.buffer()?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut hits = 0u8;
        for x in self.indices(key) {
            if buf.test_and_set(x) {
                hits += 1;
            }
        }
        Ok(if hits == self.params.hashes { Added::AlreadyPresent } else { Added::Inserted })
    }

    /// Adds every key, returning how many were new.
    pub fn add_many<I, K>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut inserted = 0;
        for k in keys {
            if self.add(k.as_ref())? == Added::Inserted {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Number of keys that may be present.
    pub fn check_many<I, K>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut hits = 0;
        for k in keys {
            if self.check(k.as_ref())? {
                hits += 1;
            }
        }
        Ok(hits)
    }

    /// Clears all bits in place.
    pub fn reset(&mut self) -> Result<()> {
        if self.bits.is_none() {
            return Err(self.not_ready());
        }
        if let Some(b) = self.bits.as_mut() {
            b.clear();
        }
        Ok(())
    }

    /// Drops the buffer and marks the filter unready. Idempotent.
    pub fn release(&mut self) {
        self.bits = None;
    }

    pub fn count_ones(&self) -> Result<u64> {
        Ok(self.buffer()?.count_ones())
    }

    /// Fraction of set bits, a rough measure of saturation.
    pub fn fill_ratio(&self) -> Result<f64> {
        Ok(self.count_ones()? as f64 / self.params.bits as f64)
    }

    pub fn info(&self) -> BloomInfo {
        BloomInfo::from_meta(&self.meta())
    }
}
