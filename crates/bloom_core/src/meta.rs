//! Metadata record shared by both file forms (LE, 44 bytes):
//!
//!   entries[8] u64
//!   error[8]   f64
//!   bpe[8]     f64
//!   bits[8]    u64
//!   bytes[8]   u64
//!   hashes[1]  u8
//!   ready[1]   u8
//!   major[1]   u8
//!   minor[1]   u8

use crate::consts::{META_SIZE, VERSION_MAJOR};
use crate::errors::{BloomError, Result};
use crate::params::BloomParams;
use crate::utils::{write_f64, write_u64};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Meta {
    pub params: BloomParams,
    pub ready: bool,
    pub major: u8,
    pub minor: u8,
}

impl Meta {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let p = &self.params;
        write_u64(w, p.entries)?;
        write_f64(w, p.error)?;
        write_f64(w, p.bpe)?;
        write_u64(w, p.bits)?;
        write_u64(w, p.bytes)?;
        w.write_all(&[p.hashes, self.ready as u8, self.major, self.minor])
    }

    /// Decodes the raw record without judging it.
    pub fn decode(raw: &[u8; META_SIZE]) -> Self {
        let u64_at = |at: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&raw[at..at + 8]);
            u64::from_le_bytes(b)
        };
        Self {
            params: BloomParams {
                entries: u64_at(0),
                error: f64::from_bits(u64_at(8)),
                bpe: f64::from_bits(u64_at(16)),
                bits: u64_at(24),
                bytes: u64_at(32),
                hashes: raw[40],
            },
            ready: raw[41] != 0,
            major: raw[42],
            minor: raw[43],
        }
    }

    /// Major version must match; minor differences are accepted.
    pub fn check_version(&self) -> Result<()> {
        if self.major != VERSION_MAJOR {
            return Err(BloomError::MajorVersion { found: self.major, expected: VERSION_MAJOR });
        }
        Ok(())
    }

    /// Rejects geometry that would index outside the buffer.
    pub fn check_geometry(&self) -> Result<()> {
        let p = &self.params;
        if p.bits == 0 {
            return Err(BloomError::Corrupt("zero bit count".into()));
        }
        if p.bytes != p.bits / 8 + u64::from(p.bits % 8 != 0) {
            return Err(BloomError::Corrupt(format!("{} bytes cannot hold {} bits", p.bytes, p.bits)));
        }
        if p.hashes == 0 {
            return Err(BloomError::Corrupt("zero hash rounds".into()));
        }
        Ok(())
    }
}
