//! Fixed-size bit buffer shared between threads.
//!
//! Bit `x` lives in byte `x >> 3` at position `x & 7` (LSB first); the same
//! bytes are what gets written to disk. Sets use `fetch_or(Release)` and
//! reads use `Acquire`, so a reader that observes a bit also observes every
//! write the setter made before it.

use crate::errors::{BloomError, Result};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU8, Ordering};

const CHUNK: usize = 8192;

pub struct BitBuf {
    bytes: Box<[AtomicU8]>,
}

impl BitBuf {
    /// Zeroed buffer; allocation failure is reported, not aborted on.
    pub fn zeroed(len: u64) -> Result<Self> {
        let n = usize::try_from(len).map_err(|_| BloomError::Alloc { bytes: len })?;
        let mut v: Vec<AtomicU8> = Vec::new();
        v.try_reserve_exact(n).map_err(|_| BloomError::Alloc { bytes: len })?;
        v.resize_with(n, || AtomicU8::new(0));
        Ok(Self { bytes: v.into_boxed_slice() })
    }

    #[inline]
    pub fn len(&self) -> usize { self.bytes.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    #[inline]
    pub fn test(&self, bit: u64) -> bool {
        let (idx, mask) = locate(bit);
        self.bytes[idx].load(Ordering::Acquire) & mask != 0
    }

    /// Sets the bit, returning whether it was already set.
    #[inline]
    pub fn test_and_set(&self, bit: u64) -> bool {
        let (idx, mask) = locate(bit);
        if self.bytes[idx].load(Ordering::Acquire) & mask != 0 {
            return true;
        }
        self.bytes[idx].fetch_or(mask, Ordering::Release) & mask != 0
    }

    pub fn clear(&mut self) {
        for b in self.bytes.iter_mut() { *b.get_mut() = 0; }
    }

    pub fn count_ones(&self) -> u64 {
        self.bytes.iter().map(|b| u64::from(b.load(Ordering::Relaxed).count_ones())).sum()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.iter().map(|b| b.load(Ordering::Acquire)).collect()
    }

    /// Fills the whole buffer from `r`; a short source yields `UnexpectedEof`.
    pub fn fill_from<R: Read>(&mut self, r: &mut R) -> io::Result<()> {
        let mut chunk = [0u8; CHUNK];
        for part in self.bytes.chunks_mut(CHUNK) {
            let buf = &mut chunk[..part.len()];
            r.read_exact(buf)?;
            for (dst, src) in part.iter_mut().zip(buf.iter()) {
                *dst.get_mut() = *src;
            }
        }
        Ok(())
    }

    /// Streams the buffer in fixed chunks instead of cloning it whole.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut chunk = [0u8; CHUNK];
        for part in self.bytes.chunks(CHUNK) {
            for (dst, src) in chunk.iter_mut().zip(part) {
                *dst = src.load(Ordering::Acquire);
            }
            w.write_all(&chunk[..part.len()])?;
        }
        Ok(())
    }
}

#[inline]
fn locate(bit: u64) -> (usize, u8) {
    ((bit >> 3) as usize, 1u8 << (bit & 7))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsb_first_layout() {
        let b = BitBuf::zeroed(2).unwrap();
        assert!(!b.test_and_set(0));
        assert!(!b.test_and_set(9));
        assert!(b.test_and_set(9));
        assert_eq!(b.to_vec(), vec![0b0000_0001, 0b0000_0010]);
        assert!(b.test(0) && b.test(9) && !b.test(8));
        assert_eq!(b.count_ones(), 2);
    }

    #[test]
    fn clear_zeroes_everything() {
        let mut b = BitBuf::zeroed(3).unwrap();
        b.fill_from(&mut &[0xffu8; 3][..]).unwrap();
        assert_eq!(b.count_ones(), 24);
        b.clear();
        assert_eq!(b.to_vec(), vec![0; 3]);
    }

    #[test]
    fn fill_and_write_span_chunks() {
        let src: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let mut b = BitBuf::zeroed(src.len() as u64).unwrap();
        b.fill_from(&mut src.as_slice()).unwrap();
        let mut out = Vec::new();
        b.write_to(&mut out).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn short_source_is_eof() {
        let mut b = BitBuf::zeroed(16).unwrap();
        let err = b.fill_from(&mut &[1u8; 10][..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn huge_allocation_fails_cleanly() {
        assert!(matches!(BitBuf::zeroed(u64::MAX), Err(BloomError::Alloc { .. })));
    }
}
