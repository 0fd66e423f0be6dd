//! Optimal sizing of a Bloom filter from capacity and target error.
//!
//! - bpe    = -ln(error) / ln(2)^2
//! - bits   = floor(entries * bpe)
//! - bytes  = ceil(bits / 8)
//! - hashes = ceil(ln(2) * bpe)
//!
//! The constants are fixed so that filters persisted with the same inputs
//! stay byte-compatible.

use crate::consts::{LN_2, LN_2_SQUARED, MIN_ENTRIES};
use crate::errors::{BloomError, Result};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BloomParams {
    pub entries: u64,
    pub error: f64,
    pub bpe: f64,
    pub bits: u64,
    pub bytes: u64,
    pub hashes: u8,
}

impl BloomParams {
    pub fn derive(entries: u64, error: f64) -> Result<Self> {
        if entries < MIN_ENTRIES || !(error > 0.0 && error < 1.0) {
            return Err(BloomError::InvalidParameters { entries, error });
        }
        let bpe = -error.ln() / LN_2_SQUARED;
        let bits = (entries as f64 * bpe) as u64;
        let bytes = bits / 8 + u64::from(bits % 8 != 0);
        let rounds = (LN_2 * bpe).ceil();
        if bits == 0 || rounds > f64::from(u8::MAX) {
            return Err(BloomError::InvalidParameters { entries, error });
        }
        Ok(Self { entries, error, bpe, bits, bytes, hashes: rounds as u8 })
    }

    /// Theoretical false-positive rate after `n` insertions: (1 - e^(-kn/m))^k.
    pub fn estimated_fpr(&self, n: u64) -> f64 {
        let k = f64::from(self.hashes);
        (1.0 - (-k * n as f64 / self.bits as f64).exp()).powf(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn million_at_one_in_a_thousand() {
        let p = BloomParams::derive(1_000_000, 0.001).unwrap();
        assert!((p.bpe - 14.3776).abs() < 1e-3, "bpe={}", p.bpe);
        assert_eq!(p.bits, 14_377_587);
        assert_eq!(p.bytes, 1_797_199);
        assert_eq!(p.hashes, 10);
    }

    #[test]
    fn smallest_filter() {
        let p = BloomParams::derive(1000, 0.01).unwrap();
        assert_eq!(p.bits, 9585);
        assert_eq!(p.bytes, 1199);
        assert_eq!(p.hashes, 7);
    }

    #[test]
    fn rejects_bad_inputs() {
        for (n, e) in [(999, 0.01), (0, 0.01), (1000, 0.0), (1000, 1.0), (1000, -0.5), (1000, f64::NAN)] {
            assert!(matches!(
                BloomParams::derive(n, e),
                Err(BloomError::InvalidParameters { .. })
            ), "accepted entries={n} error={e}");
        }
    }

    #[test]
    fn rejects_more_than_255_rounds() {
        // ln(2)*bpe > 255 needs error below e^-176.
        assert!(BloomParams::derive(1000, 1e-200).is_err());
    }

    #[test]
    fn estimated_fpr_near_target_at_capacity() {
        let p = BloomParams::derive(100_000, 0.01).unwrap();
        let fpr = p.estimated_fpr(p.entries);
        assert!(fpr > 0.005 && fpr < 0.015, "fpr={fpr}");
        assert_eq!(p.estimated_fpr(0), 0.0);
    }

    proptest! {
        #[test]
        fn derived_geometry_is_consistent(entries in 1000u64..10_000_000, error in 1e-9f64..0.999) {
            let p = BloomParams::derive(entries, error).unwrap();
            prop_assert!(p.bytes * 8 >= p.bits);
            prop_assert!(p.bytes * 8 < p.bits + 8);
            prop_assert!(p.hashes >= 1);
        }

        #[test]
        fn below_minimum_is_rejected(entries in 0u64..1000, error in 1e-9f64..0.999) {
            prop_assert!(BloomParams::derive(entries, error).is_err());
        }
    }
}
