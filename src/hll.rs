//! [HyperLogLog][wiki] (HLL) cardinality estimation.
//!
//! This is a from-scratch, single-precision (`HLL_4`-style dense-register)
//! implementation of the classical Flajolet et al. estimator, following the
//! formulas used by the original Go source this crate's algorithms are
//! distilled from, with one deliberate correction to the large-range
//! threshold (see [`Hll::estimate`]).
//!
//! [wiki]: https://en.wikipedia.org/wiki/HyperLogLog

use crate::error::SketchError;
use crate::hash::fnv1a_64;
use crate::util::shifted_leading_zeros64;

/// Canonical HyperLogLog large-range correction threshold, `2^32 / 30`.
///
/// The original Go source computed this as `1/30 * POW_2_64` using integer
/// division of the literal `1`, which evaluates to `0` and collapses the
/// comparison to `est > 0`, defeating the large-range branch almost
/// entirely. This implementation uses the threshold from Flajolet et al.'s
/// original HyperLogLog paper instead.
const LARGE_RANGE_THRESHOLD: f64 = (1u64 << 32) as f64 / 30.0;

const POW_2_64: f64 = 18_446_744_073_709_551_616.0;

/// A HyperLogLog distinct-value sketch.
///
/// Fixed-size array of `m = 2^p` registers, `4 <= p <= 64` (practically
/// `p <= 16`; larger precisions allocate correspondingly larger register
/// arrays for diminishing accuracy gains). Immutable after construction:
/// `p`, `m`, and the bias constant `alpha_m`. Memory is pre-allocated at
/// construction and never resized.
#[derive(Debug, Clone)]
pub struct Hll {
    registers: Vec<u8>,
    p: u32,
    m: u64,
    alpha_m: f64,
}

impl Hll {
    /// Create an empty sketch with precision `p`.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::InvalidPrecision`] if `p < 4` or `p > 64`.
    pub fn new(p: u32) -> Result<Self, SketchError> {
        if !(4..=64).contains(&p) {
            return Err(SketchError::InvalidPrecision { p });
        }
        let m = 1u64 << p;
        let f_m = m as f64;
        let alpha_m = match p {
            4 => 0.673 * f_m * f_m,
            5 => 0.697 * f_m * f_m,
            6 => 0.709 * f_m * f_m,
            _ => (0.7213 / (1.0 + 1.079 / f_m)) * f_m * f_m,
        };
        Ok(Hll {
            registers: vec![0u8; m as usize],
            p,
            m,
            alpha_m,
        })
    }

    /// Precision this sketch was constructed with.
    pub fn p(&self) -> u32 {
        self.p
    }

    /// Number of registers, `2^p`.
    pub fn m(&self) -> u64 {
        self.m
    }

    /// Observe a byte sequence, routing it to one register and possibly
    /// raising that register's maximum run of leading zeros.
    pub fn observe(&mut self, data: &[u8]) {
        let hash = fnv1a_64(data);
        let r = (hash >> (64 - self.p)) as usize;
        let v = (1 + shifted_leading_zeros64(hash, self.p)) as u8;
        if self.registers[r] < v {
            self.registers[r] = v;
        }
    }

    /// Current distinct-count estimate, rounded up to the nearest integer.
    ///
    /// Returns 0 for an empty sketch (all registers still at 0, so the
    /// linear-counting branch below reduces to `m * ln(m/m) = 0`).
    pub fn estimate(&self) -> i64 {
        let mut harmonic_sum = 0.0f64;
        let mut num_zero = 0u64;
        for &r in &self.registers {
            harmonic_sum += 2f64.powi(-(r as i32));
            if r == 0 {
                num_zero += 1;
            }
        }

        let mut est = self.alpha_m / harmonic_sum;
        let m_f = self.m as f64;

        if est <= 2.5 * m_f {
            if num_zero != 0 {
                est = (m_f * (m_f / num_zero as f64).ln()).ceil();
            }
        } else if est > LARGE_RANGE_THRESHOLD {
            est = -POW_2_64 * (1.0 - est / POW_2_64).ln();
        }

        est.ceil() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_precision_rejected() {
        assert_eq!(Hll::new(3), Err(SketchError::InvalidPrecision { p: 3 }));
        assert_eq!(Hll::new(65), Err(SketchError::InvalidPrecision { p: 65 }));
    }

    #[test]
    fn empty_sketch_estimates_zero() {
        let hll = Hll::new(10).unwrap();
        assert_eq!(hll.estimate(), 0);
    }

    #[test]
    fn small_count_is_close() {
        let mut hll = Hll::new(12).unwrap();
        for i in 0..5u64 {
            hll.observe(&i.to_le_bytes());
        }
        let est = hll.estimate();
        assert!((1..=10).contains(&est), "estimate was {}", est);
    }

    #[test]
    fn distinct_count_within_error_bound() {
        let mut hll = Hll::new(14).unwrap();
        let n = 100_000u64;
        for _ in 0..3 {
            for key in 0..n {
                hll.observe(&key.to_le_bytes());
            }
        }
        let est = hll.estimate() as f64;
        let lb = n as f64 * 0.95;
        let ub = n as f64 * 1.05;
        assert!((lb..ub).contains(&est), "estimate {} out of bounds", est);
    }

    #[test]
    fn repeated_observations_do_not_inflate_estimate() {
        let mut hll = Hll::new(12).unwrap();
        for _ in 0..10 {
            hll.observe(b"same-key");
        }
        let est = hll.estimate();
        assert!((1..=2).contains(&est), "estimate was {}", est);
    }
}
