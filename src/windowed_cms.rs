//! A sliding time-window frequency view built from a ring of
//! [`CountMinSketch`] instances.
//!
//! Grounded in `examples/original_source/src/streaming/windowed_cms.go`: a
//! ring of `N = window / slice` plain sketches, one of which is always the
//! "head" receiving updates; once it has absorbed `slice` updates, the
//! oldest sketch in the ring is recycled to become the new head.

use std::collections::VecDeque;

use crate::cms::{CountMinSketch, UpdateRule};
use crate::error::SketchError;

/// Ring of same-shaped [`CountMinSketch`] sub-sketches giving an
/// approximate count over the most recent `window` updates.
#[derive(Debug)]
pub struct WindowedCms {
    sketches: VecDeque<CountMinSketch>,
    slice: u64,
    counter: u64,
}

impl WindowedCms {
    /// Build a windowed sketch targeting error bounds `(epsilon, delta)`,
    /// with `window / slice` sub-sketches, each covering `slice` updates.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::InvalidWindow`] if `slice <= 0`, `window <= 0`,
    /// or `window < slice`.
    pub fn new(epsilon: f64, delta: f64, window: f64, slice: f64) -> Result<Self, SketchError> {
        if slice <= 0.0 || window <= 0.0 || window < slice {
            return Err(SketchError::InvalidWindow { window, slice });
        }
        let num_sketches = ((window / slice) as u64).max(1);
        let sketches = (0..num_sketches)
            .map(|_| CountMinSketch::with_bounds(epsilon, delta, UpdateRule::Plain))
            .collect();
        Ok(WindowedCms {
            sketches,
            slice: slice as u64,
            counter: 0,
        })
    }

    /// Apply `weight` to `data` in the current slice, rotating the ring
    /// first if the current head has absorbed `slice` updates already.
    pub fn update(&mut self, data: &[u8], weight: f64) {
        if self.counter == self.slice {
            let mut front = self.sketches.pop_front().expect("ring is never empty");
            front.reset();
            self.sketches.push_back(front);
            self.counter = 0;
        }
        self.sketches
            .front_mut()
            .expect("ring is never empty")
            .update(data, weight, 0.0);
        self.counter += 1;
    }

    /// Sum of `data`'s estimated weight across every sub-sketch in the ring:
    /// the approximate total over the most recent `<= window` updates.
    pub fn count(&self, data: &[u8]) -> f64 {
        self.sketches
            .iter()
            .map(|s| s.count(data, 0.0).expect("ring sketches always have rows"))
            .sum()
    }

    /// Reset every sub-sketch and the update counter.
    pub fn reset(&mut self) {
        for sketch in &mut self.sketches {
            sketch.reset();
        }
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_window() {
        assert!(WindowedCms::new(0.01, 0.01, -1.0, 1.0).is_err());
        assert!(WindowedCms::new(0.01, 0.01, 1.0, -1.0).is_err());
        assert!(WindowedCms::new(0.01, 0.01, 1.0, 2.0).is_err());
    }

    #[test]
    fn counts_within_a_single_slice() {
        let mut w = WindowedCms::new(0.001, 0.0001, 1000.0, 5.0).unwrap();
        w.update(b"hello", 1.0);
        assert!((w.count(b"hello") - 1.0).abs() < 1e-4);
    }

    #[test]
    fn exact_count_after_exactly_slice_updates() {
        let mut w = WindowedCms::new(0.001, 0.0001, 10.0, 5.0).unwrap();
        for _ in 0..5 {
            w.update(b"k1", 1.0);
        }
        assert!((w.count(b"k1") - 5.0).abs() < 1e-4);
    }

    #[test]
    fn expired_slice_is_evicted() {
        // window=2, slice=1: two single-update slices in the ring.
        let mut w = WindowedCms::new(0.001, 0.0001, 2.0, 1.0).unwrap();
        w.update(b"hello", 1.0);
        w.update(b"hello2", 1.0);
        w.update(b"hello2", 1.0);
        assert!((w.count(b"hello") - 0.0).abs() < 1e-4);
    }

    #[test]
    fn reset_clears_all_sub_sketches() {
        let mut w = WindowedCms::new(0.01, 0.01, 5.0, 1.0).unwrap();
        w.update(b"k", 1.0);
        w.reset();
        assert!((w.count(b"k") - 0.0).abs() < 1e-9);
    }
}
