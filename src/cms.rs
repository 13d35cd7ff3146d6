//! Count-Min Sketch: a weighted frequency sketch supporting a plain additive
//! update/read rule and an exponentially time-decayed one, selected at
//! construction via [`UpdateRule`].
//!
//! Grounded in the classical Cormode & Muthukrishnan sketch; the decayed
//! variant and its `(eps, delta)` sizing formula follow the original Go
//! source this crate's algorithms are distilled from.

use crate::error::SketchError;
use crate::hash::fnv1a_64;

/// Below this stored weight, exponential decay is skipped on update — avoids
/// needless `exp` calls multiplying an already-negligible weight further
/// toward zero.
const DECAY_EPSILON: f64 = 1e-8;

/// The update/read semantics a [`CountMinSketch`] uses, fixed at
/// construction. A tagged enum rather than stored closures or two unrelated
/// struct types: dispatch is a single match per update/read, and the plain
/// and decayed variants share one matrix layout and allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateRule {
    /// Additive update, direct weight read. `t` is accepted but ignored.
    Plain,
    /// Exponential time decay with rate constant `lambda`. For weight to
    /// decay toward zero as time passes, `lambda` must be negative — this
    /// sign convention is inherited unchanged from the original source.
    Decay { lambda: f64 },
}

#[derive(Debug, Clone, Copy, Default)]
struct Element {
    weight: f64,
    last_update: f64,
}

/// A Count-Min Sketch with `k` hash rows of `w` buckets each, pre-allocated
/// at construction and never resized.
#[derive(Debug, Clone)]
pub struct CountMinSketch {
    matrix: Vec<Element>,
    w: usize,
    k: usize,
    rule: UpdateRule,
}

impl CountMinSketch {
    /// Construct with explicit dimensions: `w` buckets per row, `k` rows.
    /// Both are clamped to a minimum of 1.
    pub fn with_dimensions(w: usize, k: usize, rule: UpdateRule) -> Self {
        let w = w.max(1);
        let k = k.max(1);
        CountMinSketch {
            matrix: vec![Element::default(); w * k],
            w,
            k,
            rule,
        }
    }

    /// Construct from error bounds: `w = ceil(2/epsilon)` buckets per row,
    /// `k = ceil(log2(1/delta))` rows. With probability at least `1 - delta`
    /// the sketch overestimates a key's true weight by at most
    /// `epsilon * total_weight`.
    pub fn with_bounds(epsilon: f64, delta: f64, rule: UpdateRule) -> Self {
        let w = (2.0 / epsilon).ceil().max(1.0) as usize;
        let k = (1.0 / delta).log2().ceil().max(1.0) as usize;
        Self::with_dimensions(w, k, rule)
    }

    /// Number of buckets per row.
    pub fn width(&self) -> usize {
        self.w
    }

    /// Number of hash rows.
    pub fn depth(&self) -> usize {
        self.k
    }

    fn buckets(&self, data: &[u8]) -> impl Iterator<Item = usize> + '_ {
        let h = fnv1a_64(data);
        let a = h & 0xFFFF_FFFF;
        let b = h >> 32;
        (0..self.k).map(move |i| ((a.wrapping_add(b.wrapping_mul(i as u64))) % self.w as u64) as usize)
    }

    /// Apply `delta_weight` to `data` at time `t`, returning the minimum
    /// post-update weight across all rows. `t` is ignored by the `Plain`
    /// rule.
    pub fn update(&mut self, data: &[u8], delta_weight: f64, t: f64) -> f64 {
        let mut min = f64::INFINITY;
        for (i, bucket) in self.buckets(data).enumerate() {
            let idx = i * self.w + bucket;
            let element = &mut self.matrix[idx];
            match self.rule {
                UpdateRule::Plain => {
                    element.weight += delta_weight;
                }
                UpdateRule::Decay { lambda } => {
                    if element.weight > DECAY_EPSILON {
                        element.weight *= (lambda * (t - element.last_update)).exp();
                    }
                    element.weight += delta_weight;
                    element.last_update = t;
                }
            }
            min = min.min(element.weight);
        }
        min
    }

    /// Estimated weight of `data` at time `t`, the minimum effective weight
    /// across all rows. `t` is ignored by the `Plain` rule.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::ElementNotFound`] if the sketch has zero rows,
    /// which cannot happen through the public constructors.
    pub fn count(&self, data: &[u8], t: f64) -> Result<f64, SketchError> {
        if self.k == 0 {
            return Err(SketchError::ElementNotFound);
        }
        let mut min = f64::INFINITY;
        for (i, bucket) in self.buckets(data).enumerate() {
            let idx = i * self.w + bucket;
            let element = &self.matrix[idx];
            let effective = match self.rule {
                UpdateRule::Plain => element.weight,
                UpdateRule::Decay { lambda } => {
                    (lambda * (t - element.last_update)).exp() * element.weight
                }
            };
            min = min.min(effective);
        }
        Ok(min)
    }

    /// Zero every element's weight and decay timestamp.
    pub fn reset(&mut self) {
        for element in &mut self.matrix {
            element.weight = 0.0;
            element.last_update = 0.0;
        }
    }
}
