//! Exponentially-weighted rate estimator.
//!
//! Maintains a decayed sum of event values `s` and a decayed event count
//! `w`; the current rate is `s / w`. Two decay forms share the same state
//! and update/read logic, differing only in how the per-step decay
//! multiplier `pi` is computed, dispatched via [`Decay`] — mirroring the
//! [`crate::cms::UpdateRule`] tagged-enum pattern rather than two unrelated
//! struct types, so both forms share one state layout and update/read path.
//!
//! Grounded verbatim in
//! `examples/original_source/src/rate_estimation/rate_estimator.go`'s
//! `ExponentialRateEstimator` and `HfExponentialRateEstimator`.

/// Decay form for a [`RateEstimator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decay {
    /// `alpha` is the time constant at which an older sample decays to
    /// `1/e` of its original weight: `pi = exp(-(t - last) / alpha)`.
    OneOverE { alpha: f64 },
    /// `halflife` is the time at which an older sample decays to half its
    /// original weight. Internally precomputed as
    /// `p = 2^(-1/halflife)`, so that `pi = p^(t - last)`.
    HalfLife { halflife: f64 },
}

impl Decay {
    fn multiplier(self, elapsed: f64) -> f64 {
        match self {
            Decay::OneOverE { alpha } => (-elapsed / alpha).exp(),
            Decay::HalfLife { halflife } => {
                let p = 2f64.powf(-1.0 / halflife);
                p.powf(elapsed)
            }
        }
    }
}

/// An exponentially-weighted mean-rate estimator over timestamped samples.
///
/// `s = w = 0` at construction. Callers are expected to call
/// [`RateEstimator::log_event`] with non-decreasing timestamps; the
/// implementation does not enforce this, and a timestamp earlier than the
/// last one seen produces a decay multiplier greater than 1 (multiplicative
/// growth rather than decay) — an accepted consequence of the original
/// source's design, not a bug this crate fixes.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    decay: Decay,
    last: f64,
    s: f64,
    w: f64,
}

impl RateEstimator {
    /// Create an estimator starting at time `t0` with the given decay form.
    pub fn new(decay: Decay, t0: f64) -> Self {
        RateEstimator {
            decay,
            last: t0,
            s: 0.0,
            w: 0.0,
        }
    }

    /// Record an event of value `val` at time `t`: decay existing state to
    /// `t`, then fold in the new sample.
    pub fn log_event(&mut self, t: f64, val: f64) {
        let pi = self.decay.multiplier(t - self.last);
        self.s *= pi;
        self.w *= pi;
        self.last = t;
        self.s += val;
        self.w += 1.0;
    }

    /// The current rate, `s / w`, as of the last [`RateEstimator::log_event`]
    /// call — decay is *not* advanced to `t`, so the `t` parameter is
    /// accepted but unused. This asymmetry is intentional: it keeps a read
    /// side effect-free, so repeated reads at different times return the
    /// same value until the next event is logged.
    ///
    /// Returns `NaN` if no event has been logged yet (`w == 0`); callers
    /// must not call this before the first `log_event`.
    pub fn rate(&self, _t: f64) -> f64 {
        self.s / self.w
    }
}
