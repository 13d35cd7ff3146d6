//! Error type shared by the handful of fallible constructors in this crate.

use std::fmt::{Display, Formatter};

/// Errors raised by the sketch and estimator constructors.
///
/// Most operations in this crate cannot fail: sketches are pre-allocated at
/// construction and every subsequent `observe`/`update`/`count` call is
/// infallible. Only the constructors and accessors documented per-variant
/// below can return one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchError {
    /// Raised by [`crate::hll::Hll::new`] when `p` is outside `4..=64`.
    InvalidPrecision { p: u32 },
    /// Raised by [`crate::windowed_cms::WindowedCms::new`] when `slice <= 0`,
    /// `window <= 0`, or `window < slice`.
    InvalidWindow { window: f64, slice: f64 },
    /// Raised by [`crate::cms::CountMinSketch::count`] for a degenerate
    /// sketch with zero hash rows. Unreachable through the public
    /// constructors, which always allocate at least one row.
    ElementNotFound,
}

impl Display for SketchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SketchError::InvalidPrecision { p } => {
                write!(f, "invalid HLL precision {}: must satisfy 4 <= p <= 64", p)
            }
            SketchError::InvalidWindow { window, slice } => write!(
                f,
                "invalid window/slice ({}, {}): require slice > 0, window > 0, window >= slice",
                window, slice
            ),
            SketchError::ElementNotFound => {
                write!(f, "count-min sketch has no hash rows to query")
            }
        }
    }
}

impl std::error::Error for SketchError {}
