//! `dsrs` is a library of probabilistic streaming-analytics primitives for
//! unbounded data streams whose exact statistics cannot be maintained in
//! bounded memory:
//!
//! * [`Hll`] — a HyperLogLog cardinality sketch.
//! * [`CountMinSketch`] — a weighted frequency sketch (plain or
//!   exponentially time-decayed), composed by [`WindowedCms`] into a
//!   sliding-window frequency view.
//! * [`SpaceSaving`] — a bounded-memory top-k heavy-hitters tracker.
//! * [`RateEstimator`] — an exponentially-weighted mean rate over
//!   timestamped samples.
//! * [`TokenBucketHandle`] — a rate-limited admission arbiter.
//!
//! These five are independent: none depends on another at runtime. They
//! share only [`hash::fnv1a_64`] and the small numerical-utility surface in
//! [`util`].
//!
//! Every sketch and estimator other than the token bucket is a plain,
//! unsynchronized data structure — callers sharing one across threads must
//! provide their own mutual exclusion. The token bucket is the exception: it
//! owns its state behind a dedicated arbiter thread.

pub mod cms;
pub mod error;
pub mod hash;
pub mod hll;
pub mod rate;
pub mod space_saving;
pub mod token_bucket;
pub mod util;
pub mod windowed_cms;

pub use cms::{CountMinSketch, UpdateRule};
pub use error::SketchError;
pub use hll::Hll;
pub use rate::{Decay, RateEstimator};
pub use space_saving::{Counter, SpaceSaving};
pub use token_bucket::{RealTimeTicks, TickSource, TokenBucketHandle};
pub use windowed_cms::WindowedCms;
