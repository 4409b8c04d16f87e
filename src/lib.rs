//! Bridge value rate limiting engine
//!
//! An admission-control primitive that caps how much value may be consumed
//! within a bounded trailing time window, bounding economic exposure for
//! bridge-style transfer or withdrawal gates. Two interchangeable
//! accounting algorithms (a binned sliding window and a leaky token bucket)
//! sit behind a registry keyed by `(chain id, asset)`, each key owning
//! fully independent state. Every decision is all-or-nothing: a request is
//! either admitted in full or rejected with state left untouched.

pub mod bucket;
pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod metrics;
pub mod set;
pub mod utils;
pub mod window;

// Re-export main types
pub use bucket::TokenBucketRateLimiter;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_config_from_file, load_config_from_yaml, LimiterSetConfig};
pub use error::{RateLimitError, Result};
pub use limiter::{Limiter, LimiterKind};
pub use set::{LimiterKey, LimiterSet};
pub use utils::{Amount, TOKEN_SCALE};
pub use window::WindowedRateLimiter;
