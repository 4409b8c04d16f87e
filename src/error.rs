use thiserror::Error;

use crate::utils::Amount;

/// Result type for rate limit operations
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Errors that can occur in the rate limiting engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// The requested amount would push outstanding usage above the limit.
    /// Routine outcome; state is unchanged apart from any decay already due
    /// at the attempted timestamp.
    #[error("capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded { requested: Amount, available: Amount },

    /// The supplied timestamp is earlier than the last one observed by this
    /// limiter. The clock must be non-decreasing per key.
    #[error("non-monotonic clock: now {now} is earlier than last seen {last}")]
    NonMonotonicClock { now: u64, last: u64 },

    /// Checked arithmetic in the accounting path would wrap.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("configuration error: {0}")]
    Config(String),
}
