use tracing::{debug, warn};

use crate::{
    error::{RateLimitError, Result},
    utils::{checked_add, checked_mul, Amount},
};

/// Leaky-bucket limiter tracking a single outstanding-usage scalar.
///
/// Usage decays linearly at `refill_rate_per_sec` and is capped at
/// `capacity`: the continuous analogue of the windowed limiter, exact
/// rather than binned, at `O(1)` state. Decay is applied before the
/// admission check and sticks even when the requested amount is rejected,
/// so a failed consume still advances the bucket to the attempted
/// timestamp.
#[derive(Debug, Clone)]
pub struct TokenBucketRateLimiter {
    refill_rate_per_sec: Amount,
    capacity: Amount,
    used: Amount,
    last_update: u64,
}

impl TokenBucketRateLimiter {
    /// Create an empty bucket at time `now`. A zero refill rate is allowed
    /// and yields a bucket that never drains.
    pub fn new(refill_rate_per_sec: Amount, capacity: Amount, now: u64) -> Self {
        Self {
            refill_rate_per_sec,
            capacity,
            used: 0,
            last_update: now,
        }
    }

    /// Currently configured capacity.
    pub fn capacity(&self) -> Amount {
        self.capacity
    }

    /// Replace the capacity. Outstanding usage is not clamped; if it sits
    /// above the new capacity, consumption rejects until decay brings it
    /// back under.
    pub fn set_capacity(&mut self, new_capacity: Amount) {
        self.capacity = new_capacity;
    }

    /// Try to consume `amount` at time `now`, returning the new outstanding
    /// usage. Rejection still commits the decay due since `last_update` and
    /// advances the bucket to `now`; only the rejected amount itself is
    /// withheld.
    pub fn consume(&mut self, amount: Amount, now: u64) -> Result<Amount> {
        let decayed = self.project(now)?;
        self.used = decayed;
        self.last_update = now;

        let new_used = checked_add(decayed, amount, "bucket usage")?;
        if new_used > self.capacity {
            debug!(
                requested = %amount,
                outstanding = %decayed,
                capacity = %self.capacity,
                "bucket consume rejected"
            );
            return Err(RateLimitError::CapacityExceeded {
                requested: amount,
                available: self.capacity.saturating_sub(decayed),
            });
        }

        self.used = new_used;
        debug!(consumed = %amount, outstanding = %new_used, "bucket consume accepted");
        Ok(new_used)
    }

    /// Outstanding usage as of `now`. Pure projection; stored state is not
    /// advanced.
    pub fn rate(&self, now: u64) -> Result<Amount> {
        self.project(now)
    }

    /// Usage after applying the decay due between `last_update` and `now`.
    fn project(&self, now: u64) -> Result<Amount> {
        let Some(elapsed) = now.checked_sub(self.last_update) else {
            warn!(now, last = self.last_update, "clock moved backwards");
            return Err(RateLimitError::NonMonotonicClock {
                now,
                last: self.last_update,
            });
        };
        // A decay product too large for the type already exceeds any
        // representable usage, so saturate straight to empty; the
        // arithmetic stays exact either way.
        let decay = checked_mul(elapsed as Amount, self.refill_rate_per_sec, "bucket decay")
            .unwrap_or(Amount::MAX);
        Ok(self.used.saturating_sub(decay))
    }
}
