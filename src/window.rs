use tracing::{debug, warn};

use crate::{
    error::{RateLimitError, Result},
    utils::{checked_add, period_index, Amount},
};

/// One time bucket of the ring: the last period written and the amount
/// accumulated during it.
#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    period: u64,
    amount: Amount,
}

/// Sliding-window limiter over a fixed ring of time-bucketed partial sums.
///
/// The trailing window of `bin_count * bin_span_secs` seconds is approximated
/// by `bin_count` discrete buckets, bounding storage and lookup to
/// `O(bin_count)` at a granularity of one bin span. A bin is live while its
/// period falls inside the trailing window; stale bins are excluded from
/// every total and their slot is re-zeroed when the ring index is next
/// written, so no background sweep is needed.
#[derive(Debug, Clone)]
pub struct WindowedRateLimiter {
    bin_span_secs: u64,
    bins: Vec<Bin>,
    limit: Amount,
    last_now: u64,
}

impl WindowedRateLimiter {
    /// Create a limiter covering `bin_count * bin_span_secs` seconds with the
    /// given total limit. Zero bin count or span is a configuration error.
    pub fn new(bin_count: usize, bin_span_secs: u64, limit: Amount) -> Result<Self> {
        if bin_count == 0 {
            return Err(RateLimitError::Config("bin count must be non-zero".into()));
        }
        if bin_span_secs == 0 {
            return Err(RateLimitError::Config("bin span must be non-zero".into()));
        }
        Ok(Self {
            bin_span_secs,
            bins: vec![Bin::default(); bin_count],
            limit,
            last_now: 0,
        })
    }

    /// Total trailing window covered, in seconds.
    pub fn window_secs(&self) -> u64 {
        self.bins.len() as u64 * self.bin_span_secs
    }

    /// Currently configured window limit.
    pub fn limit(&self) -> Amount {
        self.limit
    }

    /// Replace the window limit. Already accumulated usage is untouched; if
    /// the new limit is below it, consumption rejects until bins expire.
    pub fn set_limit(&mut self, new_limit: Amount) {
        self.limit = new_limit;
    }

    /// Try to consume `amount` at time `now`. All-or-nothing: on success the
    /// new outstanding window total is returned, on rejection no state
    /// changes at all.
    pub fn consume(&mut self, amount: Amount, now: u64) -> Result<Amount> {
        self.check_monotonic(now)?;
        let current_period = period_index(now, self.bin_span_secs);

        let total = self.live_total(current_period)?;
        let new_total = checked_add(total, amount, "window total")?;
        if new_total > self.limit {
            debug!(
                requested = %amount,
                outstanding = %total,
                limit = %self.limit,
                "windowed consume rejected"
            );
            return Err(RateLimitError::CapacityExceeded {
                requested: amount,
                // Outstanding usage can sit above a freshly lowered limit.
                available: self.limit.saturating_sub(total),
            });
        }

        let idx = (current_period % self.bins.len() as u64) as usize;
        if self.bins[idx].period != current_period {
            // Slot last held an expired period; reclaim it for the current one.
            self.bins[idx] = Bin {
                period: current_period,
                amount: 0,
            };
        }
        self.bins[idx].amount += amount;
        self.last_now = now;
        debug!(consumed = %amount, outstanding = %new_total, "windowed consume accepted");
        Ok(new_total)
    }

    /// Outstanding total over the trailing window as of `now`. Pure
    /// projection: expiry is reflected without persisting anything.
    pub fn rate(&self, now: u64) -> Result<Amount> {
        self.check_monotonic(now)?;
        self.live_total(period_index(now, self.bin_span_secs))
    }

    fn check_monotonic(&self, now: u64) -> Result<()> {
        if now < self.last_now {
            warn!(now, last = self.last_now, "clock moved backwards");
            return Err(RateLimitError::NonMonotonicClock {
                now,
                last: self.last_now,
            });
        }
        Ok(())
    }

    /// Sum of all bins whose period still falls inside the trailing window
    /// ending at `current_period`.
    fn live_total(&self, current_period: u64) -> Result<Amount> {
        let bin_count = self.bins.len() as u64;
        let mut total: Amount = 0;
        for bin in &self.bins {
            if current_period - bin.period < bin_count {
                total = checked_add(total, bin.amount, "window total")?;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tokens;

    fn limiter() -> WindowedRateLimiter {
        // 4 bins of one hour each, 100 tokens over the window.
        WindowedRateLimiter::new(4, 3600, tokens(100)).unwrap()
    }

    #[test]
    fn test_rejects_zero_geometry() {
        assert!(matches!(
            WindowedRateLimiter::new(0, 3600, tokens(1)),
            Err(RateLimitError::Config(_))
        ));
        assert!(matches!(
            WindowedRateLimiter::new(4, 0, tokens(1)),
            Err(RateLimitError::Config(_))
        ));
    }

    #[test]
    fn test_simple_consume() {
        let mut rl = limiter();
        assert_eq!(rl.consume(tokens(10), 0).unwrap(), tokens(10));
        assert_eq!(rl.consume(tokens(10), 0).unwrap(), tokens(20));
        assert_eq!(rl.rate(0).unwrap(), tokens(20));
    }

    #[test]
    fn test_rejection_leaves_state_untouched() {
        let mut rl = limiter();
        rl.consume(tokens(20), 0).unwrap();
        let err = rl.consume(tokens(90), 0).unwrap_err();
        assert_eq!(
            err,
            RateLimitError::CapacityExceeded {
                requested: tokens(90),
                available: tokens(80),
            }
        );
        assert_eq!(rl.rate(0).unwrap(), tokens(20));
        // Later bins untouched too: the next hour still admits normally.
        assert_eq!(rl.consume(tokens(10), 3600).unwrap(), tokens(30));
    }

    #[test]
    fn test_oversized_request_always_rejects() {
        let mut rl = limiter();
        assert!(rl.consume(tokens(101), 0).is_err());
        assert_eq!(rl.rate(0).unwrap(), 0);
    }

    #[test]
    fn test_accumulates_within_one_bin() {
        let mut rl = limiter();
        rl.consume(tokens(10), 100).unwrap();
        rl.consume(tokens(10), 3599).unwrap();
        // Same period, one bin holds 20.
        assert_eq!(rl.rate(3599).unwrap(), tokens(20));
    }

    #[test]
    fn test_expiry_after_whole_window() {
        let mut rl = limiter();
        rl.consume(tokens(60), 0).unwrap();
        // Window is 4 hours; at t=4h the t=0 bin has fallen out.
        assert_eq!(rl.rate(4 * 3600).unwrap(), 0);
        assert_eq!(rl.consume(tokens(70), 4 * 3600).unwrap(), tokens(70));
    }

    #[test]
    fn test_stale_ring_slot_is_reclaimed() {
        let mut rl = limiter();
        rl.consume(tokens(10), 0).unwrap();
        // Period 8 maps onto the same ring slot as period 0.
        assert_eq!(rl.consume(tokens(20), 8 * 3600).unwrap(), tokens(20));
        assert_eq!(rl.rate(8 * 3600).unwrap(), tokens(20));
    }

    #[test]
    fn test_rate_is_pure_projection() {
        let mut rl = limiter();
        rl.consume(tokens(60), 0).unwrap();
        assert_eq!(rl.rate(4 * 3600).unwrap(), 0);
        // The projection must not have persisted the expiry against old reads.
        assert_eq!(rl.rate(3600).unwrap(), tokens(60));
    }

    #[test]
    fn test_non_monotonic_clock_fails_loudly() {
        let mut rl = limiter();
        rl.consume(tokens(10), 3600).unwrap();
        assert_eq!(
            rl.consume(tokens(10), 3599).unwrap_err(),
            RateLimitError::NonMonotonicClock {
                now: 3599,
                last: 3600
            }
        );
        assert!(rl.rate(100).is_err());
    }

    #[test]
    fn test_set_limit_does_not_clamp() {
        let mut rl = limiter();
        rl.consume(tokens(80), 0).unwrap();
        rl.set_limit(tokens(50));
        assert_eq!(rl.limit(), tokens(50));
        // Outstanding 80 stays; new consumption rejects until expiry.
        assert_eq!(rl.rate(0).unwrap(), tokens(80));
        assert!(rl.consume(1, 0).is_err());
        assert_eq!(rl.consume(tokens(50), 4 * 3600).unwrap(), tokens(50));
    }

    #[test]
    fn test_overflow_rejected() {
        let mut rl = WindowedRateLimiter::new(4, 3600, Amount::MAX).unwrap();
        rl.consume(Amount::MAX - 1, 0).unwrap();
        assert_eq!(
            rl.consume(2, 0).unwrap_err(),
            RateLimitError::Overflow("window total")
        );
    }
}
