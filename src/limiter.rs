use crate::{
    bucket::TokenBucketRateLimiter,
    error::Result,
    utils::Amount,
    window::WindowedRateLimiter,
};

/// Which accounting algorithm a registry uses, chosen once at registry
/// construction and applied to every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterKind {
    /// Binned sliding window: true windowed history at one-bin granularity.
    Windowed { bin_count: usize, bin_span_secs: u64 },
    /// Leaky bucket: exact continuous decay with a single usage scalar.
    TokenBucket { refill_rate_per_sec: Amount },
}

/// A limiter instance of either kind.
#[derive(Debug, Clone)]
pub enum Limiter {
    Windowed(WindowedRateLimiter),
    Bucket(TokenBucketRateLimiter),
}

impl Limiter {
    /// Create a zero-limit instance of the given kind at time `now`.
    pub fn new(kind: LimiterKind, now: u64) -> Result<Self> {
        match kind {
            LimiterKind::Windowed {
                bin_count,
                bin_span_secs,
            } => Ok(Self::Windowed(WindowedRateLimiter::new(
                bin_count,
                bin_span_secs,
                0,
            )?)),
            LimiterKind::TokenBucket { refill_rate_per_sec } => Ok(Self::Bucket(
                TokenBucketRateLimiter::new(refill_rate_per_sec, 0, now),
            )),
        }
    }

    pub fn consume(&mut self, amount: Amount, now: u64) -> Result<Amount> {
        match self {
            Self::Windowed(rl) => rl.consume(amount, now),
            Self::Bucket(rl) => rl.consume(amount, now),
        }
    }

    pub fn rate(&self, now: u64) -> Result<Amount> {
        match self {
            Self::Windowed(rl) => rl.rate(now),
            Self::Bucket(rl) => rl.rate(now),
        }
    }

    /// Window limit or bucket capacity, depending on the kind.
    pub fn limit(&self) -> Amount {
        match self {
            Self::Windowed(rl) => rl.limit(),
            Self::Bucket(rl) => rl.capacity(),
        }
    }

    pub fn set_limit(&mut self, new_limit: Amount) {
        match self {
            Self::Windowed(rl) => rl.set_limit(new_limit),
            Self::Bucket(rl) => rl.set_capacity(new_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tokens;

    #[test]
    fn test_zero_limit_until_configured() {
        let mut rl = Limiter::new(
            LimiterKind::Windowed {
                bin_count: 4,
                bin_span_secs: 3600,
            },
            0,
        )
        .unwrap();
        assert_eq!(rl.limit(), 0);
        assert!(rl.consume(1, 0).is_err());
        rl.set_limit(tokens(100));
        assert_eq!(rl.consume(tokens(10), 0).unwrap(), tokens(10));
    }

    #[test]
    fn test_delegates_to_bucket() {
        let mut rl = Limiter::new(
            LimiterKind::TokenBucket {
                refill_rate_per_sec: tokens(1),
            },
            0,
        )
        .unwrap();
        rl.set_limit(tokens(100));
        assert_eq!(rl.consume(tokens(100), 0).unwrap(), tokens(100));
        assert_eq!(rl.rate(20).unwrap(), tokens(80));
    }

    #[test]
    fn test_invalid_kind_geometry() {
        assert!(Limiter::new(
            LimiterKind::Windowed {
                bin_count: 0,
                bin_span_secs: 3600,
            },
            0,
        )
        .is_err());
    }
}
