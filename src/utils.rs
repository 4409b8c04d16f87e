use crate::error::{RateLimitError, Result};

/// Value amount at the implied fixed-point scale of the limited asset.
///
/// The limiter treats amounts as opaque unsigned magnitudes; `u128` leaves
/// headroom for 18-decimal token quantities without ever touching floats.
pub type Amount = u128;

/// Implied fixed-point scale of one whole token (18 decimals).
pub const TOKEN_SCALE: Amount = 1_000_000_000_000_000_000;

/// Express a whole-token quantity at the fixed-point scale.
pub fn tokens(whole: u64) -> Amount {
    whole as Amount * TOKEN_SCALE
}

/// Checked addition for the accounting path; never wraps.
pub fn checked_add(a: Amount, b: Amount, context: &'static str) -> Result<Amount> {
    a.checked_add(b).ok_or(RateLimitError::Overflow(context))
}

/// Checked multiplication for the accounting path; never wraps.
pub fn checked_mul(a: Amount, b: Amount, context: &'static str) -> Result<Amount> {
    a.checked_mul(b).ok_or(RateLimitError::Overflow(context))
}

/// Index of the time bucket covering `now` for the given bin span.
pub fn period_index(now: u64, bin_span_secs: u64) -> u64 {
    now / bin_span_secs
}
