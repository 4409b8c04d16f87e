use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::{
    clock::{Clock, SystemClock},
    error::{RateLimitError, Result},
    limiter::{Limiter, LimiterKind},
    metrics::Metrics,
    utils::Amount,
};

/// Composite key addressing one limiter instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LimiterKey {
    pub chain_id: u64,
    pub asset: String,
}

impl LimiterKey {
    pub fn new(chain_id: u64, asset: impl Into<String>) -> Self {
        Self {
            chain_id,
            asset: asset.into(),
        }
    }
}

/// Registry of independent limiters, one per `(chain id, asset)` key.
///
/// All keys share the algorithm kind chosen at construction; each key owns
/// its own accounting state and limit. An entry is created zero-limited the
/// first time its key is configured or consumed and is never deleted, only
/// reconfigured. Keys never interact: consumption or reconfiguration under
/// one key leaves every other key untouched.
pub struct LimiterSet<C: Clock = SystemClock> {
    kind: LimiterKind,
    entries: HashMap<LimiterKey, Limiter>,
    clock: C,
    metrics: Option<Arc<Metrics>>,
}

impl LimiterSet<SystemClock> {
    /// Create a registry on the wall clock.
    pub fn new(kind: LimiterKind) -> Result<Self> {
        Self::with_clock(kind, SystemClock::new())
    }
}

impl<C: Clock> LimiterSet<C> {
    /// Create a registry reading time from the given clock.
    pub fn with_clock(kind: LimiterKind, clock: C) -> Result<Self> {
        // Fail on bad geometry up front rather than at first touch of a key.
        Limiter::new(kind, clock.now_secs())?;
        Ok(Self {
            kind,
            entries: HashMap::new(),
            clock,
            metrics: None,
        })
    }

    /// Attach a metrics collector recording admission outcomes.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the limit (window limit or bucket capacity) for a key,
    /// creating the entry if this is its first touch. Outstanding usage is
    /// not reset; it remains subject to expiry/decay under the old totals.
    ///
    /// Privileged: callers are expected to gate this behind their own
    /// access control.
    pub fn set_rate_limit(&mut self, new_limit: Amount, chain_id: u64, asset: &str) -> Result<()> {
        let now = self.clock.now_secs();
        let limiter = self.entry(chain_id, asset, now)?;
        limiter.set_limit(new_limit);
        info!(chain_id, asset, limit = %new_limit, "rate limit updated");
        if let Some(metrics) = &self.metrics {
            metrics.record_limit_update(&chain_id.to_string(), asset);
        }
        Ok(())
    }

    /// Configured limit for a key; zero for a key never configured.
    pub fn rate_limit(&self, chain_id: u64, asset: &str) -> Amount {
        self.entries
            .get(&LimiterKey::new(chain_id, asset))
            .map(|l| l.limit())
            .unwrap_or(0)
    }

    /// Try to consume `amount` under a key, returning the key's new
    /// outstanding total. All-or-nothing per the owned limiter's rules.
    pub fn consume(&mut self, amount: Amount, chain_id: u64, asset: &str) -> Result<Amount> {
        let now = self.clock.now_secs();
        if let Some(metrics) = &self.metrics {
            metrics.record_consume_attempt(&chain_id.to_string(), asset);
        }
        let result = self.entry(chain_id, asset, now)?.consume(amount, now);
        if let Some(metrics) = &self.metrics {
            let chain = chain_id.to_string();
            match &result {
                Ok(_) => metrics.record_accepted(&chain, asset),
                Err(err) => metrics.record_rejected(&chain, asset, rejection_reason(err)),
            }
        }
        result
    }

    /// Current outstanding total for a key; zero for a key never touched.
    pub fn rate(&self, chain_id: u64, asset: &str) -> Result<Amount> {
        let now = self.clock.now_secs();
        match self.entries.get(&LimiterKey::new(chain_id, asset)) {
            Some(limiter) => limiter.rate(now),
            None => Ok(0),
        }
    }

    /// Look up or create the limiter for a key. A fresh entry is stamped
    /// with the caller's `now` so its creation time never runs ahead of the
    /// timestamp the current operation was evaluated at.
    fn entry(&mut self, chain_id: u64, asset: &str, now: u64) -> Result<&mut Limiter> {
        match self.entries.entry(LimiterKey::new(chain_id, asset)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let limiter = Limiter::new(self.kind, now)?;
                Ok(entry.insert(limiter))
            }
        }
    }
}

fn rejection_reason(err: &RateLimitError) -> &'static str {
    match err {
        RateLimitError::CapacityExceeded { .. } => "capacity_exceeded",
        RateLimitError::NonMonotonicClock { .. } => "non_monotonic_clock",
        RateLimitError::Overflow(_) => "overflow",
        RateLimitError::Config(_) => "config",
    }
}
