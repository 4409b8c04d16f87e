use prometheus::{CounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for the rate limiting engine
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    consumed: CounterVec,
    accepted: CounterVec,
    rejected: CounterVec,
    rejected_by_reason: CounterVec,
    limit_updates: CounterVec,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let consumed = CounterVec::new(
            Opts::new(
                "ratelimit_consume_attempts",
                "Total number of consume attempts",
            ),
            &["chain_id", "asset"],
        )?;

        let accepted = CounterVec::new(
            Opts::new(
                "ratelimit_consume_accepted",
                "Number of consume attempts admitted",
            ),
            &["chain_id", "asset"],
        )?;

        let rejected = CounterVec::new(
            Opts::new(
                "ratelimit_consume_rejected",
                "Number of consume attempts rejected",
            ),
            &["chain_id", "asset"],
        )?;

        let rejected_by_reason = CounterVec::new(
            Opts::new(
                "ratelimit_rejections_by_reason",
                "Rejected consume attempts by rejection reason",
            ),
            &["reason"],
        )?;

        let limit_updates = CounterVec::new(
            Opts::new(
                "ratelimit_limit_updates",
                "Number of per-key limit reconfigurations",
            ),
            &["chain_id", "asset"],
        )?;

        registry.register(Box::new(consumed.clone()))?;
        registry.register(Box::new(accepted.clone()))?;
        registry.register(Box::new(rejected.clone()))?;
        registry.register(Box::new(rejected_by_reason.clone()))?;
        registry.register(Box::new(limit_updates.clone()))?;

        Ok(Self {
            registry,
            consumed,
            accepted,
            rejected,
            rejected_by_reason,
            limit_updates,
        })
    }

    /// Get the Prometheus registry for this metrics instance
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a consume attempt
    pub fn record_consume_attempt(&self, chain_id: &str, asset: &str) {
        self.consumed.with_label_values(&[chain_id, asset]).inc();
    }

    /// Record an admitted consume
    pub fn record_accepted(&self, chain_id: &str, asset: &str) {
        self.accepted.with_label_values(&[chain_id, asset]).inc();
    }

    /// Record a rejected consume
    pub fn record_rejected(&self, chain_id: &str, asset: &str, reason: &str) {
        self.rejected.with_label_values(&[chain_id, asset]).inc();
        self.rejected_by_reason.with_label_values(&[reason]).inc();
    }

    /// Record a per-key limit update
    pub fn record_limit_update(&self, chain_id: &str, asset: &str) {
        self.limit_updates.with_label_values(&[chain_id, asset]).inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics")
    }
}
