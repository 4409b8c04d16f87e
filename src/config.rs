use serde::{Deserialize, Serialize};

use crate::{
    clock::Clock,
    error::{RateLimitError, Result},
    limiter::LimiterKind,
    set::LimiterSet,
    utils::Amount,
};

/// Declarative setup for a limiter registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterSetConfig {
    pub algorithm: Algorithm,
    /// Windowed geometry; required when `algorithm` is `windowed`.
    pub bin_count: Option<usize>,
    pub bin_span_secs: Option<u64>,
    /// Bucket drain rate; required when `algorithm` is `token_bucket`.
    /// Decimal string at the asset's fixed-point scale.
    pub refill_rate_per_sec: Option<String>,
    /// Per-key limits applied at build time.
    #[serde(default)]
    pub limits: Vec<KeyLimitConfig>,
}

/// Accounting algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Windowed,
    TokenBucket,
}

/// Limit for one `(chain id, asset)` key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyLimitConfig {
    pub chain_id: u64,
    pub asset: String,
    /// Decimal string: 18-decimal amounts overflow the YAML integer range.
    pub limit: String,
}

impl LimiterSetConfig {
    /// Resolve the algorithm selection into a limiter kind, validating that
    /// the fields the chosen algorithm needs are present.
    pub fn kind(&self) -> Result<LimiterKind> {
        match self.algorithm {
            Algorithm::Windowed => {
                let bin_count = self.bin_count.ok_or_else(|| {
                    RateLimitError::Config("windowed algorithm requires bin_count".into())
                })?;
                let bin_span_secs = self.bin_span_secs.ok_or_else(|| {
                    RateLimitError::Config("windowed algorithm requires bin_span_secs".into())
                })?;
                Ok(LimiterKind::Windowed {
                    bin_count,
                    bin_span_secs,
                })
            }
            Algorithm::TokenBucket => {
                let rate = self.refill_rate_per_sec.as_deref().ok_or_else(|| {
                    RateLimitError::Config("token_bucket algorithm requires refill_rate_per_sec".into())
                })?;
                Ok(LimiterKind::TokenBucket {
                    refill_rate_per_sec: parse_amount(rate)?,
                })
            }
        }
    }

    /// Build a live registry on the given clock with every configured
    /// per-key limit applied.
    pub fn build<C: Clock>(&self, clock: C) -> Result<LimiterSet<C>> {
        let mut set = LimiterSet::with_clock(self.kind()?, clock)?;
        for entry in &self.limits {
            set.set_rate_limit(parse_amount(&entry.limit)?, entry.chain_id, &entry.asset)?;
        }
        Ok(set)
    }
}

/// Parse a decimal-string amount
fn parse_amount(s: &str) -> Result<Amount> {
    s.parse::<Amount>()
        .map_err(|e| RateLimitError::Config(format!("invalid amount '{}': {}", s, e)))
}

/// Load configuration from YAML string
pub fn load_config_from_yaml(yaml: &str) -> Result<LimiterSetConfig> {
    serde_yaml::from_str(yaml)
        .map_err(|e| RateLimitError::Config(format!("Failed to parse YAML: {}", e)))
}

/// Load configuration from YAML file
pub fn load_config_from_file(path: &str) -> Result<LimiterSetConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RateLimitError::Config(format!("Failed to read {}: {}", path, e)))?;
    load_config_from_yaml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::utils::tokens;

    #[test]
    fn test_load_windowed_config_from_yaml() {
        let yaml = r#"
algorithm: windowed
bin_count: 4
bin_span_secs: 3600
limits:
  - chain_id: 1
    asset: "0x024d6050275eec53b233B467AdA12d2C65B3AEce"
    limit: "100000000000000000000"
"#;

        let config = load_config_from_yaml(yaml).unwrap();
        assert_eq!(config.algorithm, Algorithm::Windowed);
        assert_eq!(config.limits.len(), 1);
        assert_eq!(
            config.kind().unwrap(),
            LimiterKind::Windowed {
                bin_count: 4,
                bin_span_secs: 3600,
            }
        );
    }

    #[test]
    fn test_load_bucket_config_from_yaml() {
        let yaml = r#"
algorithm: token_bucket
refill_rate_per_sec: "1000000000000000000"
"#;

        let config = load_config_from_yaml(yaml).unwrap();
        assert_eq!(
            config.kind().unwrap(),
            LimiterKind::TokenBucket {
                refill_rate_per_sec: tokens(1),
            }
        );
    }

    #[test]
    fn test_missing_geometry_is_config_error() {
        let yaml = "algorithm: windowed\nbin_count: 4\n";
        let config = load_config_from_yaml(yaml).unwrap();
        assert!(matches!(config.kind(), Err(RateLimitError::Config(_))));
    }

    #[test]
    fn test_bad_amount_string_is_config_error() {
        let yaml = r#"
algorithm: token_bucket
refill_rate_per_sec: "1.5e18"
"#;
        let config = load_config_from_yaml(yaml).unwrap();
        assert!(matches!(config.kind(), Err(RateLimitError::Config(_))));
    }

    #[test]
    fn test_build_applies_limits() {
        let yaml = r#"
algorithm: windowed
bin_count: 4
bin_span_secs: 3600
limits:
  - chain_id: 1
    asset: "0xaaa"
    limit: "100000000000000000000"
  - chain_id: 56
    asset: "0xbbb"
    limit: "5000000000000000000"
"#;

        let clock = ManualClock::new(0);
        let config = load_config_from_yaml(yaml).unwrap();
        let mut set = config.build(&clock).unwrap();
        assert_eq!(set.rate_limit(1, "0xaaa"), tokens(100));
        assert_eq!(set.rate_limit(56, "0xbbb"), tokens(5));
        assert_eq!(set.rate_limit(56, "0xaaa"), 0);
        assert_eq!(set.consume(tokens(10), 1, "0xaaa").unwrap(), tokens(10));
    }
}
