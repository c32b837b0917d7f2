//! Gateway configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields a working configuration.

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const HOUR_SECS: u64 = 60 * 60;
const DAY_SECS: u64 = 24 * HOUR_SECS;

/// Expiry of the per-payment and per-checkout state kept in the key-value
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub retry_counter_ttl_secs: u64,
    pub failed_vendors_ttl_secs: u64,
    pub declined_instruments_ttl_secs: u64,
    pub payment_cache_ttl_secs: u64,
    pub status_cache_ttl_secs: u64,
    /// `None` keeps checkout responses for the life of the store.
    pub idempotency_ttl_secs: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retry_counter_ttl_secs: DAY_SECS,
            failed_vendors_ttl_secs: DAY_SECS,
            declined_instruments_ttl_secs: HOUR_SECS,
            payment_cache_ttl_secs: DAY_SECS,
            status_cache_ttl_secs: DAY_SECS,
            idempotency_ttl_secs: None,
        }
    }
}

impl LedgerConfig {
    pub fn retry_counter_ttl(&self) -> Duration {
        Duration::from_secs(self.retry_counter_ttl_secs)
    }

    pub fn failed_vendors_ttl(&self) -> Duration {
        Duration::from_secs(self.failed_vendors_ttl_secs)
    }

    pub fn declined_instruments_ttl(&self) -> Duration {
        Duration::from_secs(self.declined_instruments_ttl_secs)
    }

    pub fn payment_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.payment_cache_ttl_secs)
    }

    pub fn status_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.status_cache_ttl_secs)
    }

    pub fn idempotency_ttl(&self) -> Option<Duration> {
        self.idempotency_ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Calls to `process` allowed per payment id before a retryable failure
    /// stops being retried.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub ledger: LedgerConfig,
    pub retry: RetryPolicy,
    /// Currency used when a request does not carry one.
    pub default_currency: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            retry: RetryPolicy::default(),
            default_currency: "INR".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| GatewayError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(GatewayError::ConfigError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.default_currency.trim().is_empty() {
            return Err(GatewayError::ConfigError(
                "default_currency must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GatewayConfig::from_toml("").unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.ledger.declined_instruments_ttl(), Duration::from_secs(3600));
        assert_eq!(config.ledger.retry_counter_ttl(), Duration::from_secs(86400));
        assert_eq!(config.ledger.idempotency_ttl(), None);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_partial_override() {
        let config = GatewayConfig::from_toml(
            r#"
            default_currency = "USD"

            [retry]
            max_attempts = 2

            [ledger]
            idempotency_ttl_secs = 600
            "#,
        )
        .unwrap();
        assert_eq!(config.default_currency, "USD");
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.ledger.idempotency_ttl(), Some(Duration::from_secs(600)));
        assert_eq!(config.ledger.payment_cache_ttl_secs, DAY_SECS);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            GatewayConfig::from_toml("[retry]\nmax_attempts = 0"),
            Err(GatewayError::ConfigError(_))
        ));
        assert!(matches!(
            GatewayConfig::from_toml("default_currency = 5"),
            Err(GatewayError::ConfigError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retry]\nmax_attempts = 3").unwrap();
        let config = GatewayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
    }
}
