//! CLI configuration

use serde::Deserialize;

/// Billing CLI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Bound on number range lock waits, in milliseconds
    pub lock_timeout_ms: u64,
    /// Prefix drawn onto newly created contract numbers
    pub contract_prefix: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/rebill".to_string(),
            log_level: "info".to_string(),
            lock_timeout_ms: 5_000,
            contract_prefix: "V".to_string(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("REBILL"))
            .build()?
            .try_deserialize()
    }

    /// Loads from environment, falling back to individual variables and
    /// defaults where the prefixed set is incomplete
    pub fn load() -> Self {
        Self::from_env().unwrap_or_else(|_| {
            let defaults = Self::default();
            Self {
                database_url: std::env::var("DATABASE_URL")
                    .or_else(|_| std::env::var("REBILL_DATABASE_URL"))
                    .unwrap_or(defaults.database_url),
                log_level: std::env::var("REBILL_LOG_LEVEL")
                    .or_else(|_| std::env::var("RUST_LOG"))
                    .unwrap_or(defaults.log_level),
                lock_timeout_ms: std::env::var("REBILL_LOCK_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.lock_timeout_ms),
                contract_prefix: std::env::var("REBILL_CONTRACT_PREFIX")
                    .unwrap_or(defaults.contract_prefix),
            }
        })
    }
}
