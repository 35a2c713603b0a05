//! Configuration loading, validation, and gas-threshold persistence

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::wallet::IndexSpec;

/// Dust threshold for balance reporting: lines valued at or below this many
/// USD are not worth printing
pub const DUST_THRESHOLD_USD: f64 = 1.0;

/// Main configuration structure
///
/// Top-level fields mirror the operator-facing config file; `exchange` and
/// `oracle` hold endpoint plumbing. `max_gwei` is the one mutable field:
/// with `adopt_observed_gwei` set, an open gate rewrites it to the observed
/// quote and persists the file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub currency: String,
    pub chain: String,
    /// Amount withdrawn per destination wallet
    pub amount: f64,
    /// Refuse to withdraw if the live fee exceeds this
    pub max_fee: f64,
    /// Gas price ceiling in gwei; the gate opens strictly below it
    #[serde(default = "default_max_gwei")]
    pub max_gwei: f64,
    /// Adopt each observed safe quote as the new ceiling and persist it
    #[serde(default)]
    pub adopt_observed_gwei: bool,
    /// Destination wallets by 1-based index or inclusive range
    pub wallet_indexes: Vec<IndexSpec>,
    /// Sleep between cycles in operational mode
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Pacing between successive withdrawal submissions
    #[serde(default = "default_withdraw_delay_ms")]
    pub withdraw_delay_ms: u64,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Path the config was loaded from, kept for threshold persistence
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_exchange_url")]
    pub base_url: String,
    #[serde(default = "default_exchange_timeout_secs")]
    pub timeout_secs: u64,
    /// Whether the account's secret key is base64-encoded key material
    #[serde(default)]
    pub secret_key_base64: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_exchange_url(),
            timeout_secs: default_exchange_timeout_secs(),
            secret_key_base64: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_oracle_url")]
    pub base_url: String,
    #[serde(default = "default_oracle_api_key")]
    pub api_key: String,
    #[serde(default = "default_oracle_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_oracle_url(),
            api_key: default_oracle_api_key(),
            timeout_secs: default_oracle_timeout_secs(),
        }
    }
}

// Default value functions
fn default_max_gwei() -> f64 {
    5.0
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_withdraw_delay_ms() -> u64 {
    1000
}

fn default_exchange_url() -> String {
    "https://www.okx.com".into()
}

fn default_exchange_timeout_secs() -> u64 {
    30
}

fn default_oracle_url() -> String {
    "https://api.etherscan.io".into()
}

fn default_oracle_api_key() -> String {
    std::env::var("ETHERSCAN_API_KEY").unwrap_or_default()
}

fn default_oracle_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix PAYOUT_)
            .add_source(
                config::Environment::with_prefix("PAYOUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.currency.is_empty() {
            anyhow::bail!("currency must be set");
        }
        if self.chain.is_empty() {
            anyhow::bail!("chain must be set");
        }
        if self.amount <= 0.0 {
            anyhow::bail!("amount must be positive");
        }
        if self.max_fee <= 0.0 {
            anyhow::bail!("max_fee must be positive");
        }
        if self.max_gwei <= 0.0 {
            anyhow::bail!("max_gwei must be positive");
        }
        if self.wallet_indexes.is_empty() {
            anyhow::bail!("wallet_indexes must name at least one destination");
        }
        if self.withdraw_delay_ms < 1000 {
            anyhow::bail!("withdraw_delay_ms must be at least 1000 (exchange rate limits)");
        }
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be at least 1");
        }
        if self.adopt_observed_gwei {
            let exists = self
                .path
                .as_deref()
                .map(Path::exists)
                .unwrap_or(false);
            if !exists {
                anyhow::bail!(
                    "adopt_observed_gwei requires a config file to persist the threshold to"
                );
            }
        }
        Ok(())
    }

    /// Persist the current `max_gwei` back to the config file.
    ///
    /// Rewrites the whole record while preserving every other field, via a
    /// temp file in the same directory and an atomic rename - a crash
    /// mid-write must never leave a corrupt config behind.
    pub fn persist_max_gwei(&self) -> crate::error::Result<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| Error::Persistence("no config file path to persist to".into()))?;

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Persistence(format!("read {}: {}", path.display(), e)))?;
        let mut record: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| Error::Persistence(format!("parse {}: {}", path.display(), e)))?;

        let object = record
            .as_object_mut()
            .ok_or_else(|| Error::Persistence("config file is not a JSON object".into()))?;
        object.insert("max_gwei".into(), serde_json::json!(self.max_gwei));

        let serialized = serde_json::to_string_pretty(&record)
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serialized)
            .map_err(|e| Error::Persistence(format!("write {}: {}", tmp_path.display(), e)))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|e| Error::Persistence(format!("rename over {}: {}", path.display(), e)))?;

        tracing::debug!("Persisted max_gwei={} to {}", self.max_gwei, path.display());
        Ok(())
    }

    /// Get configuration for display (oracle key masked)
    pub fn masked_display(&self) -> String {
        let indexes: Vec<String> = self.wallet_indexes.iter().map(|s| s.to_string()).collect();
        format!(
            r#"Configuration:
  Withdrawal:
    currency: {}
    chain: {}
    amount per wallet: {}
    max_fee: {}
    wallet_indexes: [{}]
  Gate:
    max_gwei: {}
    adopt_observed_gwei: {}
  Schedule:
    poll_interval: {}s
    withdraw_delay: {}ms
  Exchange:
    base_url: {}
    timeout: {}s
    secret_key_base64: {}
  Oracle:
    base_url: {}
    api_key: {}
    timeout: {}s
"#,
            self.currency,
            self.chain,
            self.amount,
            self.max_fee,
            indexes.join(", "),
            self.max_gwei,
            self.adopt_observed_gwei,
            self.poll_interval_secs,
            self.withdraw_delay_ms,
            self.exchange.base_url,
            self.exchange.timeout_secs,
            self.exchange.secret_key_base64,
            self.oracle.base_url,
            if self.oracle.api_key.is_empty() {
                "(not set)"
            } else {
                "***"
            },
            self.oracle.timeout_secs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::IndexSpec;

    fn sample_config() -> Config {
        Config {
            currency: "ETH".into(),
            chain: "ETH-ERC20".into(),
            amount: 0.01,
            max_fee: 0.002,
            max_gwei: 5.0,
            adopt_observed_gwei: false,
            wallet_indexes: vec![IndexSpec::Single(1)],
            poll_interval_secs: 60,
            withdraw_delay_ms: 1000,
            exchange: ExchangeConfig::default(),
            oracle: OracleConfig::default(),
            path: None,
        }
    }

    fn sample_json() -> &'static str {
        r#"{
            "currency": "ETH",
            "chain": "ETH-ERC20",
            "amount": 0.01,
            "max_fee": 0.002,
            "max_gwei": 5.0,
            "wallet_indexes": [2, "4-6"],
            "operator_note": "do not remove"
        }"#
    }

    #[test]
    fn test_validate_sample() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = sample_config();
        config.amount = 0.0;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.withdraw_delay_ms = 100;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.wallet_indexes.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, sample_json()).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.currency, "ETH");
        assert_eq!(config.max_gwei, 5.0);
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(
            config.wallet_indexes,
            vec![IndexSpec::Single(2), IndexSpec::Range(4, 6)]
        );
    }

    #[test]
    fn test_persist_preserves_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, sample_json()).unwrap();

        let mut config = Config::load(&path).unwrap();
        config.max_gwei = 3.2;
        config.persist_max_gwei().unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.max_gwei, 3.2);

        // Fields the bot does not model survive the rewrite
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["operator_note"], "do not remove");
        assert_eq!(raw["currency"], "ETH");

        // No stray temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_adopt_observed_gwei_requires_file() {
        let mut config = sample_config();
        config.adopt_observed_gwei = true;
        config.path = Some("/nonexistent/config.json".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_masked_display_hides_oracle_key() {
        let mut config = sample_config();
        config.oracle.api_key = "etherscan-key".into();
        let display = config.masked_display();
        assert!(!display.contains("etherscan-key"));
        assert!(display.contains("***"));
    }
}
