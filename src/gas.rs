//! Gas price oracle client
//!
//! Fetches the current proposed gas price from an Etherscan-style gas
//! tracker. Unauthenticated beyond the API key query parameter. Never
//! retries internally - the orchestrator's polling interval is the retry
//! cadence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// A single gas price reading. Fetched fresh for every gating decision,
/// never cached across cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct GasQuote {
    pub gwei: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Narrow interface over the oracle, mockable in orchestrator tests
#[async_trait]
pub trait GasOracle: Send + Sync {
    async fn fetch_gas_price(&self) -> Result<GasQuote>;
}

#[derive(Debug, Deserialize)]
struct GasOracleResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GasOracleResult {
    #[serde(rename = "ProposeGasPrice")]
    propose_gas_price: String,
}

pub struct EtherscanGasOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EtherscanGasOracle {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl GasOracle for EtherscanGasOracle {
    async fn fetch_gas_price(&self) -> Result<GasQuote> {
        let url = format!(
            "{}/api?module=gastracker&action=gasoracle&apikey={}",
            self.base_url, self.api_key
        );
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "gas oracle returned HTTP {}",
                status
            )));
        }

        let body: GasOracleResponse = resp.json().await?;

        // The tracker signals application errors with status != "1" and a
        // human-readable message; the result field then carries detail text
        if body.status != "1" {
            let detail = body
                .result
                .as_str()
                .map(|s| format!(": {}", s))
                .unwrap_or_default();
            return Err(Error::Oracle(format!("{}{}", body.message, detail)));
        }

        let result: GasOracleResult = serde_json::from_value(body.result)?;
        let gwei = result
            .propose_gas_price
            .parse::<f64>()
            .map_err(|e| Error::Oracle(format!("Unparseable gas price: {}", e)))?;

        debug!("Gas oracle quote: {} gwei", gwei);
        Ok(GasQuote {
            gwei,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_parses() {
        let json = r#"{
            "status": "1",
            "message": "OK",
            "result": {"SafeGasPrice": "2.1", "ProposeGasPrice": "3.2", "FastGasPrice": "4.0"}
        }"#;
        let body: GasOracleResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.status, "1");
        let result: GasOracleResult = serde_json::from_value(body.result).unwrap();
        assert_eq!(result.propose_gas_price.parse::<f64>().unwrap(), 3.2);
    }

    #[test]
    fn test_error_response_shape() {
        // Error responses carry detail text in result instead of an object
        let json = r#"{
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        }"#;
        let body: GasOracleResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.status, "0");
        assert_eq!(body.result.as_str(), Some("Max rate limit reached"));
    }
}
