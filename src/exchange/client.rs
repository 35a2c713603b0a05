//! Authenticated exchange REST client
//!
//! Three operations: balance query, withdrawal fee lookup, withdrawal
//! submission. Each call is independently signed with a fresh timestamp.
//! The client never retries - at-most-once submission per address is the
//! orchestrator's invariant and a retry here would break it.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::error::{Error, Result};

use super::sign::{self, SecretKey};
use super::types::{
    ApiEnvelope, BalanceData, BalanceSnapshot, CurrencyData, FeeQuote, WithdrawalBody,
    WithdrawalData, WithdrawalReceipt, WithdrawalRequest,
};

/// Narrow interface over the exchange, mockable in orchestrator tests
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    async fn get_balance(&self) -> Result<BalanceSnapshot>;
    async fn get_withdrawal_fee(&self, currency: &str, chain: &str) -> Result<FeeQuote>;
    async fn withdraw(&self, request: &WithdrawalRequest) -> Result<WithdrawalReceipt>;
}

pub struct ExchangeClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    secret: SecretKey,
}

impl ExchangeClient {
    /// Create a client against the given base URL.
    ///
    /// `secret_key_base64` declares whether the account's secret key is
    /// base64-encoded key material (decoded before signing) or the raw
    /// secret string.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        secret_key_base64: bool,
        timeout_secs: u64,
    ) -> Self {
        let secret = if secret_key_base64 {
            SecretKey::Base64(credentials.secret_key.clone())
        } else {
            SecretKey::Raw(credentials.secret_key.clone())
        };
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            secret,
        }
    }

    /// Build the four auth headers for a request. The timestamp is
    /// generated here, fresh per call.
    fn signed_request(
        &self,
        method: reqwest::Method,
        request_path: &str,
        body: &str,
    ) -> Result<reqwest::RequestBuilder> {
        let timestamp = sign::timestamp_now();
        let signature = sign::sign(&timestamp, method.as_str(), request_path, body, &self.secret)?;

        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, request_path))
            .header("OK-ACCESS-KEY", &self.credentials.api_key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-TIMESTAMP", timestamp)
            .header("OK-ACCESS-PASSPHRASE", &self.credentials.passphrase);

        if !body.is_empty() {
            req = req
                .header("Content-Type", "application/json")
                .body(body.to_string());
        }
        Ok(req)
    }

    /// Unwrap the exchange envelope, turning a non-"0" code into an error
    fn check_envelope<T>(envelope: ApiEnvelope<T>) -> Result<Vec<T>> {
        if envelope.code != "0" {
            return Err(Error::Exchange {
                code: envelope.code,
                message: envelope.msg,
            });
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl ExchangeApi for ExchangeClient {
    async fn get_balance(&self) -> Result<BalanceSnapshot> {
        let path = "/api/v5/account/balance";
        let resp = self
            .signed_request(reqwest::Method::GET, path, "")?
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Exchange {
                code: status.as_u16().to_string(),
                message: body,
            });
        }

        let envelope: ApiEnvelope<BalanceData> = resp.json().await?;
        let mut data = Self::check_envelope(envelope)?;
        let account = data
            .drain(..)
            .next()
            .ok_or_else(|| Error::Exchange {
                code: "0".into(),
                message: "balance response contained no account data".into(),
            })?;

        debug!("Balance snapshot fetched");
        Ok(account.into_snapshot())
    }

    async fn get_withdrawal_fee(&self, currency: &str, chain: &str) -> Result<FeeQuote> {
        // Query string is part of the signed request path
        let path = format!("/api/v5/asset/currencies?ccy={}", currency);
        let resp = self
            .signed_request(reqwest::Method::GET, &path, "")?
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Exchange {
                code: status.as_u16().to_string(),
                message: body,
            });
        }

        let envelope: ApiEnvelope<CurrencyData> = resp.json().await?;
        let data = Self::check_envelope(envelope)?;

        // The table lists every supported chain; filter for the exact pair.
        // A missing entry means "chain not supported", not a transport
        // failure - the caller needs to tell those apart.
        data.into_iter()
            .find(|c| c.ccy == currency && c.chain == chain)
            .and_then(|c| {
                Some(FeeQuote {
                    min_fee: super::types::parse_amount(&c.min_fee)?,
                    currency: c.ccy,
                    chain: c.chain,
                })
            })
            .ok_or_else(|| Error::FeeNotFound {
                currency: currency.to_string(),
                chain: chain.to_string(),
            })
    }

    async fn withdraw(&self, request: &WithdrawalRequest) -> Result<WithdrawalReceipt> {
        let path = "/api/v5/asset/withdrawal";
        let body = WithdrawalBody {
            ccy: request.currency.clone(),
            amt: request.amount.to_string(),
            dest: "4".to_string(),
            to_addr: request.to_address.clone(),
            chain: request.chain.clone(),
            fee: request.fee.to_string(),
            pwd: self.credentials.withdrawal_password.clone(),
        };
        // Serialize once; these exact bytes are signed and transmitted
        let body_json = serde_json::to_string(&body)?;

        let resp = self
            .signed_request(reqwest::Method::POST, path, &body_json)?
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            // Keep the raw body for audit - it names the rejection reason
            let raw = resp.text().await.unwrap_or_default();
            warn!("Withdrawal to {} rejected ({}): {}", request.to_address, status, raw);
            return Err(Error::Exchange {
                code: status.as_u16().to_string(),
                message: raw,
            });
        }

        let envelope: ApiEnvelope<WithdrawalData> = resp.json().await?;
        let mut data = Self::check_envelope(envelope)?;
        let ack = data.drain(..).next().ok_or_else(|| Error::Exchange {
            code: "0".into(),
            message: "withdrawal response contained no confirmation data".into(),
        })?;

        info!(
            "Withdrawal submitted: {} {} to {} (wdId: {})",
            request.amount, request.currency, request.to_address, ack.wd_id
        );

        Ok(WithdrawalReceipt {
            wd_id: ack.wd_id,
            currency: request.currency.clone(),
            amount: request.amount,
            to_address: request.to_address.clone(),
        })
    }
}
