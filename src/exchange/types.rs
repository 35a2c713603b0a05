//! Exchange API wire types and domain snapshots
//!
//! The exchange speaks a `{ code, msg, data }` envelope with string-typed
//! numeric fields; parsing to f64 happens here so the rest of the bot
//! works with numbers.

use serde::{Deserialize, Serialize};

/// Response envelope shared by every exchange endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// One account entry of the balance response
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceData {
    #[serde(rename = "totalEq", default)]
    pub total_eq: String,
    #[serde(default)]
    pub details: Vec<BalanceDetail>,
}

/// Per-currency line of the balance response
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceDetail {
    pub ccy: String,
    #[serde(rename = "availBal", default)]
    pub avail_bal: String,
    #[serde(rename = "eqUsd", default)]
    pub eq_usd: String,
}

/// One entry of the currency/fee table
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyData {
    pub ccy: String,
    #[serde(default)]
    pub chain: String,
    #[serde(rename = "minFee", default)]
    pub min_fee: String,
}

/// Acknowledgement data of a withdrawal submission
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalData {
    #[serde(rename = "wdId")]
    pub wd_id: String,
    #[serde(default)]
    pub ccy: String,
    #[serde(default)]
    pub amt: String,
    #[serde(default)]
    pub chain: String,
}

/// Withdrawal request body. Field names and order are the transmitted wire
/// form; the serialized bytes are exactly what gets signed.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalBody {
    pub ccy: String,
    pub amt: String,
    /// "4" = on-chain address (as opposed to internal transfer)
    pub dest: String,
    #[serde(rename = "toAddr")]
    pub to_addr: String,
    pub chain: String,
    pub fee: String,
    pub pwd: String,
}

/// Available balance for one currency, with USD valuation
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyBalance {
    pub currency: String,
    pub available: f64,
    pub usd_equivalent: f64,
}

/// Point-in-time view of account balances. Taken fresh before each
/// withdrawal batch, never reused across cycles.
#[derive(Debug, Clone)]
pub struct BalanceSnapshot {
    pub balances: Vec<CurrencyBalance>,
    pub total_usd: f64,
}

impl BalanceSnapshot {
    /// Available balance for a currency, if the account holds any
    pub fn available(&self, currency: &str) -> Option<f64> {
        self.balances
            .iter()
            .find(|b| b.currency == currency)
            .map(|b| b.available)
    }

    /// Lines worth reporting: USD valuation above the dust threshold
    pub fn above_dust(&self, threshold_usd: f64) -> Vec<&CurrencyBalance> {
        self.balances
            .iter()
            .filter(|b| b.usd_equivalent > threshold_usd)
            .collect()
    }
}

/// Minimum withdrawal fee for a (currency, chain) pair at the time of the
/// call. Fees fluctuate - re-fetch per batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeQuote {
    pub currency: String,
    pub chain: String,
    pub min_fee: f64,
}

/// A single withdrawal to submit
#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub currency: String,
    pub amount: f64,
    pub to_address: String,
    pub chain: String,
    pub fee: f64,
}

/// Confirmed submission, identified by the exchange-assigned id
#[derive(Debug, Clone)]
pub struct WithdrawalReceipt {
    pub wd_id: String,
    pub currency: String,
    pub amount: f64,
    pub to_address: String,
}

/// Parse a string-typed numeric field, treating empty as absent
pub(crate) fn parse_amount(s: &str) -> Option<f64> {
    if s.is_empty() {
        None
    } else {
        s.parse::<f64>().ok()
    }
}

impl BalanceData {
    /// Convert the wire form into a snapshot, dropping unparseable lines
    pub fn into_snapshot(self) -> BalanceSnapshot {
        let balances = self
            .details
            .into_iter()
            .filter_map(|d| {
                Some(CurrencyBalance {
                    available: parse_amount(&d.avail_bal)?,
                    usd_equivalent: parse_amount(&d.eq_usd).unwrap_or(0.0),
                    currency: d.ccy,
                })
            })
            .collect();
        BalanceSnapshot {
            balances,
            total_usd: parse_amount(&self.total_eq).unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> BalanceSnapshot {
        BalanceSnapshot {
            balances: vec![
                CurrencyBalance {
                    currency: "ETH".into(),
                    available: 10.0,
                    usd_equivalent: 30000.0,
                },
                CurrencyBalance {
                    currency: "DUST".into(),
                    available: 0.0001,
                    usd_equivalent: 0.02,
                },
            ],
            total_usd: 30000.02,
        }
    }

    #[test]
    fn test_available_lookup() {
        let snap = snapshot();
        assert_eq!(snap.available("ETH"), Some(10.0));
        assert_eq!(snap.available("BTC"), None);
    }

    #[test]
    fn test_dust_filter() {
        let snap = snapshot();
        let lines = snap.above_dust(1.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].currency, "ETH");
    }

    #[test]
    fn test_balance_data_into_snapshot() {
        let json = r#"{
            "totalEq": "30000.02",
            "details": [
                {"ccy": "ETH", "availBal": "10", "eqUsd": "30000"},
                {"ccy": "BAD", "availBal": "", "eqUsd": ""}
            ]
        }"#;
        let data: BalanceData = serde_json::from_str(json).unwrap();
        let snap = data.into_snapshot();
        assert_eq!(snap.balances.len(), 1);
        assert_eq!(snap.available("ETH"), Some(10.0));
        assert_eq!(snap.total_usd, 30000.02);
    }

    #[test]
    fn test_withdrawal_body_wire_names() {
        let body = WithdrawalBody {
            ccy: "ETH".into(),
            amt: "0.01".into(),
            dest: "4".into(),
            to_addr: "0xabc".into(),
            chain: "ETH-ERC20".into(),
            fee: "0.001".into(),
            pwd: "pw".into(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"toAddr\":\"0xabc\""));
        assert!(json.contains("\"dest\":\"4\""));
    }
}
