//! Exchange integration: request signing, wire types, REST client

pub mod client;
pub mod sign;
pub mod types;

pub use client::{ExchangeApi, ExchangeClient};
pub use sign::{sign, timestamp_now, SecretKey};
pub use types::{
    BalanceSnapshot, CurrencyBalance, FeeQuote, WithdrawalReceipt, WithdrawalRequest,
};
