//! Error types for the payout bot

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the payout bot
#[derive(Error, Debug)]
pub enum Error {
    // Startup errors - fatal, abort before any cycle runs
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Wallet list error: {0}")]
    WalletList(String),

    // Transport errors - network/HTTP failure reaching oracle or exchange
    #[error("Transport error: {0}")]
    Transport(String),

    // Application errors - the remote side returned a well-formed error body
    #[error("Gas oracle error: {0}")]
    Oracle(String),

    #[error("Exchange error {code}: {message}")]
    Exchange { code: String, message: String },

    #[error("No withdrawal fee listed for {currency} on chain {chain}")]
    FeeNotFound { currency: String, chain: String },

    // Policy violations - intentional cycle aborts, not bugs
    #[error("Withdrawal fee {fee} exceeds maximum {max_fee}")]
    FeeExceedsMax { fee: f64, max_fee: f64 },

    #[error("Gas price {gwei} gwei at or above ceiling {max_gwei} gwei")]
    GateClosed { gwei: f64, max_gwei: f64 },

    #[error("Insufficient balance: {available} available, {required} required")]
    InsufficientBalance { available: f64, required: f64 },

    // Persistence errors
    #[error("Config persistence failed: {0}")]
    Persistence(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable on the next cycle (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Oracle(_) | Error::Exchange { .. }
        )
    }

    /// Check if this error is an intentional policy refusal
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Error::FeeExceedsMax { .. }
                | Error::GateClosed { .. }
                | Error::InsufficientBalance { .. }
        )
    }

    /// Check if this error is fatal at startup (bad config/credentials/wallets)
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::Credentials(_) | Error::WalletList(_)
        )
    }
}

// Conversion from reqwest errors
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_violations_are_not_retryable() {
        let err = Error::FeeExceedsMax {
            fee: 0.005,
            max_fee: 0.002,
        };
        assert!(err.is_policy_violation());
        assert!(!err.is_retryable());

        let err = Error::Transport("connection refused".into());
        assert!(err.is_retryable());
        assert!(!err.is_policy_violation());
    }

    #[test]
    fn test_startup_errors() {
        assert!(Error::Config("missing field".into()).is_startup_error());
        assert!(!Error::Oracle("rate limited".into()).is_startup_error());
    }
}
