//! Gas-gated withdrawal bot library
//!
//! Automates exchange withdrawals to a configured list of destination
//! wallets, gated on a live gas-price reading and balance/fee policy
//! checks.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod exchange;
pub mod gas;
pub mod orchestrator;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
