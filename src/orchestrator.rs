//! Withdrawal orchestrator - the control loop
//!
//! One cycle walks GateCheck -> BatchCheck -> Withdrawing and ends back in
//! Idle. The loop runs cycles forever in operational mode; single-shot mode
//! runs exactly one cycle. Withdrawals are submitted strictly sequentially
//! from this one task - a concurrent submission could double-spend against
//! a single balance check.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{Config, DUST_THRESHOLD_USD};
use crate::error::{Error, Result};
use crate::exchange::{ExchangeApi, WithdrawalReceipt, WithdrawalRequest};
use crate::gas::GasOracle;
use crate::wallet::{resolve, WalletAddressList};

/// Terminal result of one cycle. Policy refusals are outcomes, not errors -
/// the loop continues either way, but callers need to tell them apart.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Gas price at or above the ceiling; nothing withdrawn
    GateClosed { gwei: f64, max_gwei: f64 },
    /// Balance below amount x resolved destinations; nothing withdrawn
    InsufficientFunds { available: f64, required: f64 },
    /// The exchange lists no fee for this (currency, chain) pair
    FeeUnavailable { currency: String, chain: String },
    /// Live fee above the configured maximum; nothing withdrawn
    FeeTooHigh { fee: f64, max_fee: f64 },
    /// Batch ran; per-address results recorded independently
    Completed {
        submitted: Vec<WithdrawalReceipt>,
        failed: Vec<(String, Error)>,
        skipped_indexes: Vec<usize>,
    },
}

pub struct Orchestrator {
    config: Config,
    wallets: WalletAddressList,
    oracle: Arc<dyn GasOracle>,
    exchange: Arc<dyn ExchangeApi>,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        wallets: WalletAddressList,
        oracle: Arc<dyn GasOracle>,
        exchange: Arc<dyn ExchangeApi>,
    ) -> Self {
        Self {
            config,
            wallets,
            oracle,
            exchange,
        }
    }

    /// Current gas ceiling (may have been adopted from an observed quote)
    pub fn max_gwei(&self) -> f64 {
        self.config.max_gwei
    }

    /// Run one full cycle: gate check, batch check, withdrawals.
    ///
    /// Transport and application errors propagate; the caller decides
    /// whether to retry next interval or terminate.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        // GateCheck: fresh quote every cycle, strict inequality - a quote
        // equal to the ceiling keeps the gate closed
        let quote = self.oracle.fetch_gas_price().await?;
        if quote.gwei >= self.config.max_gwei {
            warn!(
                "Gate closed: {} gwei at or above ceiling {} gwei",
                quote.gwei, self.config.max_gwei
            );
            return Ok(CycleOutcome::GateClosed {
                gwei: quote.gwei,
                max_gwei: self.config.max_gwei,
            });
        }
        info!(
            "Gate open: {} gwei below ceiling {} gwei",
            quote.gwei, self.config.max_gwei
        );

        if self.config.adopt_observed_gwei {
            // Only adopt the new ceiling once it is safely on disk
            let previous = self.config.max_gwei;
            self.config.max_gwei = quote.gwei;
            if let Err(e) = self.config.persist_max_gwei() {
                self.config.max_gwei = previous;
                return Err(e);
            }
            info!("Adopted observed gas price {} gwei as new ceiling", quote.gwei);
        }

        // Resolve destinations before the balance check so skipped indexes
        // don't inflate the required amount
        let resolution = resolve(&self.config.wallet_indexes, &self.wallets);
        for index in &resolution.skipped {
            warn!(
                "Wallet index {} exceeds address list length {}, skipping",
                index,
                self.wallets.len()
            );
        }
        if resolution.addresses.is_empty() {
            warn!("No wallet index resolved to an address, nothing to withdraw");
            return Ok(CycleOutcome::Completed {
                submitted: vec![],
                failed: vec![],
                skipped_indexes: resolution.skipped,
            });
        }

        // BatchCheck: fresh balance, report non-dust lines
        let snapshot = self.exchange.get_balance().await?;
        for line in snapshot.above_dust(DUST_THRESHOLD_USD) {
            info!(
                "Balance: {} {} (~{:.2} USD)",
                line.available, line.currency, line.usd_equivalent
            );
        }
        info!("Total balance: ~{:.2} USD", snapshot.total_usd);

        let available = snapshot.available(&self.config.currency).unwrap_or(0.0);
        let required = self.config.amount * resolution.addresses.len() as f64;
        if available < required {
            warn!(
                "Insufficient {} balance: {} available, {} required for {} wallets",
                self.config.currency,
                available,
                required,
                resolution.addresses.len()
            );
            return Ok(CycleOutcome::InsufficientFunds {
                available,
                required,
            });
        }

        // Fee check happens before any funds-moving call, never after
        let fee = match self
            .exchange
            .get_withdrawal_fee(&self.config.currency, &self.config.chain)
            .await
        {
            Ok(fee) => fee,
            Err(Error::FeeNotFound { currency, chain }) => {
                warn!("No withdrawal fee listed for {} on {}", currency, chain);
                return Ok(CycleOutcome::FeeUnavailable { currency, chain });
            }
            Err(e) => return Err(e),
        };
        if fee.min_fee > self.config.max_fee {
            warn!(
                "Withdrawal fee {} exceeds maximum {}, batch refused",
                fee.min_fee, self.config.max_fee
            );
            return Ok(CycleOutcome::FeeTooHigh {
                fee: fee.min_fee,
                max_fee: self.config.max_fee,
            });
        }
        info!(
            "Withdrawal fee for {} on {}: {}",
            fee.currency, fee.chain, fee.min_fee
        );

        // Withdrawing: exactly one submission per resolved address, paced,
        // failures independent per address
        let mut submitted = Vec::new();
        let mut failed = Vec::new();
        for (i, (index, address)) in resolution.addresses.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.withdraw_delay_ms)).await;
            }

            let request = WithdrawalRequest {
                currency: self.config.currency.clone(),
                amount: self.config.amount,
                to_address: address.clone(),
                chain: self.config.chain.clone(),
                fee: fee.min_fee,
            };

            match self.exchange.withdraw(&request).await {
                Ok(receipt) => {
                    info!(
                        "Withdrawal {}/{} confirmed: wallet {} ({}) wdId {}",
                        i + 1,
                        resolution.addresses.len(),
                        index,
                        address,
                        receipt.wd_id
                    );
                    submitted.push(receipt);
                }
                Err(e) => {
                    error!(
                        "Withdrawal {}/{} failed: wallet {} ({}): {}",
                        i + 1,
                        resolution.addresses.len(),
                        index,
                        address,
                        e
                    );
                    failed.push((address.clone(), e));
                }
            }
        }

        Ok(CycleOutcome::Completed {
            submitted,
            failed,
            skipped_indexes: resolution.skipped,
        })
    }

    /// Run cycles forever, sleeping the polling interval between them.
    /// Any cycle error is logged and the loop retries next interval.
    pub async fn run_loop(&mut self) {
        loop {
            match self.run_cycle().await {
                Ok(outcome) => log_outcome(&outcome),
                Err(e) => error!("Cycle failed: {} (retrying next interval)", e),
            }
            tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
        }
    }
}

/// Log a cycle outcome at the appropriate level
pub fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::GateClosed { gwei, max_gwei } => {
            info!("Cycle ended: gate closed ({} >= {} gwei)", gwei, max_gwei);
        }
        CycleOutcome::InsufficientFunds {
            available,
            required,
        } => {
            info!(
                "Cycle ended: insufficient funds ({} < {})",
                available, required
            );
        }
        CycleOutcome::FeeUnavailable { currency, chain } => {
            info!("Cycle ended: no fee listed for {} on {}", currency, chain);
        }
        CycleOutcome::FeeTooHigh { fee, max_fee } => {
            info!("Cycle ended: fee {} above maximum {}", fee, max_fee);
        }
        CycleOutcome::Completed {
            submitted,
            failed,
            skipped_indexes,
        } => {
            info!(
                "Cycle completed: {} submitted, {} failed, {} indexes skipped",
                submitted.len(),
                failed.len(),
                skipped_indexes.len()
            );
        }
    }
}
