//! CLI command implementations

use std::sync::Arc;

use anyhow::Result;
use dialoguer::Confirm;
use tracing::{info, warn};

use crate::config::{Config, DUST_THRESHOLD_USD};
use crate::credentials::Credentials;
use crate::exchange::{ExchangeApi, ExchangeClient};
use crate::gas::{EtherscanGasOracle, GasOracle};
use crate::orchestrator::{log_outcome, Orchestrator};
use crate::wallet::{resolve, WalletAddressList};

/// Build the exchange client from config and a credentials file
fn exchange_client(config: &Config, credentials_path: &str) -> Result<ExchangeClient> {
    let credentials = Credentials::load(credentials_path)?;
    Ok(ExchangeClient::new(
        &config.exchange.base_url,
        credentials,
        config.exchange.secret_key_base64,
        config.exchange.timeout_secs,
    ))
}

fn gas_oracle(config: &Config) -> EtherscanGasOracle {
    EtherscanGasOracle::new(
        &config.oracle.base_url,
        &config.oracle.api_key,
        config.oracle.timeout_secs,
    )
}

fn build_orchestrator(
    config: Config,
    credentials_path: &str,
    wallets_path: &str,
) -> Result<Orchestrator> {
    let wallets = WalletAddressList::load(wallets_path)?;
    let exchange = Arc::new(exchange_client(&config, credentials_path)?);
    let oracle = Arc::new(gas_oracle(&config));
    Ok(Orchestrator::new(config, wallets, oracle, exchange))
}

/// Run the withdrawal loop until the process is terminated
pub async fn run(config: Config, credentials_path: &str, wallets_path: &str) -> Result<()> {
    info!(
        "Starting payout loop: {} x {} wallets on {}, polling every {}s",
        config.amount,
        config.wallet_indexes.len(),
        config.chain,
        config.poll_interval_secs
    );
    let mut orchestrator = build_orchestrator(config, credentials_path, wallets_path)?;
    orchestrator.run_loop().await;
    Ok(())
}

/// Run exactly one cycle and exit
pub async fn once(
    config: Config,
    credentials_path: &str,
    wallets_path: &str,
    yes: bool,
) -> Result<()> {
    if !yes {
        let proceed = Confirm::new()
            .with_prompt(format!(
                "Withdraw {} {} to each of {} configured wallet specs on {}?",
                config.amount,
                config.currency,
                config.wallet_indexes.len(),
                config.chain
            ))
            .default(false)
            .interact()?;
        if !proceed {
            warn!("Aborted by operator");
            return Ok(());
        }
    }

    let mut orchestrator = build_orchestrator(config, credentials_path, wallets_path)?;
    // A closed gate or a policy refusal is still a completed cycle;
    // transport/application errors propagate and exit non-zero
    let outcome = orchestrator.run_cycle().await?;
    log_outcome(&outcome);
    Ok(())
}

/// Print account balances above the dust threshold
pub async fn balance(config: &Config, credentials_path: &str) -> Result<()> {
    let client = exchange_client(config, credentials_path)?;
    let snapshot = client.get_balance().await?;

    let lines = snapshot.above_dust(DUST_THRESHOLD_USD);
    if lines.is_empty() {
        println!("No balances above {} USD", DUST_THRESHOLD_USD);
    }
    for line in lines {
        println!(
            "{:>8}  available {:<16} ~{:.2} USD",
            line.currency, line.available, line.usd_equivalent
        );
    }
    println!("Total: ~{:.2} USD", snapshot.total_usd);
    Ok(())
}

/// Print the current gas quote and the gate verdict
pub async fn gas(config: &Config) -> Result<()> {
    let oracle = gas_oracle(config);
    let quote = oracle.fetch_gas_price().await?;
    let verdict = if quote.gwei < config.max_gwei {
        "open"
    } else {
        "closed"
    };
    println!(
        "Gas price: {} gwei (ceiling {} gwei, gate {})",
        quote.gwei, config.max_gwei, verdict
    );
    Ok(())
}

/// Print the resolved destination wallets
pub fn wallets(config: &Config, wallets_path: &str) -> Result<()> {
    let list = WalletAddressList::load(wallets_path)?;
    let resolution = resolve(&config.wallet_indexes, &list);

    println!(
        "{} addresses loaded, {} resolved:",
        list.len(),
        resolution.addresses.len()
    );
    for (index, address) in &resolution.addresses {
        println!("  {:>4}  {}", index, address);
    }
    for index in &resolution.skipped {
        println!("  {:>4}  (out of range, skipped)", index);
    }
    Ok(())
}

/// Show the active configuration with secrets masked
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
