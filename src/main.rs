//! Gas-gated withdrawal bot
//!
//! # WARNING
//! - This bot moves real funds from your exchange account.
//! - Check `payout wallets` and `payout config` before the first live run.
//! - The gas gate only guards timing; amount and fee limits are yours to set.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

// Use the library crate
use payout_bot::cli::commands;
use payout_bot::config::Config;

/// Gas-gated exchange withdrawal bot
#[derive(Parser)]
#[command(name = "payout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Path to credentials file (API keys, never logged)
    #[arg(long, default_value = "credentials.json")]
    credentials: String,

    /// Path to wallet address list (CSV, one address per row)
    #[arg(long, default_value = "wallets.csv")]
    wallets: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the withdrawal loop until terminated
    Run,

    /// Run exactly one cycle, then exit
    Once {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show account balances above the dust threshold
    Balance,

    /// Show the current gas price and gate verdict
    Gas,

    /// Show resolved destination wallets
    Wallets,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("payout_bot=info".parse().unwrap()),
        )
        .with_target(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = startup_checks(&cli, &config) {
        error!("Startup checks failed: {:#}", e);
        std::process::exit(1);
    }

    // Execute command
    let result = match cli.command {
        Commands::Run => commands::run(config, &cli.credentials, &cli.wallets).await,
        Commands::Once { yes } => {
            commands::once(config, &cli.credentials, &cli.wallets, yes).await
        }
        Commands::Balance => commands::balance(&config, &cli.credentials).await,
        Commands::Gas => commands::gas(&config).await,
        Commands::Wallets => commands::wallets(&config, &cli.wallets),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Fail fast on anything a cycle would trip over later
fn startup_checks(cli: &Cli, config: &Config) -> Result<()> {
    info!("Performing startup checks...");

    let needs_credentials = matches!(
        cli.command,
        Commands::Run | Commands::Once { .. } | Commands::Balance
    );
    if needs_credentials && !std::path::Path::new(&cli.credentials).exists() {
        anyhow::bail!("Credentials file not found: {}", cli.credentials);
    }

    let needs_wallets = matches!(
        cli.command,
        Commands::Run | Commands::Once { .. } | Commands::Wallets
    );
    if needs_wallets && !std::path::Path::new(&cli.wallets).exists() {
        anyhow::bail!("Wallet list not found: {}", cli.wallets);
    }

    let needs_oracle = matches!(
        cli.command,
        Commands::Run | Commands::Once { .. } | Commands::Gas
    );
    if needs_oracle && config.oracle.api_key.is_empty() {
        anyhow::bail!(
            "Gas oracle API key not set (oracle.api_key or ETHERSCAN_API_KEY)"
        );
    }

    info!(
        "Limits active: max_fee={}, max_gwei={}, amount={} {} per wallet",
        config.max_fee, config.max_gwei, config.amount, config.currency
    );

    info!("Startup checks passed");
    Ok(())
}
