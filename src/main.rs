//! Receipt program client CLI
//!
//! Two subcommands mirror the program's operations: `initialize` runs the
//! configured token list through receipt initialization, and `deposit`
//! moves tokens into a receipt vault.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use receipt_client::config::Config;
use receipt_client::engine::ReceiptEngine;
use receipt_client::registry::AddressBook;
use receipt_client::wallet::WalletManager;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize receipt state for every configured token
    Initialize,

    /// Deposit tokens into a receipt vault
    Deposit {
        /// Underlying token mint
        #[arg(long)]
        mint: String,

        /// Amount in base units of the token
        #[arg(long)]
        amount: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    info!("Loading configuration from: {}", args.config);
    let config = Config::from_file_with_env(&args.config)?;

    let wallet = WalletManager::from_file(&config.wallet.keypair_path)
        .context("Failed to load wallet")?;
    info!("Wallet address: {}", wallet.pubkey());

    let commitment = config.commitment()?;
    let rpc = Arc::new(RpcClient::new_with_timeout_and_commitment(
        config.rpc.endpoint.clone(),
        config.rpc_timeout(),
        commitment,
    ));
    info!("RPC endpoint: {}", config.rpc.endpoint);

    let address_book = config.address_book_path.as_ref().map(AddressBook::new);
    let engine = ReceiptEngine::new(
        rpc,
        wallet,
        config.program_id()?,
        config.priority_fees(),
        config.submit_config()?,
        address_book,
    );

    match args.command {
        Command::Initialize => run_initialize(&engine, &config).await,
        Command::Deposit { mint, amount } => run_deposit(&engine, &mint, amount).await,
    }
}

async fn run_initialize(engine: &ReceiptEngine, config: &Config) -> Result<()> {
    if config.tokens.is_empty() {
        bail!("no tokens configured; add [[tokens]] entries to the config file");
    }

    let outcomes = engine.initialize_all(&config.tokens).await;

    let mut confirmed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(signature) => {
                confirmed += 1;
                info!(token = %outcome.name, %signature, "Initialized");
            }
            Err(e) => {
                error!(token = %outcome.name, category = e.category(), error = %e, "Initialize failed");
                for line in e.logs() {
                    error!(log = %line, "Execution trace");
                }
            }
        }
    }

    info!("Initialized {confirmed}/{} tokens", outcomes.len());
    if confirmed == 0 {
        bail!("no token was initialized successfully");
    }
    Ok(())
}

async fn run_deposit(engine: &ReceiptEngine, mint: &str, amount: u64) -> Result<()> {
    let mint = Pubkey::from_str(mint).with_context(|| format!("invalid mint address: {mint}"))?;

    match engine.deposit(&mint, amount).await {
        Ok(signature) => {
            info!(%signature, "Deposit confirmed");
            Ok(())
        }
        Err(e) => {
            for line in e.logs() {
                error!(log = %line, "Execution trace");
            }
            Err(e.into())
        }
    }
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "receipt_client=debug,info"
    } else {
        "receipt_client=info,warn,error"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
