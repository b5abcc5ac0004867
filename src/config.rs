//! Configuration loading
//!
//! All configuration comes from a TOML file with per-field defaults,
//! plus a small set of environment overrides loaded through dotenvy.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::str::FromStr;
use std::time::Duration;

use crate::tx_builder::{PriorityFees, SubmitConfig};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint configuration
    pub rpc: RpcSettings,

    /// Wallet configuration
    pub wallet: WalletSettings,

    /// Receipt program configuration
    #[serde(default)]
    pub program: ProgramSettings,

    /// Priority fee directives applied to every transaction
    #[serde(default)]
    pub priority: PrioritySettings,

    /// Token configurations processed by `initialize`
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,

    /// Path of the persisted address book (optional)
    #[serde(default)]
    pub address_book_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    /// RPC endpoint URL
    pub endpoint: String,

    /// Target commitment: processed | confirmed | finalized
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Node-side re-broadcast attempts per send
    #[serde(default = "default_send_retries")]
    pub send_retries: usize,

    /// Confirmation wait budget in seconds
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,

    /// Delay between confirmation polls in milliseconds
    #[serde(default = "default_confirm_poll")]
    pub confirm_poll_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSettings {
    /// Path to keypair file
    pub keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramSettings {
    /// Receipt program id
    #[serde(default = "default_program_id")]
    pub program_id: String,
}

impl Default for ProgramSettings {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrioritySettings {
    /// Compute unit ceiling (0 = ledger default)
    #[serde(default = "default_cu_limit")]
    pub compute_unit_limit: u32,

    /// Compute unit price in micro-lamports (0 = no priority fee)
    #[serde(default = "default_cu_price")]
    pub compute_unit_price: u64,
}

impl Default for PrioritySettings {
    fn default() -> Self {
        Self {
            compute_unit_limit: default_cu_limit(),
            compute_unit_price: default_cu_price(),
        }
    }
}

/// One token to initialize a receipt for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Underlying token mint address
    pub mint: String,

    /// Receipt token name, e.g. "SOL Crypto Receipt"
    pub name: String,

    /// Receipt token symbol, e.g. "crSOL"
    pub symbol: String,

    /// Metadata URI
    pub uri: String,
}

// Default value functions
fn default_commitment() -> String {
    "confirmed".to_string()
}
fn default_rpc_timeout() -> u64 {
    30
}
fn default_send_retries() -> usize {
    3
}
fn default_confirm_timeout() -> u64 {
    60
}
fn default_confirm_poll() -> u64 {
    500
}
fn default_program_id() -> String {
    "ReMoLWd9XjJQTuSoT9tuKtfbjGy8FtVXX3dqgBHg1gy".to_string()
}
fn default_cu_limit() -> u32 {
    100_000
}
fn default_cu_price() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// `RPC_ENDPOINT` overrides `rpc.endpoint`; `KEYPAIR_PATH` overrides
    /// `wallet.keypair_path`.
    pub fn from_file_with_env(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        if let Ok(endpoint) = std::env::var("RPC_ENDPOINT") {
            config.rpc.endpoint = endpoint;
        }
        if let Ok(keypair_path) = std::env::var("KEYPAIR_PATH") {
            config.wallet.keypair_path = keypair_path;
        }
        Ok(config)
    }

    /// Parse the configured commitment level.
    pub fn commitment(&self) -> Result<CommitmentConfig> {
        match self.rpc.commitment.as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => bail!("unknown commitment level: {other}"),
        }
    }

    /// Parse the configured program id.
    pub fn program_id(&self) -> Result<Pubkey> {
        Pubkey::from_str(&self.program.program_id)
            .with_context(|| format!("invalid program id: {}", self.program.program_id))
    }

    pub fn priority_fees(&self) -> PriorityFees {
        PriorityFees {
            cu_limit: self.priority.compute_unit_limit,
            cu_price: self.priority.compute_unit_price,
        }
    }

    pub fn submit_config(&self) -> Result<SubmitConfig> {
        Ok(SubmitConfig {
            commitment: self.commitment()?,
            send_retries: self.rpc.send_retries,
            confirm_timeout: Duration::from_secs(self.rpc.confirm_timeout_secs),
            confirm_poll_interval: Duration::from_millis(self.rpc.confirm_poll_ms),
        })
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.timeout_secs)
    }
}
