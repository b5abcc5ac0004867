//! Receipt program client library
//!
//! Derives the program's account addresses, provisions missing token
//! accounts, composes transactions, and drives the simulate/sign/submit
//! pipeline against a Solana RPC endpoint.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod instructions;
pub mod pda;
pub mod provisioner;
pub mod registry;
pub mod structured_logging;
pub mod tx_builder;
pub mod wallet;
pub mod wsol;

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
