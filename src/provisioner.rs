//! Associated token account provisioning
//!
//! Program instructions require the caller's token-holding accounts to exist
//! before they execute. This module computes the associated token account
//! (ATA) address for a (holder, mint, token program) triple, probes the
//! ledger for it fresh on every call, and emits a creation instruction only
//! when the probe reports a confirmed absence.
//!
//! A probe that errors is NOT absence: query errors propagate so callers can
//! retry, instead of emitting a creation that may collide with live state.
//! Races with concurrent external creation are tolerated; the transaction
//! simply fails harmlessly if another actor created the account first.

use std::sync::Arc;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{commitment_config::CommitmentConfig, instruction::Instruction, pubkey::Pubkey};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id, instruction::create_associated_token_account,
};
use thiserror::Error;
use tracing::debug;

/// Existence probe outcome for a specific address at query time. Never
/// cached: accounts can be created between queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Present,
    Absent,
}

/// Provisioning failure (transient query errors; callers may retry).
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("existence probe failed for {address}: {message}")]
    Probe { address: Pubkey, message: String },
}

/// An ensured token account: its deterministic address, plus the creation
/// instruction when the account was absent at probe time.
#[derive(Debug, Clone)]
pub struct EnsuredAccount {
    pub address: Pubkey,
    pub create: Option<Instruction>,
}

impl EnsuredAccount {
    pub fn needs_creation(&self) -> bool {
        self.create.is_some()
    }
}

/// Compute the ATA address for a holder/mint pair under a token program.
///
/// This is the non-program-derived deterministic function keyed by
/// holder + mint + token program id; pure, no RPC.
pub fn token_account_address(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, token_program)
}

/// Resolve a probe outcome into an [`EnsuredAccount`].
///
/// Emits exactly one creation instruction when absent, none when present.
pub fn resolve(
    probe: Probe,
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> EnsuredAccount {
    let address = token_account_address(owner, mint, token_program);
    let create = match probe {
        Probe::Present => None,
        Probe::Absent => Some(create_associated_token_account(
            payer,
            owner,
            mint,
            token_program,
        )),
    };
    EnsuredAccount { address, create }
}

/// Ledger-backed provisioner.
pub struct AccountProvisioner {
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl AccountProvisioner {
    pub fn new(rpc: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
        Self { rpc, commitment }
    }

    /// Probe the ledger for an account's existence.
    ///
    /// Tri-state by construction: `Ok(Present)`, `Ok(Absent)` (confirmed
    /// query success with no account data), or `Err` for query errors.
    pub async fn probe(&self, address: &Pubkey) -> Result<Probe, ProvisionError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| ProvisionError::Probe {
                address: *address,
                message: e.to_string(),
            })?;

        Ok(match response.value {
            Some(_) => Probe::Present,
            None => Probe::Absent,
        })
    }

    /// Ensure the holder's ATA for `mint` exists, probing fresh and emitting
    /// a payer-funded creation instruction only when absent.
    pub async fn ensure_token_account(
        &self,
        payer: &Pubkey,
        owner: &Pubkey,
        mint: &Pubkey,
        token_program: &Pubkey,
    ) -> Result<EnsuredAccount, ProvisionError> {
        let address = token_account_address(owner, mint, token_program);
        let probe = self.probe(&address).await?;
        debug!(address = %address, mint = %mint, ?probe, "Token account probed");
        Ok(resolve(probe, payer, owner, mint, token_program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_matches_spl_derivation() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        assert_eq!(
            token_account_address(&owner, &mint, &spl_token::id()),
            get_associated_token_address_with_program_id(&owner, &mint, &spl_token::id()),
        );
    }

    #[test]
    fn test_token_program_changes_address() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let classic = token_account_address(&owner, &mint, &spl_token::id());
        let token_2022 = token_account_address(&owner, &mint, &spl_token_2022::id());
        assert_ne!(classic, token_2022);
    }

    #[test]
    fn test_present_emits_no_creation() {
        let payer = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let ensured = resolve(Probe::Present, &payer, &owner, &mint, &spl_token::id());
        assert!(!ensured.needs_creation());
        assert_eq!(
            ensured.address,
            token_account_address(&owner, &mint, &spl_token::id())
        );
    }

    #[test]
    fn test_absent_emits_exactly_one_creation() {
        let payer = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let ensured = resolve(Probe::Absent, &payer, &owner, &mint, &spl_token::id());
        let create = ensured.create.expect("creation instruction expected");

        assert_eq!(create.program_id, spl_associated_token_account::id());
        // Funder is the payer, and the created account is the derived ATA.
        assert_eq!(create.accounts[0].pubkey, payer);
        assert_eq!(create.accounts[1].pubkey, ensured.address);
    }
}
