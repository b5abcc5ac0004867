//! Program-derived address computation
//!
//! Every account the receipt program touches is derived from a fixed seed
//! chain rooted at the token mint. The chain must be reproduced byte-for-byte
//! or the program rejects the accounts as mismatched:
//!
//! 1. state record      <- ["receipt_state", token_mint]
//! 2. vault authority   <- ["receipt_vault_authority", state]
//! 3. token vault       <- ["receipt_mint_vault", state, token_mint]
//! 4. receipt mint      <- ["receipt_mint", state]
//! 5. receipt vault     <- ["receipt_mint_vault", state, receipt_mint]
//!
//! Derivation is pure: no RPC, no global state. Addresses are recomputed on
//! demand and never treated as ground truth (the ledger is).

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Seed tag for the per-token state record.
pub const STATE_SEED: &[u8] = b"receipt_state";

/// Seed tag for the vault/mint authority.
pub const VAULT_AUTHORITY_SEED: &[u8] = b"receipt_vault_authority";

/// Seed tag for the receipt mint.
pub const MINT_SEED: &[u8] = b"receipt_mint";

/// Seed tag for both vault token accounts (token vault and receipt vault).
pub const MINT_VAULT_SEED: &[u8] = b"receipt_mint_vault";

/// Address derivation failure.
///
/// `try_find_program_address` exhausting its bump search space is
/// astronomically rare and indicates a changed program identity, not a
/// transient fault. Callers must treat this as fatal and never retry.
#[derive(Debug, Clone, Error)]
pub enum DeriveError {
    #[error("no valid bump found for seed tag '{seed_tag}' under program {program_id}")]
    SearchExhausted {
        seed_tag: &'static str,
        program_id: Pubkey,
    },
}

fn find(
    seeds: &[&[u8]],
    seed_tag: &'static str,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), DeriveError> {
    Pubkey::try_find_program_address(seeds, program_id).ok_or(DeriveError::SearchExhausted {
        seed_tag,
        program_id: *program_id,
    })
}

/// Derive the state record address for a token mint.
pub fn receipt_state_address(
    token_mint: &Pubkey,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), DeriveError> {
    find(
        &[STATE_SEED, token_mint.as_ref()],
        "receipt_state",
        program_id,
    )
}

/// Derive the vault authority address for a state record.
pub fn vault_authority_address(
    receipt_state: &Pubkey,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), DeriveError> {
    find(
        &[VAULT_AUTHORITY_SEED, receipt_state.as_ref()],
        "receipt_vault_authority",
        program_id,
    )
}

/// Derive the receipt mint address for a state record.
pub fn receipt_mint_address(
    receipt_state: &Pubkey,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), DeriveError> {
    find(
        &[MINT_SEED, receipt_state.as_ref()],
        "receipt_mint",
        program_id,
    )
}

/// Derive a vault token account address for a (state record, mint) pair.
///
/// Used twice per token: once with the token mint (token vault) and once
/// with the derived receipt mint (receipt vault).
pub fn mint_vault_address(
    receipt_state: &Pubkey,
    mint: &Pubkey,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), DeriveError> {
    find(
        &[MINT_VAULT_SEED, receipt_state.as_ref(), mint.as_ref()],
        "receipt_mint_vault",
        program_id,
    )
}

/// The full address set the receipt program requires for one token mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptAddresses {
    pub state: Pubkey,
    pub state_bump: u8,
    pub vault_authority: Pubkey,
    pub vault_authority_bump: u8,
    pub token_vault: Pubkey,
    pub token_vault_bump: u8,
    pub receipt_mint: Pubkey,
    pub receipt_mint_bump: u8,
    pub receipt_vault: Pubkey,
    pub receipt_vault_bump: u8,
}

/// Derive all five addresses for a token mint in fixed dependency order.
///
/// Deterministic and side-effect-free: repeated calls with the same inputs
/// yield identical sets.
pub fn derive_all(token_mint: &Pubkey, program_id: &Pubkey) -> Result<ReceiptAddresses, DeriveError> {
    let (state, state_bump) = receipt_state_address(token_mint, program_id)?;
    let (vault_authority, vault_authority_bump) = vault_authority_address(&state, program_id)?;
    let (token_vault, token_vault_bump) = mint_vault_address(&state, token_mint, program_id)?;
    let (receipt_mint, receipt_mint_bump) = receipt_mint_address(&state, program_id)?;
    let (receipt_vault, receipt_vault_bump) =
        mint_vault_address(&state, &receipt_mint, program_id)?;

    Ok(ReceiptAddresses {
        state,
        state_bump,
        vault_authority,
        vault_authority_bump,
        token_vault,
        token_vault_bump,
        receipt_mint,
        receipt_mint_bump,
        receipt_vault,
        receipt_vault_bump,
    })
}
