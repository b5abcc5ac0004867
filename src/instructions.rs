//! Receipt program instruction builders
//!
//! The on-chain program is invoked opaquely: an 8-byte discriminator
//! (`sha256("global:<name>")[..8]`, the Anchor convention) followed by
//! Borsh-encoded positional arguments, over a fixed account order. Account
//! order and mutability here must match the program's account structs
//! exactly or the invocation is rejected.

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
    sysvar::rent,
};
use thiserror::Error;

use crate::pda::ReceiptAddresses;

/// Instruction construction failure.
#[derive(Debug, Error)]
pub enum InstructionBuildError {
    #[error("argument encoding failed: {0}")]
    Encoding(#[from] std::io::Error),

    #[error("token instruction build failed: {0}")]
    Token(#[from] solana_sdk::program_error::ProgramError),
}

/// Compute the 8-byte global instruction discriminator for a method name.
pub fn discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("global:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

#[derive(Debug, Clone, BorshSerialize)]
struct InitializeArgs {
    name: String,
    symbol: String,
    uri: String,
}

#[derive(Debug, Clone, Copy, BorshSerialize)]
struct DepositArgs {
    amount: u64,
}

fn encode(disc: [u8; 8], args: &impl BorshSerialize) -> Result<Vec<u8>, InstructionBuildError> {
    let mut data = disc.to_vec();
    args.serialize(&mut data)?;
    Ok(data)
}

/// Build the `initialize` instruction: creates the state record, both vault
/// token accounts, and the Token-2022 receipt mint with its metadata.
///
/// `token_mint_program` is the token program owning `token_mint` (classic
/// SPL Token or Token-2022); the receipt mint side is always Token-2022.
#[allow(clippy::too_many_arguments)]
pub fn initialize(
    program_id: &Pubkey,
    addresses: &ReceiptAddresses,
    authority: &Pubkey,
    token_mint: &Pubkey,
    token_mint_program: &Pubkey,
    name: &str,
    symbol: &str,
    uri: &str,
) -> Result<Instruction, InstructionBuildError> {
    let data = encode(
        discriminator("initialize"),
        &InitializeArgs {
            name: name.to_string(),
            symbol: symbol.to_string(),
            uri: uri.to_string(),
        },
    )?;

    let accounts = vec![
        AccountMeta::new(*authority, true),
        AccountMeta::new(addresses.state, false),
        AccountMeta::new_readonly(*token_mint, false),
        AccountMeta::new_readonly(addresses.vault_authority, false),
        AccountMeta::new(addresses.token_vault, false),
        AccountMeta::new(addresses.receipt_mint, false),
        AccountMeta::new(addresses.receipt_vault, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(*token_mint_program, false),
        AccountMeta::new_readonly(spl_token_2022::id(), false),
        AccountMeta::new_readonly(rent::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Build the `deposit` instruction: moves `amount` of the underlying token
/// into the vault and mints the same amount of receipt tokens back to the
/// user's receipt token account.
#[allow(clippy::too_many_arguments)]
pub fn deposit(
    program_id: &Pubkey,
    addresses: &ReceiptAddresses,
    user: &Pubkey,
    user_token_account: &Pubkey,
    user_receipt_account: &Pubkey,
    token_mint: &Pubkey,
    token_mint_program: &Pubkey,
    amount: u64,
) -> Result<Instruction, InstructionBuildError> {
    let data = encode(discriminator("deposit"), &DepositArgs { amount })?;

    let accounts = vec![
        AccountMeta::new(*user, true),
        AccountMeta::new(*user_token_account, false),
        AccountMeta::new(*user_receipt_account, false),
        AccountMeta::new(addresses.state, false),
        AccountMeta::new_readonly(*token_mint, false),
        AccountMeta::new_readonly(addresses.vault_authority, false),
        AccountMeta::new(addresses.token_vault, false),
        AccountMeta::new(addresses.receipt_mint, false),
        AccountMeta::new(addresses.receipt_vault, false),
        AccountMeta::new_readonly(*token_mint_program, false),
        AccountMeta::new_readonly(spl_token_2022::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pda::derive_all;

    fn test_addresses() -> (Pubkey, Pubkey, ReceiptAddresses) {
        let program_id = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let addresses = derive_all(&mint, &program_id).unwrap();
        (program_id, mint, addresses)
    }

    #[test]
    fn test_discriminator_is_sha256_prefix() {
        let digest = Sha256::digest(b"global:initialize");
        assert_eq!(discriminator("initialize"), digest[..8]);
        assert_ne!(discriminator("initialize"), discriminator("deposit"));
    }

    #[test]
    fn test_initialize_layout() {
        let (program_id, mint, addresses) = test_addresses();
        let authority = Pubkey::new_unique();

        let ix = initialize(
            &program_id,
            &addresses,
            &authority,
            &mint,
            &spl_token::id(),
            "SOL Crypto Receipt",
            "crSOL",
            "https://example.com/sol.json",
        )
        .unwrap();

        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.accounts.len(), 11);

        // Authority is the only signer and pays for account creation.
        assert_eq!(ix.accounts[0].pubkey, authority);
        assert!(ix.accounts[0].is_signer);
        assert!(ix.accounts[0].is_writable);

        // Created accounts are writable; the mint being wrapped is not.
        assert_eq!(ix.accounts[1].pubkey, addresses.state);
        assert!(ix.accounts[1].is_writable);
        assert_eq!(ix.accounts[2].pubkey, mint);
        assert!(!ix.accounts[2].is_writable);
        assert_eq!(ix.accounts[5].pubkey, addresses.receipt_mint);
        assert!(ix.accounts[5].is_writable);

        // Trailing program/sysvar accounts.
        assert_eq!(ix.accounts[7].pubkey, system_program::id());
        assert_eq!(ix.accounts[8].pubkey, spl_token::id());
        assert_eq!(ix.accounts[9].pubkey, spl_token_2022::id());
        assert_eq!(ix.accounts[10].pubkey, rent::id());

        // Data: discriminator then three Borsh strings (u32 length prefixes).
        assert_eq!(&ix.data[..8], &discriminator("initialize"));
        let name_len = u32::from_le_bytes(ix.data[8..12].try_into().unwrap());
        assert_eq!(name_len as usize, "SOL Crypto Receipt".len());
        assert_eq!(&ix.data[12..12 + name_len as usize], b"SOL Crypto Receipt");
    }

    #[test]
    fn test_deposit_layout() {
        let (program_id, mint, addresses) = test_addresses();
        let user = Pubkey::new_unique();
        let user_token = Pubkey::new_unique();
        let user_receipt = Pubkey::new_unique();

        let ix = deposit(
            &program_id,
            &addresses,
            &user,
            &user_token,
            &user_receipt,
            &mint,
            &spl_token::id(),
            10_000_000,
        )
        .unwrap();

        assert_eq!(ix.accounts.len(), 11);
        assert_eq!(ix.accounts[0].pubkey, user);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[1].pubkey, user_token);
        assert_eq!(ix.accounts[2].pubkey, user_receipt);
        assert_eq!(ix.accounts[3].pubkey, addresses.state);
        assert!(ix.accounts[3].is_writable);
        assert_eq!(ix.accounts[10].pubkey, spl_token_2022::id());

        // Data: discriminator + u64 amount, little-endian.
        assert_eq!(&ix.data[..8], &discriminator("deposit"));
        assert_eq!(&ix.data[8..], &10_000_000u64.to_le_bytes());
        assert_eq!(ix.data.len(), 16);
    }
}
