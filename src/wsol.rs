//! Native SOL wrapping
//!
//! Depositing the native mint requires the lamports to sit in a wSOL token
//! account first. Wrapping is its own submitted transaction ahead of the
//! deposit: ensure the wSOL ATA exists, transfer the lamports in, then sync
//! the native balance.

use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, signature::Keypair, signer::Signer,
    system_instruction,
};
use tracing::info;

use crate::instructions::InstructionBuildError;
use crate::provisioner::AccountProvisioner;
use crate::tx_builder::{PriorityFees, SubmissionOrchestrator, SubmitError, TransactionPlan};

/// The native SOL mint.
pub fn native_mint() -> Pubkey {
    spl_token::native_mint::id()
}

pub fn is_native_mint(mint: &Pubkey) -> bool {
    *mint == native_mint()
}

/// Build the wrap plan: (optional ATA creation, lamport transfer) as setup,
/// then the native sync as the closing instruction.
pub fn wrap_plan(
    payer: &Pubkey,
    ata_address: &Pubkey,
    ata_create: Option<Instruction>,
    lamports: u64,
    priority: PriorityFees,
) -> Result<TransactionPlan, InstructionBuildError> {
    let mut setup = Vec::with_capacity(2);
    setup.extend(ata_create);
    setup.push(system_instruction::transfer(payer, ata_address, lamports));

    let sync = spl_token::instruction::sync_native(&spl_token::id(), ata_address)?;
    Ok(TransactionPlan::new(*payer, priority, setup, sync))
}

/// Wrap `lamports` of native SOL into the payer's wSOL ATA and return the
/// ATA address.
pub async fn wrap(
    provisioner: &AccountProvisioner,
    orchestrator: &SubmissionOrchestrator,
    signer: &Keypair,
    priority: PriorityFees,
    lamports: u64,
) -> Result<Pubkey, SubmitError> {
    let payer = signer.pubkey();
    let ensured = provisioner
        .ensure_token_account(&payer, &payer, &native_mint(), &spl_token::id())
        .await?;

    let plan = wrap_plan(&payer, &ensured.address, ensured.create, lamports, priority)?;
    let signature = orchestrator.submit(&plan, signer).await?;
    info!(ata = %ensured.address, lamports, %signature, "Wrapped native SOL");

    Ok(ensured.address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::system_program;

    #[test]
    fn test_wrap_plan_with_creation() {
        let payer = Pubkey::new_unique();
        let ata = crate::provisioner::token_account_address(&payer, &native_mint(), &spl_token::id());
        let create = spl_associated_token_account::instruction::create_associated_token_account(
            &payer,
            &payer,
            &native_mint(),
            &spl_token::id(),
        );

        let plan = wrap_plan(&payer, &ata, Some(create), 10_000_000, PriorityFees::none()).unwrap();
        let instructions = plan.instructions();

        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].program_id, spl_associated_token_account::id());
        assert_eq!(instructions[1].program_id, system_program::id());
        assert_eq!(instructions[2].program_id, spl_token::id());
    }

    #[test]
    fn test_wrap_plan_without_creation() {
        let payer = Pubkey::new_unique();
        let ata = crate::provisioner::token_account_address(&payer, &native_mint(), &spl_token::id());

        let plan = wrap_plan(&payer, &ata, None, 5_000, PriorityFees::none()).unwrap();
        let instructions = plan.instructions();

        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].program_id, system_program::id());
        assert_eq!(instructions[1].program_id, spl_token::id());
    }

    #[test]
    fn test_native_mint_detection() {
        assert!(is_native_mint(&native_mint()));
        assert!(!is_native_mint(&Pubkey::new_unique()));
    }
}
