//! Transaction plan assembly and ordering validation
//!
//! A plan is the ordered instruction list for one submission:
//! 1. Compute budget directives (CU limit, CU price)
//! 2. Provisioning instructions (missing-account creation)
//! 3. Exactly one program instruction
//!
//! The order is a hard invariant. Compute budget directives are ignored by
//! the ledger unless they come first, and provisioning must precede the
//! program instruction because its accounts must already exist when it
//! executes within the same transaction.
//!
//! Plans are immutable once built; signing produces a new artifact each
//! time (see [`super::encoding`]), so a retried submission never aliases a
//! previously signed transaction.

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction, instruction::Instruction, pubkey::Pubkey,
};

use super::errors::SubmitError;

/// Optional priority directives. Zero means "skip this directive", matching
/// the ledger's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityFees {
    /// Compute unit ceiling (0 = ledger default).
    pub cu_limit: u32,
    /// Price per compute unit in micro-lamports (0 = no priority fee).
    pub cu_price: u64,
}

impl PriorityFees {
    pub fn none() -> Self {
        Self {
            cu_limit: 0,
            cu_price: 0,
        }
    }
}

/// Immutable plan for a single transaction.
#[derive(Debug, Clone)]
pub struct TransactionPlan {
    fee_payer: Pubkey,
    priority: PriorityFees,
    provisioning: Vec<Instruction>,
    program_ix: Instruction,
}

impl TransactionPlan {
    pub fn new(
        fee_payer: Pubkey,
        priority: PriorityFees,
        provisioning: Vec<Instruction>,
        program_ix: Instruction,
    ) -> Self {
        Self {
            fee_payer,
            priority,
            provisioning,
            program_ix,
        }
    }

    pub fn fee_payer(&self) -> &Pubkey {
        &self.fee_payer
    }

    pub fn provisioning_count(&self) -> usize {
        self.provisioning.len()
    }

    /// Compile the ordered instruction list: priority directives, then
    /// provisioning, then the program instruction. Cannot fail for valid
    /// inputs.
    pub fn instructions(&self) -> Vec<Instruction> {
        let mut instructions =
            Vec::with_capacity(2 + self.provisioning.len() + 1);

        if self.priority.cu_limit > 0 {
            instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(
                self.priority.cu_limit,
            ));
        }
        if self.priority.cu_price > 0 {
            instructions.push(ComputeBudgetInstruction::set_compute_unit_price(
                self.priority.cu_price,
            ));
        }

        instructions.extend(self.provisioning.iter().cloned());
        instructions.push(self.program_ix.clone());
        instructions
    }
}

/// Validate instruction ordering (debug/test builds only).
///
/// Checks that all compute budget directives form a prefix of the list and
/// that the final instruction is the program call (i.e. not compute budget
/// and not provisioning).
#[cfg(debug_assertions)]
pub fn sanity_check_order(instructions: &[Instruction]) -> Result<(), SubmitError> {
    if instructions.is_empty() {
        return Err(SubmitError::Configuration(
            "instruction list is empty".to_string(),
        ));
    }

    let is_compute_budget =
        |ix: &Instruction| ix.program_id == solana_sdk::compute_budget::id();

    let prefix_len = instructions
        .iter()
        .take_while(|ix| is_compute_budget(ix))
        .count();

    if let Some(pos) = instructions[prefix_len..]
        .iter()
        .position(|ix| is_compute_budget(ix))
    {
        return Err(SubmitError::Configuration(format!(
            "compute budget instruction at position {} is not part of the leading prefix",
            prefix_len + pos
        )));
    }

    if prefix_len == instructions.len() {
        return Err(SubmitError::Configuration(
            "plan contains only compute budget instructions".to_string(),
        ));
    }

    Ok(())
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_order(_instructions: &[Instruction]) -> Result<(), SubmitError> {
    Ok(())
}
