//! Receipt operation flows
//!
//! Wires the address deriver, account provisioner, composer, and submission
//! orchestrator into the two program operations:
//!
//! - `initialize`: create a token's state record, vaults, and receipt mint.
//!   Runs over an ordered list of token configurations, sequentially, and
//!   keeps going when one token fails (each outcome is reported on its own).
//! - `deposit`: move tokens into the vault and receive receipt tokens,
//!   provisioning the caller's missing token accounts in the same
//!   transaction and wrapping native SOL first when needed.
//!
//! Token configurations are processed strictly in sequence: every
//! transaction draws from the same signer, and the ledger serializes that
//! signer's transactions.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tracing::{info, warn};

use crate::config::TokenEntry;
use crate::diagnostics;
use crate::instructions;
use crate::pda::{self, ReceiptAddresses};
use crate::provisioner::{AccountProvisioner, EnsuredAccount};
use crate::registry::AddressBook;
use crate::structured_logging::PipelineLogger;
use crate::tx_builder::{
    PriorityFees, SubmissionOrchestrator, SubmitConfig, SubmitError, TransactionPlan,
};
use crate::wallet::WalletManager;
use crate::wsol;

/// Outcome of one token's `initialize` run.
pub struct TokenOutcome {
    pub name: String,
    pub mint: Pubkey,
    pub result: Result<Signature, SubmitError>,
}

/// Drives receipt program operations for one signer.
pub struct ReceiptEngine {
    wallet: WalletManager,
    program_id: Pubkey,
    priority: PriorityFees,
    provisioner: AccountProvisioner,
    orchestrator: SubmissionOrchestrator,
    address_book: Option<AddressBook>,
}

impl ReceiptEngine {
    pub fn new(
        rpc: Arc<RpcClient>,
        wallet: WalletManager,
        program_id: Pubkey,
        priority: PriorityFees,
        submit_config: SubmitConfig,
        address_book: Option<AddressBook>,
    ) -> Self {
        let provisioner = AccountProvisioner::new(Arc::clone(&rpc), submit_config.commitment);
        let orchestrator = SubmissionOrchestrator::new(rpc, submit_config);
        Self {
            wallet,
            program_id,
            priority,
            provisioner,
            orchestrator,
            address_book,
        }
    }

    /// Initialize the receipt state for one token mint.
    pub async fn initialize_token(
        &self,
        token_mint: &Pubkey,
        name: &str,
        symbol: &str,
        uri: &str,
    ) -> Result<Signature, SubmitError> {
        let logger = PipelineLogger::new("initialize");
        let started = Instant::now();
        let authority = self.wallet.pubkey();

        let addresses = pda::derive_all(token_mint, &self.program_id)?;

        // The authority needs its own token account for the mint before the
        // receipt can be used; provision it in the same transaction.
        let ensured = self
            .provisioner
            .ensure_token_account(&authority, &authority, token_mint, &spl_token::id())
            .await?;
        logger.log_provisioning(&ensured.address.to_string(), ensured.needs_creation());

        let plan = initialize_plan(
            &self.program_id,
            &addresses,
            &authority,
            token_mint,
            ensured,
            self.priority,
            name,
            symbol,
            uri,
        )?;

        logger.log_attempt(&token_mint.to_string());
        let result = self.orchestrator.submit(&plan, self.wallet.keypair()).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(signature) => {
                logger.log_success(&token_mint.to_string(), &signature.to_string(), latency_ms);
                self.record_addresses(symbol, token_mint, &addresses);
            }
            Err(e) => {
                logger.log_failure(&token_mint.to_string(), e.category(), &e.to_string(), latency_ms);
                for hint in diagnostics::known_signature_hints(e.fault_code(), e.logs()) {
                    warn!(%hint, "Known fault signature");
                }
            }
        }
        result
    }

    /// Initialize every configured token in order, continuing past
    /// per-token failures.
    pub async fn initialize_all(&self, tokens: &[TokenEntry]) -> Vec<TokenOutcome> {
        let mut outcomes = Vec::with_capacity(tokens.len());

        for entry in tokens {
            let mint = match Pubkey::from_str(&entry.mint) {
                Ok(mint) => mint,
                Err(e) => {
                    warn!(mint = %entry.mint, error = %e, "Skipping token with invalid mint");
                    outcomes.push(TokenOutcome {
                        name: entry.name.clone(),
                        mint: Pubkey::default(),
                        result: Err(SubmitError::Configuration(format!(
                            "invalid mint {}: {e}",
                            entry.mint
                        ))),
                    });
                    continue;
                }
            };

            let result = self
                .initialize_token(&mint, &entry.name, &entry.symbol, &entry.uri)
                .await;
            if let Err(e) = &result {
                warn!(token = %entry.name, error = %e, "Initialize failed, continuing with next token");
            }
            outcomes.push(TokenOutcome {
                name: entry.name.clone(),
                mint,
                result,
            });
        }

        outcomes
    }

    /// Deposit `amount` of the underlying token, receiving receipt tokens.
    pub async fn deposit(&self, token_mint: &Pubkey, amount: u64) -> Result<Signature, SubmitError> {
        let logger = PipelineLogger::new("deposit");
        let started = Instant::now();
        let user = self.wallet.pubkey();

        let addresses = pda::derive_all(token_mint, &self.program_id)?;

        // Native SOL has to be wrapped into the user's wSOL account before
        // the program can pull it; that is its own transaction.
        if wsol::is_native_mint(token_mint) {
            wsol::wrap(
                &self.provisioner,
                &self.orchestrator,
                self.wallet.keypair(),
                self.priority,
                amount,
            )
            .await?;
        }

        let user_token = self
            .provisioner
            .ensure_token_account(&user, &user, token_mint, &spl_token::id())
            .await?;
        logger.log_provisioning(&user_token.address.to_string(), user_token.needs_creation());

        let user_receipt = self
            .provisioner
            .ensure_token_account(&user, &user, &addresses.receipt_mint, &spl_token_2022::id())
            .await?;
        logger.log_provisioning(&user_receipt.address.to_string(), user_receipt.needs_creation());

        let plan = deposit_plan(
            &self.program_id,
            &addresses,
            &user,
            token_mint,
            user_token,
            user_receipt,
            self.priority,
            amount,
        )?;

        logger.log_attempt(&token_mint.to_string());
        let result = self.orchestrator.submit(&plan, self.wallet.keypair()).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(signature) => {
                logger.log_success(&token_mint.to_string(), &signature.to_string(), latency_ms)
            }
            Err(e) => {
                logger.log_failure(&token_mint.to_string(), e.category(), &e.to_string(), latency_ms)
            }
        }
        result
    }

    /// Record the token's addresses in the persisted address book, keyed by
    /// the receipt symbol (e.g. "crSOL" -> "sol...").
    fn record_addresses(&self, symbol: &str, token_mint: &Pubkey, addresses: &ReceiptAddresses) {
        let Some(book) = &self.address_book else {
            return;
        };
        let base = book_key_base(symbol);
        let entries = [
            (format!("{base}MintAddress"), token_mint.to_string()),
            (
                format!("{base}ReceiptMintAddress"),
                addresses.receipt_mint.to_string(),
            ),
        ];
        for (key, value) in entries {
            if let Err(e) = book.update(&key, &value) {
                warn!(key = %key, error = %e, "Failed to update address book");
            } else {
                info!(key = %key, value = %value, "Recorded address");
            }
        }
    }
}

/// Address book key stem for a receipt symbol: "crSOL" -> "sol".
fn book_key_base(symbol: &str) -> String {
    symbol.strip_prefix("cr").unwrap_or(symbol).to_lowercase()
}

/// Compose the `initialize` transaction plan.
#[allow(clippy::too_many_arguments)]
fn initialize_plan(
    program_id: &Pubkey,
    addresses: &ReceiptAddresses,
    authority: &Pubkey,
    token_mint: &Pubkey,
    authority_token: EnsuredAccount,
    priority: PriorityFees,
    name: &str,
    symbol: &str,
    uri: &str,
) -> Result<TransactionPlan, SubmitError> {
    let ix = instructions::initialize(
        program_id,
        addresses,
        authority,
        token_mint,
        &spl_token::id(),
        name,
        symbol,
        uri,
    )?;

    let provisioning: Vec<_> = authority_token.create.into_iter().collect();
    Ok(TransactionPlan::new(*authority, priority, provisioning, ix))
}

/// Compose the `deposit` transaction plan. Provisioning order matches probe
/// order: the token account first, then the receipt account.
#[allow(clippy::too_many_arguments)]
fn deposit_plan(
    program_id: &Pubkey,
    addresses: &ReceiptAddresses,
    user: &Pubkey,
    token_mint: &Pubkey,
    user_token: EnsuredAccount,
    user_receipt: EnsuredAccount,
    priority: PriorityFees,
    amount: u64,
) -> Result<TransactionPlan, SubmitError> {
    let ix = instructions::deposit(
        program_id,
        addresses,
        user,
        &user_token.address,
        &user_receipt.address,
        token_mint,
        &spl_token::id(),
        amount,
    )?;

    let provisioning: Vec<_> = user_token
        .create
        .into_iter()
        .chain(user_receipt.create)
        .collect();
    Ok(TransactionPlan::new(*user, priority, provisioning, ix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioner::{resolve, Probe};
    use solana_sdk::compute_budget;

    fn fixtures() -> (Pubkey, Pubkey, Pubkey, ReceiptAddresses) {
        let program_id = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let addresses = pda::derive_all(&mint, &program_id).unwrap();
        (program_id, mint, user, addresses)
    }

    #[test]
    fn test_book_key_base() {
        assert_eq!(book_key_base("crSOL"), "sol");
        assert_eq!(book_key_base("crUSDC"), "usdc");
        assert_eq!(book_key_base("PLAIN"), "plain");
    }

    #[test]
    fn test_deposit_plan_with_both_accounts_missing() {
        // A caller lacking both token accounts gets exactly two
        // provisioning instructions ahead of the deposit instruction.
        let (program_id, mint, user, addresses) = fixtures();
        let user_token = resolve(Probe::Absent, &user, &user, &mint, &spl_token::id());
        let user_receipt = resolve(
            Probe::Absent,
            &user,
            &user,
            &addresses.receipt_mint,
            &spl_token_2022::id(),
        );

        let plan = deposit_plan(
            &program_id,
            &addresses,
            &user,
            &mint,
            user_token,
            user_receipt,
            PriorityFees {
                cu_limit: 100_000,
                cu_price: 30,
            },
            10_000_000,
        )
        .unwrap();

        assert_eq!(plan.provisioning_count(), 2);

        let instructions = plan.instructions();
        assert_eq!(instructions.len(), 5);
        assert_eq!(instructions[0].program_id, compute_budget::id());
        assert_eq!(instructions[1].program_id, compute_budget::id());
        assert_eq!(instructions[2].program_id, spl_associated_token_account::id());
        assert_eq!(instructions[3].program_id, spl_associated_token_account::id());
        assert_eq!(instructions[4].program_id, program_id);
    }

    #[test]
    fn test_deposit_plan_with_accounts_present() {
        let (program_id, mint, user, addresses) = fixtures();
        let user_token = resolve(Probe::Present, &user, &user, &mint, &spl_token::id());
        let user_receipt = resolve(
            Probe::Present,
            &user,
            &user,
            &addresses.receipt_mint,
            &spl_token_2022::id(),
        );

        let plan = deposit_plan(
            &program_id,
            &addresses,
            &user,
            &mint,
            user_token,
            user_receipt,
            PriorityFees::none(),
            1,
        )
        .unwrap();

        assert_eq!(plan.provisioning_count(), 0);
        let instructions = plan.instructions();
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].program_id, program_id);
    }

    #[test]
    fn test_initialize_plan_shape() {
        let (program_id, mint, authority, addresses) = fixtures();
        let authority_token = resolve(Probe::Absent, &authority, &authority, &mint, &spl_token::id());

        let plan = initialize_plan(
            &program_id,
            &addresses,
            &authority,
            &mint,
            authority_token,
            PriorityFees {
                cu_limit: 100_000,
                cu_price: 30,
            },
            "SOL Crypto Receipt",
            "crSOL",
            "https://example.com/sol.json",
        )
        .unwrap();

        let instructions = plan.instructions();
        assert_eq!(instructions.len(), 4);
        // Program instruction is last; its first account is the authority.
        let program_ix = instructions.last().unwrap();
        assert_eq!(program_ix.program_id, program_id);
        assert_eq!(program_ix.accounts[0].pubkey, authority);
    }
}
