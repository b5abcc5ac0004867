//! Submission orchestration
//!
//! One pipeline run per transaction:
//!
//! BUILT -> SIMULATED -> SIGNED -> SUBMITTED -> CONFIRMED | FAILED
//!
//! - BUILT -> SIMULATED: sign against a fresh blockhash and dry-run the
//!   transaction. A simulation failure terminates the run before anything
//!   is sent, surfacing the fault code and trace early at no cost.
//! - SIMULATED -> SIGNED: the blockhash may have aged during simulation, so
//!   a new one is fetched and the transaction is re-signed. The signature
//!   that goes out binds to the hash that accompanies it; hashes are
//!   single-use per signature and never reused across sign operations.
//! - SIGNED -> SUBMITTED: send with preflight skipped (a local simulation
//!   already ran) and a bounded node-side re-broadcast count.
//! - SUBMITTED -> CONFIRMED: poll the signature status up to the configured
//!   commitment within a bounded window.
//! - On a submission-layer error the orchestrator makes exactly one
//!   fallback attempt with the v0 encoding and a freshly fetched blockhash;
//!   if both attempts fail, the fallback failure is the one surfaced.

use std::sync::Arc;
use std::time::Duration;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};
use solana_transaction_status::UiTransactionEncoding;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::diagnostics;

use super::encoding::TxEncoding;
use super::errors::SubmitError;
use super::plan::{sanity_check_order, TransactionPlan};

/// Map a dry-run result onto the pipeline outcome.
///
/// A program rejection carries its fault code and the execution trace lines
/// verbatim; the trace is never reformatted or filtered here.
pub fn simulation_outcome(
    err: Option<solana_sdk::transaction::TransactionError>,
    logs: Option<Vec<String>>,
) -> Result<(), SubmitError> {
    if let Some(err) = err {
        let code = diagnostics::custom_fault_code(&err);
        let logs = logs.unwrap_or_default();
        warn!(?code, error = %err, "Simulation rejected transaction");
        return Err(SubmitError::Simulation { code, logs });
    }
    Ok(())
}

/// Tunables for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Target confirmation depth.
    pub commitment: CommitmentConfig,
    /// Node-side automatic re-broadcast attempts per send.
    pub send_retries: usize,
    /// Total confirmation wait budget.
    pub confirm_timeout: Duration,
    /// Delay between confirmation status polls.
    pub confirm_poll_interval: Duration,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            commitment: CommitmentConfig::confirmed(),
            send_retries: 3,
            confirm_timeout: Duration::from_secs(60),
            confirm_poll_interval: Duration::from_millis(500),
        }
    }
}

/// Drives the simulate/sign/submit/confirm protocol for one plan at a time.
///
/// Submissions are strictly sequential per signer: the ledger serializes a
/// signer's transactions, and concurrent in-flight sends from one signer
/// risk invalidating each other's blockhashes.
pub struct SubmissionOrchestrator {
    rpc: Arc<RpcClient>,
    config: SubmitConfig,
}

impl SubmissionOrchestrator {
    pub fn new(rpc: Arc<RpcClient>, config: SubmitConfig) -> Self {
        Self { rpc, config }
    }

    pub fn rpc(&self) -> &Arc<RpcClient> {
        &self.rpc
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.config.commitment
    }

    /// Run the full pipeline for a plan. Returns the confirmed signature or
    /// the most specific failure observed.
    pub async fn submit(
        &self,
        plan: &TransactionPlan,
        signer: &Keypair,
    ) -> Result<Signature, SubmitError> {
        let instructions = plan.instructions();
        sanity_check_order(&instructions)?;

        if plan.fee_payer() != &signer.pubkey() {
            return Err(SubmitError::Configuration(format!(
                "fee payer {} does not match signer {}",
                plan.fee_payer(),
                signer.pubkey()
            )));
        }

        // BUILT -> SIMULATED
        let sim_hash = self.fresh_blockhash().await?;
        let sim_tx =
            TxEncoding::Legacy.build_signed(&instructions, plan.fee_payer(), sim_hash, signer)?;
        self.simulate(&sim_tx).await?;

        // SIMULATED -> SIGNED: re-fetch, re-sign. The hash used for
        // simulation is spent.
        let send_hash = self.fresh_blockhash().await?;
        let tx =
            TxEncoding::Legacy.build_signed(&instructions, plan.fee_payer(), send_hash, signer)?;

        // SIGNED -> SUBMITTED, with the single v0 fallback.
        let signature = match self.send(&tx).await {
            Ok(signature) => signature,
            Err(primary) => {
                warn!(error = %primary, "Legacy submission failed, retrying with v0 encoding");
                self.send_fallback(plan, &instructions, signer, primary)
                    .await?
            }
        };

        // SUBMITTED -> CONFIRMED | FAILED
        self.confirm(signature).await
    }

    async fn fresh_blockhash(&self) -> Result<Hash, SubmitError> {
        let (hash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.config.commitment)
            .await
            .map_err(|e| SubmitError::Blockhash(e.to_string()))?;
        debug!(blockhash = %hash, last_valid_block_height, "Fetched fresh blockhash");
        Ok(hash)
    }

    async fn simulate(&self, tx: &VersionedTransaction) -> Result<(), SubmitError> {
        let response = self
            .rpc
            .simulate_transaction_with_config(
                tx,
                RpcSimulateTransactionConfig {
                    sig_verify: true,
                    commitment: Some(self.config.commitment),
                    ..RpcSimulateTransactionConfig::default()
                },
            )
            .await
            .map_err(|e| SubmitError::Rpc(format!("simulation request failed: {e}")))?;

        let result = response.value;
        simulation_outcome(result.err, result.logs)?;

        if let Some(units) = result.units_consumed {
            debug!(units_consumed = units, "Simulation succeeded");
        }
        Ok(())
    }

    async fn send(&self, tx: &VersionedTransaction) -> Result<Signature, SubmitError> {
        if let Ok(bytes) = bincode::serialize(tx) {
            debug!(serialized_len = bytes.len(), "Sending transaction");
        }

        self.rpc
            .send_transaction_with_config(
                tx,
                RpcSendTransactionConfig {
                    skip_preflight: true,
                    encoding: Some(UiTransactionEncoding::Base64),
                    max_retries: Some(self.config.send_retries),
                    ..RpcSendTransactionConfig::default()
                },
            )
            .await
            .map_err(|e| {
                let code = e
                    .get_transaction_error()
                    .as_ref()
                    .and_then(diagnostics::custom_fault_code);
                SubmitError::Submission {
                    message: e.to_string(),
                    code,
                    logs: vec![],
                }
            })
    }

    /// The one fallback attempt: v0 encoding, freshly fetched blockhash.
    /// If the fallback also fails, its failure is surfaced (it is the more
    /// specific of the two); the primary failure stays in the log.
    async fn send_fallback(
        &self,
        plan: &TransactionPlan,
        instructions: &[solana_sdk::instruction::Instruction],
        signer: &Keypair,
        primary: SubmitError,
    ) -> Result<Signature, SubmitError> {
        let hash = match self.fresh_blockhash().await {
            Ok(hash) => hash,
            // Fallback never got off the ground; the primary failure is the
            // most specific one available.
            Err(e) => {
                warn!(error = %e, "Could not fetch blockhash for v0 fallback");
                return Err(primary);
            }
        };

        let tx = TxEncoding::V0.build_signed(instructions, plan.fee_payer(), hash, signer)?;
        match self.send(&tx).await {
            Ok(signature) => {
                info!(%signature, "v0 fallback submission accepted");
                Ok(signature)
            }
            Err(fallback) => {
                warn!(primary = %primary, fallback = %fallback, "Both encodings rejected");
                Err(fallback)
            }
        }
    }

    async fn confirm(&self, signature: Signature) -> Result<Signature, SubmitError> {
        let deadline = Instant::now() + self.config.confirm_timeout;

        loop {
            let response = self
                .rpc
                .get_signature_statuses(&[signature])
                .await
                .map_err(|e| SubmitError::Rpc(format!("status query failed: {e}")))?;

            if let Some(Some(status)) = response.value.first() {
                if let Some(err) = &status.err {
                    let code = diagnostics::custom_fault_code(err);
                    return Err(SubmitError::Submission {
                        message: format!("transaction failed on-chain: {err}"),
                        code,
                        logs: vec![],
                    });
                }
                if status.satisfies_commitment(self.config.commitment) {
                    info!(%signature, slot = status.slot, "Transaction confirmed");
                    return Ok(signature);
                }
            }

            if Instant::now() >= deadline {
                // Ambiguous: the transaction may still land. Callers must
                // re-query before retrying to avoid duplicate submission.
                warn!(%signature, "Confirmation window exhausted");
                return Err(SubmitError::ConfirmationTimeout { signature });
            }
            sleep(self.config.confirm_poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SubmitConfig::default();
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
        assert!(config.send_retries > 0);
        assert!(config.confirm_timeout > config.confirm_poll_interval);
    }
}
