//! Error taxonomy for the transaction pipeline
//!
//! Every fault is returned as a structured result up to the caller; nothing
//! is silently swallowed. Simulation and submission failures carry the
//! program's numeric fault code (when one exists) and the raw execution
//! trace lines verbatim, so external diagnostic tooling can pattern-match
//! known signatures without this crate interpreting them.

use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::instructions::InstructionBuildError;
use crate::pda::DeriveError;
use crate::provisioner::ProvisionError;

/// Failure of one submission pipeline run.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Address derivation exhausted its search space. Fatal: indicates a
    /// changed program identity, never a transient fault.
    #[error("derivation failed: {0}")]
    Derivation(#[from] DeriveError),

    /// Transient query error while checking account existence.
    #[error("provisioning failed: {0}")]
    Probe(#[from] ProvisionError),

    /// Instruction construction failed before anything was sent.
    #[error("instruction build failed: {0}")]
    Instruction(#[from] InstructionBuildError),

    /// The program rejected the instruction during dry-run. Nothing was
    /// submitted; no funds were at risk.
    #[error("simulation failed (fault code: {code:?})")]
    Simulation {
        code: Option<u32>,
        logs: Vec<String>,
    },

    /// Transport- or node-level rejection during actual submission, after
    /// the alternate-encoding fallback was also attempted.
    #[error("submission failed: {message} (fault code: {code:?})")]
    Submission {
        message: String,
        code: Option<u32>,
        logs: Vec<String>,
    },

    /// Submission succeeded but confirmation was not observed within the
    /// retry budget. Ambiguous: the caller must re-query the signature
    /// before retrying to avoid duplicate submission.
    #[error("confirmation timed out for {signature}")]
    ConfirmationTimeout { signature: Signature },

    /// Failed to fetch a usable recent blockhash.
    #[error("blockhash error: {0}")]
    Blockhash(String),

    /// RPC communication failure outside simulate/submit proper.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Failed to sign or compile the transaction message.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Invalid configuration or inputs.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SubmitError {
    /// Whether retrying the whole pipeline might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Probe(_) => true,
            Self::Blockhash(_) => true,
            Self::Rpc(_) => true,
            Self::Submission { .. } => true,
            // Ambiguous: re-query the signature first, then retry.
            Self::ConfirmationTimeout { .. } => false,
            Self::Derivation(_) => false,
            Self::Instruction(_) => false,
            Self::Simulation { .. } => false,
            Self::Signing(_) => false,
            Self::Configuration(_) => false,
        }
    }

    /// Error category for logging and observability.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Derivation(_) => "derivation",
            Self::Probe(_) => "probe",
            Self::Instruction(_) => "instruction",
            Self::Simulation { .. } => "simulation",
            Self::Submission { .. } => "submission",
            Self::ConfirmationTimeout { .. } => "confirmation",
            Self::Blockhash(_) => "blockhash",
            Self::Rpc(_) => "rpc",
            Self::Signing(_) => "signing",
            Self::Configuration(_) => "config",
        }
    }

    /// Program-defined numeric fault code, when the failure carries one.
    pub fn fault_code(&self) -> Option<u32> {
        match self {
            Self::Simulation { code, .. } | Self::Submission { code, .. } => *code,
            _ => None,
        }
    }

    /// Raw execution trace lines, when the failure carries them.
    pub fn logs(&self) -> &[String] {
        match self {
            Self::Simulation { logs, .. } | Self::Submission { logs, .. } => logs,
            _ => &[],
        }
    }
}
