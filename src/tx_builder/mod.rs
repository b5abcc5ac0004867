//! Transaction building and submission
//!
//! The pipeline is split into focused modules:
//! - **errors**: failure taxonomy with retryability and fault-code access
//! - **plan**: instruction ordering (compute budget -> provisioning -> program)
//! - **encoding**: legacy / v0 wire shapes, one construction function each
//! - **submit**: the simulate -> re-sign -> send -> confirm state machine
//!   with the single v0 fallback

pub mod encoding;
pub mod errors;
pub mod plan;
pub mod submit;

pub use encoding::TxEncoding;
pub use errors::SubmitError;
pub use plan::{PriorityFees, TransactionPlan};
pub use submit::{SubmissionOrchestrator, SubmitConfig};
