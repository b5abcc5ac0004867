//! Failure payload inspection
//!
//! Collaborator-facing helpers that extract the program-defined numeric
//! fault code from failure payloads and pattern-match known fault
//! signatures in execution traces. The pipeline itself never interprets
//! fault meanings; it surfaces code and trace verbatim and leaves analysis
//! to this module's callers.

use solana_sdk::{instruction::InstructionError, transaction::TransactionError};

/// Extract the custom fault code from a transaction error, if present.
pub fn custom_fault_code(err: &TransactionError) -> Option<u32> {
    match err {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
        _ => None,
    }
}

/// Scan execution trace lines for a `custom program error: 0x..` marker and
/// parse its code. Returns the first match.
pub fn fault_code_from_logs(logs: &[String]) -> Option<u32> {
    const MARKER: &str = "custom program error: ";

    logs.iter().find_map(|line| {
        let idx = line.find(MARKER)?;
        let tail = &line[idx + MARKER.len()..];
        let token = tail.split_whitespace().next()?;
        let hex = token.strip_prefix("0x")?;
        u32::from_str_radix(hex, 16).ok()
    })
}

/// Render hints for known fault signatures. Unknown codes produce no hint;
/// the raw code and trace are already surfaced by the error itself.
pub fn known_signature_hints(code: Option<u32>, logs: &[String]) -> Vec<String> {
    let mut hints = Vec::new();

    if code == Some(51) {
        hints.push(
            "fault code 51: instruction data too large / memory layout mismatch; \
             usually a program built against an incompatible runtime version"
                .to_string(),
        );
    }

    if logs
        .iter()
        .any(|line| line.contains("data that is too large"))
    {
        hints.push(
            "trace reports oversized instruction data; rebuild the program against \
             the runtime version the cluster is running"
                .to_string(),
        );
    }

    hints
}
