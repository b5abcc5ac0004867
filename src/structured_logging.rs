//! Structured logging and pipeline context

use uuid::Uuid;

/// Structured logger for pipeline events, correlated per operation.
#[derive(Debug, Clone)]
pub struct PipelineLogger {
    correlation_id: String,
    operation: &'static str,
}

impl PipelineLogger {
    /// Create a logger for one named operation with a fresh correlation id.
    pub fn new(operation: &'static str) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            operation,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn log_attempt(&self, mint: &str) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            operation = %self.operation,
            mint = %mint,
            "Submitting transaction"
        );
    }

    pub fn log_provisioning(&self, address: &str, created: bool) {
        tracing::debug!(
            correlation_id = %self.correlation_id,
            operation = %self.operation,
            address = %address,
            created = %created,
            "Token account provisioning"
        );
    }

    pub fn log_success(&self, mint: &str, signature: &str, latency_ms: u64) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            operation = %self.operation,
            mint = %mint,
            signature = %signature,
            latency_ms = %latency_ms,
            "Transaction confirmed"
        );
    }

    pub fn log_failure(&self, mint: &str, category: &str, error: &str, latency_ms: u64) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            operation = %self.operation,
            mint = %mint,
            category = %category,
            error = %error,
            latency_ms = %latency_ms,
            "Transaction failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique() {
        let a = PipelineLogger::new("initialize");
        let b = PipelineLogger::new("initialize");
        assert_ne!(a.correlation_id(), b.correlation_id());
    }
}
