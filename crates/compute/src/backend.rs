//! The polymorphic backend interface and the result value both
//! backends produce.

use std::sync::Arc;

use async_trait::async_trait;
use msmbench_core::{BackendKind, WorkerError};
use serde::Serialize;

use crate::progress::Progress;

/// One interchangeable MSM benchmark strategy.
///
/// Both variants honor the same contract: given a non-negative term
/// count and a progress sink, either return a result value or fail
/// with a single descriptive [`WorkerError`]. A `size` of zero is a
/// trivial empty computation, never an error.
#[async_trait]
pub trait MsmBackend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Run the benchmark with `size` terms.
    async fn run(
        &self,
        size: u64,
        progress: Arc<dyn Progress>,
    ) -> Result<serde_json::Value, WorkerError>;
}

/// The computed benchmark outcome.
///
/// `digest` is a hex digest of the weighted sum; both backends fold
/// the same sampled tables, so for equal sizes their digests agree.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub backend: BackendKind,
    pub size: u64,
    pub digest: String,
    pub elapsed_ms: f64,
}

impl BenchReport {
    /// Serialize into the opaque `result` value carried by the
    /// terminal protocol message.
    pub fn into_value(self) -> serde_json::Value {
        // BenchReport serializes to a plain JSON object; this cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_to_object() {
        let report = BenchReport {
            backend: BackendKind::Cpu,
            size: 16,
            digest: "0000abcd".into(),
            elapsed_ms: 1.5,
        };
        let value = report.into_value();
        assert_eq!(value["backend"], "cpu");
        assert_eq!(value["size"], 16);
        assert_eq!(value["digest"], "0000abcd");
    }
}
