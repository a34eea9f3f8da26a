use crate::protocol::BackendKind;

/// Structured failure taxonomy for the benchmark worker.
///
/// Every variant carries a human-readable detail; [`kind`](Self::kind)
/// gives callers a stable discriminator to branch on instead of
/// matching message text.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The computation module failed to load. Fatal: the worker must
    /// not accept jobs after this.
    #[error("Startup failure: {0}")]
    Startup(String),

    /// The inbound message was malformed or carried an unrecognized
    /// request type. Reported per job, referencing the offending
    /// request.
    #[error("Unrecognized request: {0}")]
    Protocol(String),

    /// No compatible compute device, or the driver rejected the
    /// device request. Distinct from failures during the computation
    /// itself.
    #[error("GPU device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The backend failed while computing (resource exhaustion,
    /// unsupported size, kernel error).
    #[error("{backend} benchmark failed: {detail}")]
    Compute {
        backend: BackendKind,
        detail: String,
    },
}

impl WorkerError {
    /// Stable discriminator for the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Startup(_) => "startup",
            WorkerError::Protocol(_) => "protocol",
            WorkerError::DeviceUnavailable(_) => "device_unavailable",
            WorkerError::Compute { .. } => "compute",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = WorkerError::DeviceUnavailable("no adapter found".into());
        assert_eq!(err.kind(), "device_unavailable");
        assert!(err.to_string().contains("no adapter found"));
    }

    #[test]
    fn compute_display_names_backend() {
        let err = WorkerError::Compute {
            backend: BackendKind::Gpu,
            detail: "buffer map failed".into(),
        };
        assert_eq!(err.kind(), "compute");
        assert!(err.to_string().starts_with("gpu benchmark failed"));
    }
}
