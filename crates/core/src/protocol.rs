//! Wire protocol between the caller and the benchmark worker.
//!
//! The caller sends JSON messages with the shape
//! `{"type": "<kind>", ...}`. This module deserializes them into a
//! strongly-typed [`JobRequest`] enum and serializes the worker's
//! replies from [`OutboundMessage`]. Unknown `"type"` values fail to
//! parse; the dispatcher answers them with an `error` message instead
//! of dropping them.

use serde::{Deserialize, Serialize};

/// An inbound job request from the caller.
///
/// Deserialized via the internally-tagged `"type"` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum JobRequest {
    /// Run the CPU MSM benchmark with the given number of terms.
    #[serde(rename = "runCPU")]
    RunCpu {
        #[serde(rename = "numberOfMSM")]
        number_of_msm: u64,
    },

    /// Run the GPU MSM benchmark with the given number of terms.
    #[serde(rename = "runGPU")]
    RunGpu {
        #[serde(rename = "numberOfMSM")]
        number_of_msm: u64,
    },
}

impl JobRequest {
    /// The backend this request targets.
    pub fn kind(&self) -> BackendKind {
        match self {
            JobRequest::RunCpu { .. } => BackendKind::Cpu,
            JobRequest::RunGpu { .. } => BackendKind::Gpu,
        }
    }

    /// The requested benchmark size (number of MSM terms).
    pub fn size(&self) -> u64 {
        match self {
            JobRequest::RunCpu { number_of_msm } | JobRequest::RunGpu { number_of_msm } => {
                *number_of_msm
            }
        }
    }
}

/// The two interchangeable computation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Cpu,
    Gpu,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Cpu => write!(f, "cpu"),
            BackendKind::Gpu => write!(f, "gpu"),
        }
    }
}

/// An outbound message from the worker to the caller.
///
/// Per request the worker emits zero or more [`Log`](Self::Log)
/// messages followed by exactly one terminal message
/// ([`CpuResult`](Self::CpuResult), [`GpuResult`](Self::GpuResult), or
/// [`Error`](Self::Error)).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// A progress line emitted while a job is running.
    #[serde(rename = "log")]
    Log { message: String },

    /// Terminal: the CPU benchmark finished.
    #[serde(rename = "CPUResult")]
    CpuResult { result: serde_json::Value },

    /// Terminal: the GPU benchmark finished.
    #[serde(rename = "GPUResult")]
    GpuResult { result: serde_json::Value },

    /// Terminal: the job failed.
    #[serde(rename = "error")]
    Error { error: String },
}

impl OutboundMessage {
    /// Wrap a backend result value in the terminal message for `kind`.
    pub fn result(kind: BackendKind, result: serde_json::Value) -> Self {
        match kind {
            BackendKind::Cpu => OutboundMessage::CpuResult { result },
            BackendKind::Gpu => OutboundMessage::GpuResult { result },
        }
    }

    /// Whether this message ends a job's message sequence.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OutboundMessage::Log { .. })
    }
}

/// Parse an inbound text message into a typed request.
///
/// Returns `Err` for malformed JSON and for unknown `type` values;
/// the dispatcher turns either into a protocol failure outcome.
pub fn parse_request(text: &str) -> Result<JobRequest, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse_run_cpu_request() {
        let json = r#"{"type":"runCPU","numberOfMSM":1024}"#;
        let req = parse_request(json).unwrap();
        assert_eq!(
            req,
            JobRequest::RunCpu {
                number_of_msm: 1024
            }
        );
        assert_eq!(req.kind(), BackendKind::Cpu);
        assert_eq!(req.size(), 1024);
    }

    #[test]
    fn parse_run_gpu_request() {
        let json = r#"{"type":"runGPU","numberOfMSM":0}"#;
        let req = parse_request(json).unwrap();
        assert_eq!(req, JobRequest::RunGpu { number_of_msm: 0 });
        assert_eq!(req.kind(), BackendKind::Gpu);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let json = r#"{"type":"runQuantum","numberOfMSM":8}"#;
        assert_matches!(parse_request(json), Err(_));
    }

    #[test]
    fn negative_size_is_rejected() {
        let json = r#"{"type":"runCPU","numberOfMSM":-1}"#;
        assert_matches!(parse_request(json), Err(_));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert_matches!(parse_request("not json"), Err(_));
    }

    #[test]
    fn log_message_wire_shape() {
        let msg = OutboundMessage::Log {
            message: "sampling".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "log", "message": "sampling"})
        );
        assert!(!msg.is_terminal());
    }

    #[test]
    fn result_message_wire_shape() {
        let msg = OutboundMessage::result(BackendKind::Cpu, serde_json::json!({"size": 4}));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "CPUResult");
        assert_eq!(json["result"]["size"], 4);
        assert!(msg.is_terminal());

        let msg = OutboundMessage::result(BackendKind::Gpu, serde_json::json!(null));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "GPUResult");
        assert!(msg.is_terminal());
    }

    #[test]
    fn error_message_wire_shape() {
        let msg = OutboundMessage::Error {
            error: "GPU device unavailable: no adapter".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert!(json["error"].as_str().unwrap().contains("no adapter"));
        assert!(msg.is_terminal());
    }
}
