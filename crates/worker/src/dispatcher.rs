//! Message-driven job dispatcher.
//!
//! A single long-lived task that consumes inbound request lines from
//! an ordered channel, one at a time, and answers each with zero or
//! more `log` messages followed by exactly one terminal message. A
//! request arriving while a job is running waits in the channel; no
//! job state persists between requests.

use std::sync::Arc;

use msmbench_compute::{BenchmarkModule, Progress};
use msmbench_core::{protocol, BackendKind, OutboundMessage, WorkerError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::relay::ProgressRelay;

/// Per-job dispatcher over a loaded computation module.
pub struct Dispatcher {
    module: Arc<dyn BenchmarkModule>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
}

impl Dispatcher {
    pub fn new(
        module: Arc<dyn BenchmarkModule>,
        outbound: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Self {
        Self { module, outbound }
    }

    /// Run the dispatch loop until the inbound channel closes or the
    /// cancellation token is triggered.
    pub async fn run(self, mut inbound: mpsc::Receiver<String>, cancel: CancellationToken) {
        tracing::info!("Dispatcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Dispatcher shutting down");
                    break;
                }
                line = inbound.recv() => {
                    match line {
                        Some(line) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            let outcome = self.dispatch(&line).await;
                            self.send(outcome);
                        }
                        None => {
                            tracing::info!("Inbound channel closed, dispatcher stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// One dispatch cycle: decode, invoke, wrap. This is the fault
    /// boundary — every failure on the path, including a panicking
    /// backend, comes back as a single terminal `error` message and
    /// never crosses into the loop.
    async fn dispatch(&self, raw: &str) -> OutboundMessage {
        let request = match protocol::parse_request(raw) {
            Ok(request) => request,
            Err(e) => {
                let err = WorkerError::Protocol(format!("{e}, in request: {raw}"));
                tracing::warn!(error = %err, "Rejected inbound request");
                return OutboundMessage::Error {
                    error: err.to_string(),
                };
            }
        };

        let kind = request.kind();
        let size = request.size();
        tracing::info!(backend = %kind, size, "Job dispatched");

        let module = Arc::clone(&self.module);
        let relay: Arc<dyn Progress> = Arc::new(ProgressRelay::new(self.outbound.clone()));
        let job = tokio::spawn(async move {
            match kind {
                BackendKind::Cpu => module.run_cpu_benchmark(size, relay).await,
                BackendKind::Gpu => module.run_gpu_benchmark(size, relay).await,
            }
        });

        match job.await {
            Ok(Ok(result)) => {
                tracing::info!(backend = %kind, size, "Job completed");
                OutboundMessage::result(kind, result)
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = %kind, size, error = %e, "Job failed");
                OutboundMessage::Error {
                    error: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!(backend = %kind, size, error = %e, "Backend task aborted");
                let err = WorkerError::Compute {
                    backend: kind,
                    detail: format!("backend task aborted: {e}"),
                };
                OutboundMessage::Error {
                    error: err.to_string(),
                }
            }
        }
    }

    fn send(&self, message: OutboundMessage) {
        // Ignore the SendError — a closed outbound side means the
        // caller has gone away.
        let _ = self.outbound.send(message);
    }
}
