//! Shared types for the MSM benchmark worker: the wire protocol spoken
//! with the caller and the structured error taxonomy. Zero internal
//! dependencies so every other crate can depend on it.

pub mod error;
pub mod protocol;

pub use error::WorkerError;
pub use protocol::{BackendKind, JobRequest, OutboundMessage};
