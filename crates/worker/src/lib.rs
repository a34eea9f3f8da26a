//! The benchmark worker's dispatch layer.
//!
//! Contains the message-driven dispatcher that decodes inbound
//! requests, invokes the computation module, and emits exactly one
//! terminal message per request, plus the progress relay that streams
//! backend log lines to the caller and the env-based configuration.

pub mod config;
pub mod dispatcher;
pub mod relay;

pub use config::WorkerConfig;
pub use dispatcher::Dispatcher;
pub use relay::ProgressRelay;
