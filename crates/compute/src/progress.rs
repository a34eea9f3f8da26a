//! Progress reporting seam between the backends and the caller.
//!
//! Backends emit human-readable progress lines through a [`Progress`]
//! sink while a job runs. Delivery is best-effort: implementations
//! must never fail or block the backend.

/// A sink for backend progress lines.
pub trait Progress: Send + Sync {
    /// Report one progress line. Must not panic; delivery failures
    /// are the implementation's problem, never the backend's.
    fn log(&self, message: &str);
}

/// Discards every progress line. Useful for tests and direct
/// invocations that do not care about intermediate output.
pub struct NullProgress;

impl Progress for NullProgress {
    fn log(&self, _message: &str) {}
}
