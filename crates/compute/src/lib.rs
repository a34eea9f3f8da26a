//! The MSM benchmark computation module.
//!
//! [`ComputeModule::load`] performs the one-time async initialization
//! (sampling the benchmark input tables) and yields a handle exposing
//! the two backend entry points the dispatcher depends on:
//! [`BenchmarkModule::run_cpu_benchmark`] and
//! [`BenchmarkModule::run_gpu_benchmark`]. The numeric workload behind
//! them is deliberately lightweight: a modular weighted sum with the
//! same shape as a multi-scalar multiplication, enough to exercise
//! both backends and produce comparable digests.

pub mod backend;
pub mod cpu;
pub mod gpu;
pub mod module;
pub mod progress;

pub use backend::{BenchReport, MsmBackend};
pub use module::{BenchmarkModule, ComputeModule, ModuleConfig};
pub use progress::{NullProgress, Progress};
