//! One-time loading of the computation module.
//!
//! [`ComputeModule::load`] samples the benchmark input tables exactly
//! once at process start, before the dispatcher accepts its first
//! message. Sampling is hoisted out of the per-job path so each job
//! measures only the weighted-sum computation itself.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use msmbench_core::{BackendKind, WorkerError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::backend::MsmBackend;
use crate::cpu::CpuBackend;
use crate::gpu::GpuBackend;
use crate::progress::Progress;

/// Prime modulus of the benchmark field. The largest 16-bit prime, so
/// a product of two residues fits in a `u32` on both backends.
pub const MODULUS: u32 = 65521;

/// Format a folded sum as the digest carried in the result value.
pub fn digest(total: u32) -> String {
    format!("{total:08x}")
}

/// Configuration for [`ComputeModule::load`].
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    /// Number of sampled base/scalar pairs. Jobs larger than the
    /// table wrap around it.
    pub table_size: usize,
    /// RNG seed for input sampling. `None` samples from OS entropy;
    /// a fixed seed makes runs reproducible.
    pub seed: Option<u64>,
    /// CPU backend: emit a progress line every this many terms.
    pub progress_interval: u64,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            table_size: 65_536,
            seed: None,
            progress_interval: 100_000,
        }
    }
}

/// The sampled benchmark inputs, shared by both backends.
#[derive(Debug)]
pub struct InputTables {
    pub bases: Vec<u32>,
    pub scalars: Vec<u32>,
}

impl InputTables {
    fn sample(size: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let bases = (0..size).map(|_| rng.random_range(0..MODULUS)).collect();
        let scalars = (0..size).map(|_| rng.random_range(0..MODULUS)).collect();
        Self { bases, scalars }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// The `i`-th term of the weighted sum, wrapping around the table.
    pub fn term(&self, i: u64) -> u32 {
        let j = (i % self.len() as u64) as usize;
        ((self.bases[j] as u64 * self.scalars[j] as u64) % MODULUS as u64) as u32
    }
}

/// The two backend entry points the dispatcher depends on.
///
/// This is the entire collaborator contract of the computation
/// module; the dispatch layer calls nothing else on it.
#[async_trait]
pub trait BenchmarkModule: Send + Sync {
    async fn run_cpu_benchmark(
        &self,
        size: u64,
        progress: Arc<dyn Progress>,
    ) -> Result<serde_json::Value, WorkerError>;

    async fn run_gpu_benchmark(
        &self,
        size: u64,
        progress: Arc<dyn Progress>,
    ) -> Result<serde_json::Value, WorkerError>;
}

/// The loaded computation module: sampled input tables plus one
/// backend per [`BackendKind`].
#[derive(Debug)]
pub struct ComputeModule {
    cpu: CpuBackend,
    gpu: GpuBackend,
}

impl ComputeModule {
    /// Load the module: sample the input tables and build the
    /// backends. Runs once at startup; a failure here is fatal and
    /// must prevent job acceptance.
    pub async fn load(config: ModuleConfig) -> Result<Self, WorkerError> {
        if config.table_size == 0 {
            return Err(WorkerError::Startup(
                "input table size must be non-zero".into(),
            ));
        }

        let start = Instant::now();
        let ModuleConfig {
            table_size,
            seed,
            progress_interval,
        } = config;

        let tables = tokio::task::spawn_blocking(move || InputTables::sample(table_size, seed))
            .await
            .map_err(|e| WorkerError::Startup(format!("input sampling panicked: {e}")))?;
        let tables = Arc::new(tables);

        tracing::info!(
            table_size = tables.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Computation module loaded",
        );

        Ok(Self {
            cpu: CpuBackend::new(Arc::clone(&tables), progress_interval),
            gpu: GpuBackend::new(tables),
        })
    }

    /// Select the backend for a request kind.
    pub fn backend(&self, kind: BackendKind) -> &dyn MsmBackend {
        match kind {
            BackendKind::Cpu => &self.cpu,
            BackendKind::Gpu => &self.gpu,
        }
    }
}

#[async_trait]
impl BenchmarkModule for ComputeModule {
    async fn run_cpu_benchmark(
        &self,
        size: u64,
        progress: Arc<dyn Progress>,
    ) -> Result<serde_json::Value, WorkerError> {
        self.backend(BackendKind::Cpu).run(size, progress).await
    }

    async fn run_gpu_benchmark(
        &self,
        size: u64,
        progress: Arc<dyn Progress>,
    ) -> Result<serde_json::Value, WorkerError> {
        self.backend(BackendKind::Gpu).run(size, progress).await
    }
}
