//! CPU variant of the MSM benchmark.
//!
//! Folds the weighted sum on a blocking thread so the dispatcher's
//! cooperative loop is never starved, reporting progress every
//! `progress_interval` terms.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use msmbench_core::{BackendKind, WorkerError};

use crate::backend::{BenchReport, MsmBackend};
use crate::module::{digest, InputTables, MODULUS};
use crate::progress::Progress;

#[derive(Debug)]
pub struct CpuBackend {
    tables: Arc<InputTables>,
    progress_interval: u64,
}

impl CpuBackend {
    pub fn new(tables: Arc<InputTables>, progress_interval: u64) -> Self {
        Self {
            tables,
            // Interval 0 would divide by zero in the progress check.
            progress_interval: progress_interval.max(1),
        }
    }
}

#[async_trait]
impl MsmBackend for CpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    async fn run(
        &self,
        size: u64,
        progress: Arc<dyn Progress>,
    ) -> Result<serde_json::Value, WorkerError> {
        progress.log(&format!("Starting CPU MSM over {size} terms"));

        let tables = Arc::clone(&self.tables);
        let interval = self.progress_interval;
        let reporter = Arc::clone(&progress);

        let start = Instant::now();
        let total = tokio::task::spawn_blocking(move || {
            let mut acc: u32 = 0;
            for i in 0..size {
                acc = ((acc as u64 + tables.term(i) as u64) % MODULUS as u64) as u32;
                if (i + 1) % interval == 0 {
                    reporter.log(&format!("CPU MSM progress: {} / {size} terms", i + 1));
                }
            }
            acc
        })
        .await
        .map_err(|e| WorkerError::Compute {
            backend: BackendKind::Cpu,
            detail: format!("benchmark thread panicked: {e}"),
        })?;

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        progress.log(&format!("CPU MSM elapsed: {elapsed_ms:.2} ms"));

        Ok(BenchReport {
            backend: BackendKind::Cpu,
            size,
            digest: digest(total),
            elapsed_ms,
        }
        .into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{BenchmarkModule, ComputeModule, ModuleConfig};
    use crate::progress::NullProgress;
    use std::sync::Mutex;

    fn seeded_module_config() -> ModuleConfig {
        ModuleConfig {
            table_size: 256,
            seed: Some(99),
            progress_interval: 100,
        }
    }

    #[tokio::test]
    async fn zero_size_is_a_trivial_success() {
        let module = ComputeModule::load(seeded_module_config()).await.unwrap();
        let value = module
            .run_cpu_benchmark(0, Arc::new(NullProgress))
            .await
            .unwrap();
        assert_eq!(value["size"], 0);
        assert_eq!(value["digest"], "00000000");
    }

    #[tokio::test]
    async fn digest_is_deterministic_for_a_seed() {
        let module = ComputeModule::load(seeded_module_config()).await.unwrap();
        let a = module
            .run_cpu_benchmark(1000, Arc::new(NullProgress))
            .await
            .unwrap();
        let b = module
            .run_cpu_benchmark(1000, Arc::new(NullProgress))
            .await
            .unwrap();
        assert_eq!(a["digest"], b["digest"]);
        assert_eq!(a["backend"], "cpu");
    }

    struct Capture(Mutex<Vec<String>>);

    impl Progress for Capture {
        fn log(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn progress_is_reported_periodically() {
        let module = ComputeModule::load(seeded_module_config()).await.unwrap();
        let capture = Arc::new(Capture(Mutex::new(Vec::new())));
        module
            .run_cpu_benchmark(350, Arc::clone(&capture) as Arc<dyn Progress>)
            .await
            .unwrap();

        let lines = capture.0.lock().unwrap();
        // Start line, three interval lines (100, 200, 300), elapsed line.
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("100 / 350"));
        assert!(lines[3].contains("300 / 350"));
        assert!(lines.last().unwrap().contains("elapsed"));
    }
}
