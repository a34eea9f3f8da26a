use msmbench_compute::ModuleConfig;

/// Worker configuration loaded from environment variables.
///
/// All fields have defaults suitable for local use; override via
/// environment variables (or a `.env` file).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of sampled base/scalar pairs (default: `65536`).
    pub table_size: usize,
    /// RNG seed for input sampling; unset samples from OS entropy.
    pub seed: Option<u64>,
    /// CPU progress line interval in terms (default: `100000`).
    pub progress_interval: u64,
    /// Inbound request queue capacity (default: `64`).
    pub inbound_capacity: usize,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default   |
    /// |-------------------------|-----------|
    /// | `MSM_TABLE_SIZE`        | `65536`   |
    /// | `MSM_SEED`              | (unset)   |
    /// | `MSM_PROGRESS_INTERVAL` | `100000`  |
    /// | `MSM_INBOUND_CAPACITY`  | `64`      |
    pub fn from_env() -> Self {
        let table_size: usize = std::env::var("MSM_TABLE_SIZE")
            .unwrap_or_else(|_| "65536".into())
            .parse()
            .expect("MSM_TABLE_SIZE must be a valid usize");

        let seed: Option<u64> = std::env::var("MSM_SEED")
            .ok()
            .map(|s| s.parse().expect("MSM_SEED must be a valid u64"));

        let progress_interval: u64 = std::env::var("MSM_PROGRESS_INTERVAL")
            .unwrap_or_else(|_| "100000".into())
            .parse()
            .expect("MSM_PROGRESS_INTERVAL must be a valid u64");

        let inbound_capacity: usize = std::env::var("MSM_INBOUND_CAPACITY")
            .unwrap_or_else(|_| "64".into())
            .parse()
            .expect("MSM_INBOUND_CAPACITY must be a valid usize");

        Self {
            table_size,
            seed,
            progress_interval,
            inbound_capacity,
        }
    }

    /// The computation module's slice of this configuration.
    pub fn module_config(&self) -> ModuleConfig {
        ModuleConfig {
            table_size: self.table_size,
            seed: self.seed,
            progress_interval: self.progress_interval,
        }
    }
}
