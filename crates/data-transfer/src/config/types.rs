//! Settings type definitions with auto-tuning based on system resources.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use sysinfo::System;
use tracing::info;

/// System resource information for auto-tuning.
#[derive(Debug, Clone)]
pub struct SystemResources {
    /// Total RAM in GB.
    pub total_memory_gb: f64,
    /// Number of CPU cores.
    pub cpu_cores: usize,
}

impl SystemResources {
    /// Detect system resources.
    pub fn detect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let total_memory_gb = sys.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
        let cpu_cores = sys.cpus().len().max(1);

        Self {
            total_memory_gb,
            cpu_cores,
        }
    }

    /// Log detected system resources.
    pub fn log(&self) {
        info!(
            "System resources: {:.1} GB RAM, {} CPU cores",
            self.total_memory_gb, self.cpu_cores
        );
    }
}

/// Settings shared by every pipe of one transfer run.
///
/// Performance fields use `Option<T>` to distinguish "not set" (use the
/// auto-tuned default) from "explicitly set".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Human readable task name, used in logs and the run summary.
    #[serde(default = "default_task_name")]
    pub task_name: String,

    /// Maximum number of concurrent workers. Auto-tuned from CPU cores if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_jobs: Option<usize>,

    /// How pipes are split across workers (default: round_robin).
    #[serde(default)]
    pub partitioning: Partitioning,

    /// Milliseconds workers get to stop after cancellation before they are aborted.
    #[serde(default = "default_cancel_grace_ms")]
    pub cancel_grace_ms: u64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            task_name: default_task_name(),
            max_jobs: None,
            partitioning: Partitioning::default(),
            cancel_grace_ms: default_cancel_grace_ms(),
        }
    }
}

impl TransferSettings {
    /// Apply auto-tuned defaults based on detected system resources.
    pub fn with_auto_tuning(self) -> Self {
        let resources = SystemResources::detect();
        resources.log();
        self.with_resources(&resources)
    }

    /// Apply auto-tuned defaults for the given resources.
    /// Only fills in values that are None (not explicitly set).
    pub fn with_resources(mut self, resources: &SystemResources) -> Self {
        // Workers: cores - 1, but at least 1 and at most 16.
        // Each worker usually holds a connection on both ends.
        if self.max_jobs.is_none() {
            let jobs = resources.cpu_cores.saturating_sub(1).clamp(1, 16);
            self.max_jobs = Some(jobs);
        }

        info!(
            "Auto-tuned settings: max_jobs={}, partitioning={:?}",
            self.get_max_jobs(),
            self.partitioning
        );

        self
    }

    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = Some(max_jobs);
        self
    }

    pub fn with_partitioning(mut self, partitioning: Partitioning) -> Self {
        self.partitioning = partitioning;
        self
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn get_max_jobs(&self) -> usize {
        self.max_jobs.unwrap_or(1)
    }

    pub fn cancel_grace_period(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }
}

/// Rule used to split the ordered pipe list into worker assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partitioning {
    /// Pipe `i` goes to worker `i % jobs`.
    #[default]
    RoundRobin,

    /// Each worker gets one contiguous block of pipes.
    Contiguous,
}

fn default_task_name() -> String {
    "data-transfer".to_string()
}

fn default_cancel_grace_ms() -> u64 {
    30_000
}
