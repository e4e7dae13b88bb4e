//! Run-wide and per-pipe context handed to consumers and producers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one transfer run, passed to workers and to `finish_transfer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferTask {
    /// Unique run identifier.
    pub run_id: String,

    /// Task name from the settings.
    pub name: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl TransferTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            started_at: Utc::now(),
        }
    }
}

/// Parameters computed once per run and shared by every consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeParameters {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Number of pipes in the run.
    pub pipe_count: usize,
    /// Number of workers the parallel phase will use.
    pub job_count: usize,
}

impl RuntimeParameters {
    pub fn new(task: &TransferTask, pipe_count: usize, job_count: usize) -> Self {
        Self {
            run_id: task.run_id.clone(),
            started_at: task.started_at,
            pipe_count,
            job_count,
        }
    }

    /// True if more than one worker will run concurrently.
    pub fn is_parallel(&self) -> bool {
        self.job_count > 1
    }
}

/// Position of a pipe within its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParameters {
    /// 0-based index in the ordered pipe list.
    pub index: usize,
    /// Total number of pipes.
    pub total: usize,
}

impl TransferParameters {
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }

    /// 1-based order number, as shown to users.
    pub fn order_number(&self) -> usize {
        self.index + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_parameters() {
        let params = TransferParameters { index: 2, total: 3 };
        assert!(params.is_last());
        assert_eq!(params.order_number(), 3);
        assert!(!TransferParameters { index: 0, total: 3 }.is_last());
    }

    #[test]
    fn test_runtime_parameters_from_task() {
        let task = TransferTask::new("export");
        let params = RuntimeParameters::new(&task, 5, 2);
        assert_eq!(params.run_id, task.run_id);
        assert_eq!(params.pipe_count, 5);
        assert!(params.is_parallel());
        assert!(!RuntimeParameters::new(&task, 5, 1).is_parallel());
    }
}
