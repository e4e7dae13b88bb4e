//! Transfer orchestrator - main workflow coordinator.

mod init;
mod phase;

pub use init::PipeInitializer;
pub use phase::{PhaseOutcome, PhaseTracker, TransferPhase};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::TransferSettings;
use crate::core::{DataPipe, ProgressMonitor, RuntimeParameters, TransferTask};
use crate::error::{AggregatedError, Result, TransferError};
use crate::integrity::{restore_sweep, IntegrityHighWaterMark};
use crate::transfer::{ParallelTransferRunner, TransferStatistics};

/// Transfer orchestrator.
///
/// Runs `Init → Running → Finalizing → Restoring → {Done, Failed}`. A fatal
/// init error or a cancellation during init jumps straight to `Restoring`;
/// the restore sweep runs on every path.
pub struct Orchestrator {
    settings: TransferSettings,
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Completed,
    Failed,
    Cancelled,
}

/// Result of a transfer run.
///
/// Statistics are always attached, also when the run failed.
#[derive(Debug)]
pub struct TransferResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Task name from the settings.
    pub task_name: String,

    /// Final status.
    pub status: TransferStatus,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Merged worker statistics.
    pub statistics: TransferStatistics,

    /// Number of pipes in the run.
    pub pipes_total: usize,

    /// Number of workers the parallel phase used (0 if it never ran).
    pub job_count: usize,

    /// Highest pipe index whose integrity was disabled.
    pub high_water_mark: IntegrityHighWaterMark,

    /// Pipes whose integrity was restored by the sweep.
    pub integrity_restored: usize,

    /// Primary error, if the run failed.
    pub error: Option<TransferError>,

    /// Every other error raised during the run.
    pub suppressed: Vec<TransferError>,

    /// Cancellation was requested during the run.
    pub canceled: bool,

    /// Phases the run went through, in order.
    pub phases: Vec<TransferPhase>,
}

/// Serializable view of a [`TransferResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSummary {
    pub run_id: String,
    pub task_name: String,
    pub status: TransferStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub pipes_total: usize,
    pub pipes_completed: usize,
    pub job_count: usize,
    pub rows_transferred: u64,
    pub execute_time_seconds: f64,
    pub rows_per_second: u64,
    pub canceled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed_errors: Vec<String>,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(settings: TransferSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Run the transfer for `pipes`.
    ///
    /// Never returns early with an error: failures and cancellation are
    /// reported in the [`TransferResult`] together with the statistics
    /// gathered so far.
    pub async fn run(&self, pipes: &[Arc<DataPipe>], monitor: &ProgressMonitor) -> TransferResult {
        let task = Arc::new(TransferTask::new(self.settings.task_name.clone()));
        let runner = ParallelTransferRunner::new(&self.settings, Arc::clone(&task));
        let jobs = runner.job_count(pipes.len());
        let runtime = Arc::new(RuntimeParameters::new(&task, pipes.len(), jobs));
        let mut phases = PhaseTracker::new();

        info!(
            "Starting transfer run {} ({}): {} pipe(s), up to {} worker(s)",
            task.run_id,
            task.name,
            pipes.len(),
            jobs
        );

        let mut statistics = TransferStatistics::default();
        let mut errors: Option<AggregatedError> = None;
        let mut canceled = false;
        let mut job_count = 0;

        // Phase 1: start every consumer in order
        info!("Phase 1: Initializing pipes");
        let init = PipeInitializer::new(&self.settings, &task, runtime)
            .initialize(pipes, monitor)
            .await;

        let mark = match init {
            PhaseOutcome::Completed(mark) => {
                // Phase 2: parallel transfer; the runner also sends the finish signal
                phases.enter(TransferPhase::Running);
                info!("Phase 2: Transferring data");
                let report = runner.run(pipes, monitor).await;
                phases.enter(TransferPhase::Finalizing);

                canceled = report.canceled;
                job_count = report.job_count;
                match report.into_outcome() {
                    PhaseOutcome::Completed(stats) | PhaseOutcome::Canceled(stats) => {
                        statistics = stats;
                    }
                    PhaseOutcome::PartialSuccess { value, error } => {
                        statistics = value;
                        errors = Some(error);
                    }
                    PhaseOutcome::Fatal { value, error } => {
                        statistics = value;
                        errors = Some(AggregatedError::new(error));
                    }
                }
                mark
            }
            PhaseOutcome::Canceled(mark) => {
                warn!("Initialization cancelled, skipping transfer");
                canceled = true;
                mark
            }
            PhaseOutcome::Fatal { value, error } => {
                warn!("Initialization failed, skipping transfer: {}", error);
                errors = Some(AggregatedError::new(error));
                value
            }
            PhaseOutcome::PartialSuccess { value, error } => {
                errors = Some(error);
                value
            }
        };

        // Phase 3: always restore integrity, whatever happened above
        phases.enter(TransferPhase::Restoring);
        info!("Phase 3: Restoring referential integrity (high-water mark {})", mark);
        let restore = restore_sweep(pipes, mark, monitor).await;
        let integrity_restored = restore.restored;
        if let Some(err) = restore.error {
            if restore.failures > 1 {
                warn!(
                    "{} pipe(s) failed to restore referential integrity, reporting the first",
                    restore.failures
                );
            }
            match errors.as_mut() {
                Some(agg) => agg.suppress(err),
                None => errors = Some(AggregatedError::new(err)),
            }
        }

        canceled = canceled || monitor.is_canceled();
        let (error, suppressed) = match errors {
            Some(agg) => {
                let (primary, suppressed) = agg.into_parts();
                (Some(primary), suppressed)
            }
            None => (None, Vec::new()),
        };

        let status = if error.is_some() {
            phases.enter(TransferPhase::Failed);
            TransferStatus::Failed
        } else {
            phases.enter(TransferPhase::Done);
            if canceled {
                TransferStatus::Cancelled
            } else {
                TransferStatus::Completed
            }
        };

        let result = TransferResult {
            run_id: task.run_id.clone(),
            task_name: task.name.clone(),
            status,
            started_at: task.started_at,
            completed_at: Utc::now(),
            statistics,
            pipes_total: pipes.len(),
            job_count,
            high_water_mark: mark,
            integrity_restored,
            error,
            suppressed,
            canceled,
            phases: phases.into_history(),
        };

        match result.error {
            Some(ref e) => error!(
                "Transfer {:?}: {} of {} pipe(s), {} rows - {}",
                result.status,
                result.statistics.pipes_completed,
                result.pipes_total,
                result.statistics.rows_transferred,
                e
            ),
            None => info!(
                "Transfer {:?}: {} of {} pipe(s), {} rows in {:.1}s",
                result.status,
                result.statistics.pipes_completed,
                result.pipes_total,
                result.statistics.rows_transferred,
                result.duration_seconds()
            ),
        }

        result
    }
}

impl TransferResult {
    pub fn is_success(&self) -> bool {
        self.status == TransferStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransferStatus::Failed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == TransferStatus::Cancelled
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Statistics if the run did not fail, otherwise the primary error.
    pub fn into_result(self) -> Result<TransferStatistics> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.statistics),
        }
    }

    pub fn summary(&self) -> TransferSummary {
        let duration = self.duration_seconds();
        let rows_per_second = if duration > 0.0 {
            (self.statistics.rows_transferred as f64 / duration) as u64
        } else {
            0
        };

        TransferSummary {
            run_id: self.run_id.clone(),
            task_name: self.task_name.clone(),
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            duration_seconds: duration,
            pipes_total: self.pipes_total,
            pipes_completed: self.statistics.pipes_completed,
            job_count: self.job_count,
            rows_transferred: self.statistics.rows_transferred,
            execute_time_seconds: self.statistics.execute_time.as_secs_f64(),
            rows_per_second,
            canceled: self.canceled,
            error: self.error.as_ref().map(ToString::to_string),
            suppressed_errors: self.suppressed.iter().map(ToString::to_string).collect(),
        }
    }

    /// Convert the summary to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }
}
