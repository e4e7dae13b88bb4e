//! A worker: sequential transfer of the pipes in one job assignment.

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::core::{DataPipe, ProgressMonitor, TransferTask};
use crate::error::TransferError;

use super::stats::TransferStatistics;

/// Outcome of one worker.
#[derive(Debug)]
pub struct WorkerResult {
    /// Worker index (spawn order).
    pub worker: usize,

    /// Counters for the pipes this worker ran.
    pub statistics: TransferStatistics,

    /// First error the worker hit; the worker stops there.
    pub error: Option<TransferError>,

    /// The worker stopped because of cancellation.
    pub canceled: bool,

    /// Pipe indices the worker attempted, in order.
    pub processed: Vec<usize>,
}

impl WorkerResult {
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            statistics: TransferStatistics::default(),
            error: None,
            canceled: false,
            processed: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.canceled
    }
}

/// Transfers its assigned pipes one after another.
///
/// A worker never touches pipes outside its assignment. It reports each pipe
/// through `pipe_finished`; the run-wide `finish_transfer` belongs to the
/// runner.
pub struct TransferWorker {
    worker: usize,
    pipes: Vec<(usize, Arc<DataPipe>)>,
    monitor: ProgressMonitor,
    task: Arc<TransferTask>,
}

impl TransferWorker {
    pub fn new(
        worker: usize,
        pipes: Vec<(usize, Arc<DataPipe>)>,
        monitor: ProgressMonitor,
        task: Arc<TransferTask>,
    ) -> Self {
        Self {
            worker,
            pipes,
            monitor,
            task,
        }
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    pub async fn run(self) -> WorkerResult {
        let mut result = WorkerResult::new(self.worker);
        let total = self.pipes.len();
        self.monitor.begin_task(&format!("Worker {}", self.worker), total);

        for (position, (index, pipe)) in self.pipes.iter().enumerate() {
            if self.monitor.is_canceled() {
                info!(
                    "Worker {}: cancellation requested, {} pipe(s) left untouched",
                    self.worker,
                    total - position
                );
                result.canceled = true;
                break;
            }

            let name = pipe.name();
            self.monitor.sub_task(&format!("Worker {}: transferring {}", self.worker, name));

            let started = Instant::now();
            let outcome = pipe.producer().transfer_data(&self.monitor, &self.task).await;
            let elapsed = started.elapsed();
            result.processed.push(*index);

            match outcome {
                Ok(rows) => {
                    result
                        .statistics
                        .merge(&TransferStatistics::pipe(rows, elapsed));
                    self.monitor.worked(1);
                    self.monitor.add_rows(rows);
                    pipe.consumer().pipe_finished(&self.monitor, None).await;
                    debug!(
                        "Worker {}: {} completed ({} rows in {:?})",
                        self.worker, name, rows, elapsed
                    );
                }
                Err(e) if e.is_cancelled() => {
                    result.statistics.add_execute_time(elapsed);
                    pipe.consumer().pipe_finished(&self.monitor, None).await;
                    info!("Worker {}: {} cancelled", self.worker, name);
                    result.canceled = true;
                    break;
                }
                Err(e) => {
                    result.statistics.add_execute_time(elapsed);
                    let err = TransferError::Worker {
                        worker: self.worker,
                        pipe: *index,
                        name,
                        source: Box::new(e),
                    };
                    error!("{}", err.format_detailed());
                    pipe.consumer()
                        .pipe_finished(&self.monitor, Some(&err))
                        .await;
                    let skipped = total - position - 1;
                    if skipped > 0 {
                        warn!(
                            "Worker {}: skipping {} remaining pipe(s) after failure",
                            self.worker, skipped
                        );
                    }
                    result.error = Some(err);
                    break;
                }
            }
        }

        result
    }
}
