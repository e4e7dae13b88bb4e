//! Parallel phase: run all pipes under bounded concurrency.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{Partitioning, TransferSettings};
use crate::core::{DataPipe, ProgressMonitor, TransferTask};
use crate::error::AggregatedError;

use super::group::{join_workers, JobGroup, Joined};
use super::job::{job_count, partition, JobAssignment};
use super::stats::TransferStatistics;
use super::worker::{TransferWorker, WorkerResult};

/// Aggregated outcome of the parallel phase.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Merged counters of every worker that reported back.
    pub statistics: TransferStatistics,

    /// Worker errors: lowest worker index is primary.
    pub error: Option<AggregatedError>,

    /// The phase ended because of cancellation.
    pub canceled: bool,

    /// Number of workers that ran.
    pub job_count: usize,
}

/// Runs the ordered pipe list across `min(N, max_parallelism)` workers.
pub struct ParallelTransferRunner {
    max_parallelism: usize,
    partitioning: Partitioning,
    cancel_grace: Duration,
    task: Arc<TransferTask>,
}

impl ParallelTransferRunner {
    pub fn new(settings: &TransferSettings, task: Arc<TransferTask>) -> Self {
        Self {
            max_parallelism: settings.get_max_jobs(),
            partitioning: settings.partitioning,
            cancel_grace: settings.cancel_grace_period(),
            task,
        }
    }

    /// Override the worker limit taken from the settings.
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    pub fn job_count(&self, pipe_count: usize) -> usize {
        job_count(pipe_count, self.max_parallelism)
    }

    /// Transfer every pipe and send the run-wide finish signal.
    ///
    /// All pipes must already be started. After the workers have rejoined,
    /// the last pipe of `pipes` receives `finish_transfer(last = true)`
    /// exactly once, carrying the primary error if there is one.
    pub async fn run(&self, pipes: &[Arc<DataPipe>], monitor: &ProgressMonitor) -> RunReport {
        let jobs = self.job_count(pipes.len());
        if jobs == 0 {
            debug!("No pipes to transfer");
            return RunReport::default();
        }

        let assignments = partition(pipes.len(), jobs, self.partitioning);
        monitor.begin_task("Transfer data", pipes.len());
        info!(
            "Transferring {} pipe(s) with {} worker(s) ({:?})",
            pipes.len(),
            jobs,
            self.partitioning
        );

        let joined = if jobs > 1 {
            let mut group = JobGroup::new(monitor, jobs);
            for assignment in assignments {
                let worker = self.worker(assignment, pipes, group.worker_monitor());
                group.spawn(worker);
            }
            group.join(monitor, self.cancel_grace).await
        } else {
            // Single worker: no group, it reports on the caller's monitor.
            let mut assignments = assignments;
            let assignment = assignments.remove(0);
            let worker = self.worker(assignment, pipes, monitor.clone());
            let handle = tokio::spawn(worker.run());
            join_workers(vec![handle], monitor, None, self.cancel_grace).await
        };

        if jobs > 1 {
            // Workers reported on detached monitors.
            for result in &joined.results {
                monitor.worked(result.statistics.pipes_completed);
                monitor.add_rows(result.statistics.rows_transferred);
            }
        }

        let report = Self::collect(joined, jobs);
        self.finish_last(pipes, monitor, &report).await;
        report
    }

    fn worker(
        &self,
        assignment: JobAssignment,
        pipes: &[Arc<DataPipe>],
        monitor: ProgressMonitor,
    ) -> TransferWorker {
        let owned = assignment
            .pipes
            .iter()
            .map(|&index| (index, Arc::clone(&pipes[index])))
            .collect();
        TransferWorker::new(assignment.worker, owned, monitor, Arc::clone(&self.task))
    }

    /// Merge worker results: statistics summed, errors folded in worker order.
    fn collect(joined: Joined, jobs: usize) -> RunReport {
        let Joined { results, canceled } = joined;

        let statistics: TransferStatistics = results.iter().map(|r| &r.statistics).sum();
        let canceled = canceled || results.iter().any(|r| r.canceled);
        for result in results.iter().filter(|r| r.is_success()) {
            debug!(
                "Worker {}: {} pipe(s), {} rows",
                result.worker,
                result.processed.len(),
                result.statistics.rows_transferred
            );
        }

        let error = AggregatedError::collect(
            results
                .into_iter()
                .filter_map(|WorkerResult { error, .. }| error),
        );
        if let Some(ref agg) = error {
            warn!(
                "Parallel transfer finished with {} error(s): {}",
                agg.count(),
                agg
            );
        }

        RunReport {
            statistics,
            error,
            canceled,
            job_count: jobs,
        }
    }

    async fn finish_last(
        &self,
        pipes: &[Arc<DataPipe>],
        monitor: &ProgressMonitor,
        report: &RunReport,
    ) {
        let Some(last) = pipes.last() else {
            return;
        };
        debug!("Sending finish signal to last pipe {}", last.name());
        last.consumer()
            .finish_transfer(
                monitor,
                report.error.as_ref().map(AggregatedError::primary),
                &self.task,
                true,
            )
            .await;
    }
}
