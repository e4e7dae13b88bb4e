//! Spawning and joining workers.

use futures::future::join_all;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::ProgressMonitor;
use crate::error::TransferError;

use super::worker::{TransferWorker, WorkerResult};

/// Results of a join, indexed by worker.
#[derive(Debug)]
pub struct Joined {
    pub results: Vec<WorkerResult>,

    /// The caller's monitor was canceled while waiting.
    pub canceled: bool,
}

/// A cancelable, jointly awaited set of workers.
///
/// Workers spawned into a group get a monitor bound to the group token with
/// their own progress counters; the caller's progress handle stays with the
/// caller.
pub struct JobGroup {
    token: CancellationToken,
    capacity: usize,
    handles: Vec<JoinHandle<WorkerResult>>,
}

impl JobGroup {
    /// Create a group of `capacity` workers whose token is a child of the
    /// caller's monitor.
    pub fn new(parent: &ProgressMonitor, capacity: usize) -> Self {
        Self {
            token: parent.token().child_token(),
            capacity,
            handles: Vec::with_capacity(capacity),
        }
    }

    /// Monitor to hand to the next worker.
    pub fn worker_monitor(&self) -> ProgressMonitor {
        ProgressMonitor::detached_with(self.token.child_token())
    }

    /// Schedule a worker. Workers must be spawned in index order.
    pub fn spawn(&mut self, worker: TransferWorker) {
        debug_assert!(self.handles.len() < self.capacity, "job group is full");
        debug_assert_eq!(worker.worker(), self.handles.len());
        self.handles.push(tokio::spawn(worker.run()));
    }

    /// Wait for all workers; see [`join_workers`].
    pub async fn join(self, monitor: &ProgressMonitor, grace: Duration) -> Joined {
        join_workers(self.handles, monitor, Some(&self.token), grace).await
    }
}

/// Wait until every worker finishes or `monitor` is canceled.
///
/// On cancellation `group` (if any) is canceled and the workers get `grace`
/// to reach a safe point; the ones still running after that are aborted.
/// Results keep the order of `handles`.
pub async fn join_workers(
    handles: Vec<JoinHandle<WorkerResult>>,
    monitor: &ProgressMonitor,
    group: Option<&CancellationToken>,
    grace: Duration,
) -> Joined {
    let abort_handles: Vec<AbortHandle> = handles.iter().map(JoinHandle::abort_handle).collect();
    let mut all = std::pin::pin!(join_all(handles));
    let mut canceled = false;

    let joined = tokio::select! {
        joined = &mut all => joined,
        _ = monitor.cancelled() => {
            canceled = true;
            if let Some(token) = group {
                token.cancel();
            }
            info!(
                "Cancellation requested, waiting up to {:?} for {} worker(s) to stop",
                grace,
                abort_handles.len()
            );
            match tokio::time::timeout(grace, &mut all).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Workers did not stop within {:?}, aborting", grace);
                    for handle in &abort_handles {
                        handle.abort();
                    }
                    all.await
                }
            }
        }
    };

    let results = joined
        .into_iter()
        .enumerate()
        .map(|(worker, joined)| from_join(worker, joined))
        .collect();

    Joined { results, canceled }
}

fn from_join(worker: usize, joined: Result<WorkerResult, JoinError>) -> WorkerResult {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => {
            warn!("Worker {} aborted before finishing", worker);
            let mut result = WorkerResult::new(worker);
            result.canceled = true;
            result
        }
        Err(e) => {
            error!("Worker {}: task panicked - {}", worker, e);
            let mut result = WorkerResult::new(worker);
            result.error = Some(TransferError::WorkerPanicked {
                worker,
                message: e.to_string(),
            });
            result
        }
    }
}
