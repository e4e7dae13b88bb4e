//! Cancelable progress handle shared between the orchestrator and workers.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Default)]
struct ProgressCounters {
    rows: AtomicU64,
    pipes_done: AtomicUsize,
    pipes_total: AtomicUsize,
}

/// Progress and cancellation handle.
///
/// Cloning shares both the cancellation token and the progress counters.
/// [`ProgressMonitor::detached`] creates a handle with its own counters whose
/// token is a child of this one, so cancelling the parent cancels the child
/// but not the other way round.
#[derive(Debug, Clone, Default)]
pub struct ProgressMonitor {
    token: CancellationToken,
    counters: Arc<ProgressCounters>,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a monitor driven by an existing cancellation token
    /// (e.g. one wired to SIGINT by the host application).
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            counters: Arc::default(),
        }
    }

    /// Child monitor: inherits cancellation, keeps separate progress counters.
    pub fn detached(&self) -> Self {
        Self::with_token(self.token.child_token())
    }

    /// Child monitor bound to a caller-provided token.
    pub(crate) fn detached_with(token: CancellationToken) -> Self {
        Self::with_token(token)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Start a unit of work of `total` pipes.
    pub fn begin_task(&self, name: &str, total: usize) {
        self.counters.pipes_total.store(total, Ordering::Relaxed);
        self.counters.pipes_done.store(0, Ordering::Relaxed);
        debug!("{}: {} pipe(s)", name, total);
    }

    pub fn sub_task(&self, message: &str) {
        debug!("{}", message);
    }

    /// Record one finished pipe.
    pub fn worked(&self, pipes: usize) {
        self.counters.pipes_done.fetch_add(pipes, Ordering::Relaxed);
    }

    /// Record rows moved by a finished pipe.
    pub fn add_rows(&self, rows: u64) {
        self.counters.rows.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn rows(&self) -> u64 {
        self.counters.rows.load(Ordering::Relaxed)
    }

    pub fn pipes_done(&self) -> usize {
        self.counters.pipes_done.load(Ordering::Relaxed)
    }

    pub fn pipes_total(&self) -> usize {
        self.counters.pipes_total.load(Ordering::Relaxed)
    }
}
