//! Capability traits implemented by transfer backends.
//!
//! The engine only drives lifecycles through these traits:
//!
//! - [`TransferConsumer`]: the receiving side of a pipe (a database table,
//!   a file, the clipboard, ...)
//! - [`TransferProducer`]: the sending side of a pipe
//!
//! Row I/O itself happens inside the backend; the engine never sees rows,
//! only the counts a producer reports back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Result, TransferError};

use super::context::{RuntimeParameters, TransferParameters, TransferTask};
use super::monitor::ProgressMonitor;

/// Consumer-side choice about constraint checking during the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityPolicy {
    /// Leave referential integrity untouched.
    #[default]
    Keep,

    /// Disable constraint checking while loading, restore it afterwards.
    DisableDuringTransfer,
}

/// Receiving side of a pipe.
///
/// Methods take `&self`: a consumer is shared between the orchestrator and
/// the one worker that owns its pipe, so implementations keep mutable state
/// behind their own synchronization.
#[async_trait]
pub trait TransferConsumer: Send + Sync {
    /// Display name used in logs and error messages.
    fn name(&self) -> String;

    /// Receive the pipe position before the transfer starts.
    fn init_transfer(&self, _params: TransferParameters) -> Result<()> {
        Ok(())
    }

    /// Receive the parameters shared by every consumer of the run.
    fn set_runtime_parameters(&self, _params: Arc<RuntimeParameters>) {}

    /// Prepare the target (create tables, open files, ...).
    ///
    /// Called at most once per pipe, before any worker touches the pipe.
    async fn start_transfer(&self, monitor: &ProgressMonitor) -> Result<()>;

    /// Run-level "transfer done" signal.
    ///
    /// Called at most once per pipe and at most once per run: on the last
    /// pipe after all workers are done, or on the pipe whose start failed.
    /// `error` is the run's primary error. Implementations log their own
    /// cleanup failures.
    async fn finish_transfer(
        &self,
        monitor: &ProgressMonitor,
        error: Option<&TransferError>,
        task: &TransferTask,
        last: bool,
    );

    /// The pipe's own data has been moved (or failed to move).
    ///
    /// Sent once by the worker that owns the pipe, with that pipe's error.
    async fn pipe_finished(&self, _monitor: &ProgressMonitor, _error: Option<&TransferError>) {}

    /// Whether this target can toggle constraint checking at all.
    async fn supports_changing_referential_integrity(
        &self,
        _monitor: &ProgressMonitor,
    ) -> Result<bool> {
        Ok(false)
    }

    /// Enable or disable constraint checking on the target.
    async fn enable_referential_integrity(
        &self,
        _monitor: &ProgressMonitor,
        _enable: bool,
    ) -> Result<()> {
        Err(TransferError::consumer(format!(
            "{} does not support changing referential integrity",
            self.name()
        )))
    }

    /// The consumer's own setting for constraint checking.
    fn integrity_policy(&self) -> IntegrityPolicy {
        IntegrityPolicy::Keep
    }
}

/// Sending side of a pipe.
#[async_trait]
pub trait TransferProducer: Send + Sync {
    /// Display name used in logs and error messages.
    fn name(&self) -> String;

    /// Receive the pipe position before the transfer starts.
    fn init_transfer(&self, _params: TransferParameters) -> Result<()> {
        Ok(())
    }

    /// Move all rows into the pipe's consumer and return how many were moved.
    ///
    /// Implementations poll `monitor` at safe points and return
    /// [`TransferError::Cancelled`] once it is canceled.
    async fn transfer_data(&self, monitor: &ProgressMonitor, task: &TransferTask) -> Result<u64>;
}
