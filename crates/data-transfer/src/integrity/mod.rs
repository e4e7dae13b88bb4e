//! Referential-integrity toggling around a transfer.
//!
//! Consumers that support it and ask for it get constraint checking
//! disabled right after they start. The highest pipe index where that
//! happened is the [`IntegrityHighWaterMark`]; after the transfer every pipe
//! up to and including it gets integrity re-enabled by [`restore_sweep`].

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::core::{DataPipe, IntegrityPolicy, ProgressMonitor, TransferConsumer};
use crate::error::{Result, TransferError};

/// Highest pipe index whose integrity was disabled during initialization.
///
/// `None` (shown as `-1`) when no pipe was touched. Pipes are initialized in
/// order, so the mark always bounds a prefix of the pipe list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityHighWaterMark(Option<usize>);

impl IntegrityHighWaterMark {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn at(index: usize) -> Self {
        Self(Some(index))
    }

    pub fn index(&self) -> Option<usize> {
        self.0
    }

    /// `-1` when unset.
    pub fn as_i64(&self) -> i64 {
        self.0.map_or(-1, |i| i as i64)
    }

    /// Number of pipes the restore sweep covers.
    pub fn span(&self) -> usize {
        self.0.map_or(0, |i| i + 1)
    }

    /// Raise the mark to `index`.
    pub fn raise(&mut self, index: usize) {
        self.0 = Some(self.0.map_or(index, |i| i.max(index)));
    }
}

impl fmt::Display for IntegrityHighWaterMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Disable constraint checking if the consumer supports it and asks for it.
///
/// Returns true only if integrity was actually disabled.
pub async fn maybe_disable(
    consumer: &dyn TransferConsumer,
    monitor: &ProgressMonitor,
) -> Result<bool> {
    if consumer.integrity_policy() != IntegrityPolicy::DisableDuringTransfer {
        return Ok(false);
    }
    if !consumer
        .supports_changing_referential_integrity(monitor)
        .await?
    {
        debug!(
            "{}: referential integrity cannot be changed, leaving it enabled",
            consumer.name()
        );
        return Ok(false);
    }

    consumer.enable_referential_integrity(monitor, false).await?;
    debug!("{}: referential integrity disabled", consumer.name());
    Ok(true)
}

/// Re-enable constraint checking.
pub async fn restore(consumer: &dyn TransferConsumer, monitor: &ProgressMonitor) -> Result<()> {
    consumer.enable_referential_integrity(monitor, true).await
}

/// Outcome of a restore sweep.
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Pipes the sweep attempted, in order.
    pub attempted: Vec<usize>,

    /// Pipes where integrity was re-enabled.
    pub restored: usize,

    /// First failure, wrapped with its pipe. Later failures are only logged.
    pub error: Option<TransferError>,

    /// Number of failed pipes, the first one included.
    pub failures: usize,
}

impl RestoreReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The wrapped first failure, if any.
    pub fn into_result(self) -> Result<usize> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.restored),
        }
    }
}

/// Re-enable integrity on pipes `0..=mark`, best effort.
///
/// Every pipe in range is attempted exactly once, in index order, whatever
/// happened before and whether or not `monitor` is canceled. A failure never
/// stops the sweep.
pub async fn restore_sweep(
    pipes: &[Arc<DataPipe>],
    mark: IntegrityHighWaterMark,
    monitor: &ProgressMonitor,
) -> RestoreReport {
    let mut report = RestoreReport::default();
    let Some(last) = mark.index() else {
        return report;
    };

    info!("Restoring referential integrity for {} pipe(s)", mark.span());
    for (index, pipe) in pipes.iter().enumerate().take(last + 1) {
        report.attempted.push(index);
        match restore(pipe.consumer(), monitor).await {
            Ok(()) => {
                debug!("{}: referential integrity restored", pipe.name());
                report.restored += 1;
            }
            Err(e) => {
                error!(
                    "Failed to restore referential integrity for pipe {} ({}): {}",
                    index,
                    pipe.name(),
                    e
                );
                report.failures += 1;
                if report.error.is_none() {
                    report.error = Some(TransferError::Restore {
                        pipe: index,
                        name: pipe.name(),
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    report
}
