//! Phase outcomes and the run state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{AggregatedError, TransferError};
use crate::transfer::{RunReport, TransferStatistics};

/// How a phase ended, with whatever value it produced either way.
#[derive(Debug)]
pub enum PhaseOutcome<T> {
    /// Everything succeeded.
    Completed(T),

    /// The phase ran to the end but some independent units failed.
    PartialSuccess { value: T, error: AggregatedError },

    /// The monitor was canceled; `T` reflects the work done before that.
    Canceled(T),

    /// The phase aborted; later phases except the restore sweep are skipped.
    Fatal { value: T, error: TransferError },
}

impl<T> PhaseOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            PhaseOutcome::Completed(value)
            | PhaseOutcome::Canceled(value)
            | PhaseOutcome::PartialSuccess { value, .. }
            | PhaseOutcome::Fatal { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            PhaseOutcome::Completed(value)
            | PhaseOutcome::Canceled(value)
            | PhaseOutcome::PartialSuccess { value, .. }
            | PhaseOutcome::Fatal { value, .. } => value,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PhaseOutcome::Completed(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, PhaseOutcome::Canceled(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, PhaseOutcome::Fatal { .. })
    }
}

impl RunReport {
    /// Worker errors win over cancellation: a canceled run that also had a
    /// genuine failure is a partial success, not a cancellation.
    pub fn into_outcome(self) -> PhaseOutcome<TransferStatistics> {
        match self.error {
            Some(error) => PhaseOutcome::PartialSuccess {
                value: self.statistics,
                error,
            },
            None if self.canceled => PhaseOutcome::Canceled(self.statistics),
            None => PhaseOutcome::Completed(self.statistics),
        }
    }
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPhase {
    Init,
    Running,
    Finalizing,
    Restoring,
    Done,
    Failed,
}

impl TransferPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferPhase::Done | TransferPhase::Failed)
    }

    fn can_follow(&self, previous: TransferPhase) -> bool {
        use TransferPhase::*;
        matches!(
            (previous, *self),
            (Init, Running)
                | (Init, Restoring)
                | (Running, Finalizing)
                | (Finalizing, Restoring)
                | (Restoring, Done)
                | (Restoring, Failed)
        )
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferPhase::Init => "init",
            TransferPhase::Running => "running",
            TransferPhase::Finalizing => "finalizing",
            TransferPhase::Restoring => "restoring",
            TransferPhase::Done => "done",
            TransferPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Records the phases a run went through.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    history: Vec<TransferPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            history: vec![TransferPhase::Init],
        }
    }

    pub fn current(&self) -> TransferPhase {
        self.history[self.history.len() - 1]
    }

    pub fn enter(&mut self, next: TransferPhase) {
        let current = self.current();
        debug_assert!(
            next.can_follow(current),
            "invalid phase transition {} -> {}",
            current,
            next
        );
        debug!("Transfer phase: {} -> {}", current, next);
        self.history.push(next);
    }

    pub fn into_history(self) -> Vec<TransferPhase> {
        self.history
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
