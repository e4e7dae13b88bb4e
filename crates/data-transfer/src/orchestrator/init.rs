//! Sequential pipe initialization.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::TransferSettings;
use crate::core::{DataPipe, ProgressMonitor, RuntimeParameters, TransferTask};
use crate::error::TransferError;
use crate::integrity::{maybe_disable, IntegrityHighWaterMark};

use super::phase::PhaseOutcome;

/// Starts every pipe's consumer, one after another, before any worker runs.
///
/// Fail-fast: the first consumer failure aborts the phase. Because pipes are
/// started strictly in order, the resulting high-water mark always bounds a
/// prefix of the pipe list.
pub struct PipeInitializer<'a> {
    settings: &'a TransferSettings,
    task: &'a TransferTask,
    runtime: Arc<RuntimeParameters>,
}

impl<'a> PipeInitializer<'a> {
    pub fn new(
        settings: &'a TransferSettings,
        task: &'a TransferTask,
        runtime: Arc<RuntimeParameters>,
    ) -> Self {
        Self {
            settings,
            task,
            runtime,
        }
    }

    pub async fn initialize(
        &self,
        pipes: &[Arc<DataPipe>],
        monitor: &ProgressMonitor,
    ) -> PhaseOutcome<IntegrityHighWaterMark> {
        let total = pipes.len();
        let mut mark = IntegrityHighWaterMark::none();
        monitor.begin_task("Initialize pipes", total);

        for (index, pipe) in pipes.iter().enumerate() {
            if monitor.is_canceled() {
                info!(
                    "Initialization cancelled after {} of {} pipe(s)",
                    index, total
                );
                return PhaseOutcome::Canceled(mark);
            }

            let name = pipe.name();
            monitor.sub_task(&format!("Initialize {}", name));

            // Not started yet, so nothing to finish.
            if let Err(e) = pipe.init_pipe(self.settings, index, total) {
                if e.is_cancelled() {
                    info!("{}: init cancelled", name);
                    return PhaseOutcome::Canceled(mark);
                }
                let err = TransferError::Initialization {
                    pipe: index,
                    name,
                    source: Box::new(e),
                };
                error!("{}", err.format_detailed());
                return PhaseOutcome::Fatal { value: mark, error: err };
            }

            let consumer = pipe.consumer();
            consumer.set_runtime_parameters(Arc::clone(&self.runtime));

            let started = match consumer.start_transfer(monitor).await {
                Ok(()) => maybe_disable(consumer, monitor).await,
                Err(e) => Err(e),
            };

            match started {
                Ok(disabled) => {
                    if disabled {
                        mark.raise(index);
                    }
                    debug!(
                        "{}: started (integrity disabled: {}, high-water mark: {})",
                        name, disabled, mark
                    );
                    monitor.worked(1);
                }
                Err(e) if e.is_cancelled() => {
                    info!("{}: start cancelled", name);
                    consumer
                        .finish_transfer(monitor, None, self.task, true)
                        .await;
                    return PhaseOutcome::Canceled(mark);
                }
                Err(e) => {
                    let err = TransferError::Initialization {
                        pipe: index,
                        name,
                        source: Box::new(e),
                    };
                    error!("{}", err.format_detailed());
                    consumer
                        .finish_transfer(monitor, Some(&err), self.task, true)
                        .await;
                    return PhaseOutcome::Fatal { value: mark, error: err };
                }
            }
        }

        info!("Initialized {} pipe(s), high-water mark {}", total, mark);
        PhaseOutcome::Completed(mark)
    }
}
