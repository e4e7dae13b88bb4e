//! Producer/consumer pairs.

use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

use crate::config::TransferSettings;
use crate::error::Result;

use super::context::TransferParameters;
use super::traits::{TransferConsumer, TransferProducer};

/// One producer → consumer data-movement unit.
///
/// A pipe is identified by its position in the ordered pipe list; the
/// position is assigned by [`DataPipe::init_pipe`].
pub struct DataPipe {
    producer: Arc<dyn TransferProducer>,
    consumer: Arc<dyn TransferConsumer>,
    params: OnceLock<TransferParameters>,
}

impl DataPipe {
    pub fn new(producer: Arc<dyn TransferProducer>, consumer: Arc<dyn TransferConsumer>) -> Self {
        Self {
            producer,
            consumer,
            params: OnceLock::new(),
        }
    }

    pub fn producer(&self) -> &dyn TransferProducer {
        self.producer.as_ref()
    }

    pub fn consumer(&self) -> &dyn TransferConsumer {
        self.consumer.as_ref()
    }

    /// Position assigned during initialization, if the pipe was initialized.
    pub fn params(&self) -> Option<TransferParameters> {
        self.params.get().copied()
    }

    /// Name shown in logs: `producer -> consumer`.
    pub fn name(&self) -> String {
        format!("{} -> {}", self.producer.name(), self.consumer.name())
    }

    /// Assign the pipe its position and forward it to both ends.
    pub fn init_pipe(&self, settings: &TransferSettings, index: usize, total: usize) -> Result<()> {
        let params = TransferParameters { index, total };
        // A pipe keeps the position it was first given.
        let _ = self.params.set(params);
        trace!(
            "{}: init pipe {}/{} for task {}",
            self.name(),
            params.order_number(),
            total,
            settings.task_name
        );
        self.producer.init_transfer(params)?;
        self.consumer.init_transfer(params)?;
        Ok(())
    }
}

impl fmt::Debug for DataPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPipe")
            .field("name", &self.name())
            .field("params", &self.params())
            .finish()
    }
}
