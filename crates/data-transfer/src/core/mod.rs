//! Core abstractions for the transfer engine.
//!
//! This module contains the backend-agnostic building blocks:
//!
//! - [`traits`]: consumer and producer capability traits
//! - [`pipe`]: the producer/consumer pair the engine schedules
//! - [`context`]: run-wide and per-pipe parameters
//! - [`monitor`]: the cancelable progress handle

pub mod context;
pub mod monitor;
pub mod pipe;
pub mod traits;

pub use context::{RuntimeParameters, TransferParameters, TransferTask};
pub use monitor::ProgressMonitor;
pub use pipe::DataPipe;
pub use traits::{IntegrityPolicy, TransferConsumer, TransferProducer};
