//! # data-transfer
//!
//! Bulk data-transfer orchestration engine.
//!
//! Moves data through any number of producer → consumer pipes with:
//!
//! - **Sequential, fail-fast initialization** of every consumer before any
//!   parallel work starts
//! - **Bounded parallelism** with disjoint worker assignments
//! - **Referential-integrity toggling** around the load, restored on every
//!   exit path
//! - **Aggregated results**: merged statistics, one primary error, every
//!   other error kept as a suppressed cause
//! - **A single run-wide finish signal** on the last pipe
//!
//! Producers and consumers are backend implementations of
//! [`TransferProducer`] and [`TransferConsumer`]; the engine only drives
//! their lifecycles.
//!
//! ## Example
//!
//! ```rust,no_run
//! use data_transfer::{DataPipe, Orchestrator, ProgressMonitor, TransferSettings};
//! use std::sync::Arc;
//!
//! async fn transfer(pipes: Vec<Arc<DataPipe>>) -> data_transfer::Result<()> {
//!     let settings = TransferSettings::load("transfer.yaml")?.with_auto_tuning();
//!     let orchestrator = Orchestrator::new(settings)?;
//!     let result = orchestrator.run(&pipes, &ProgressMonitor::new()).await;
//!     println!("{}", result.to_json()?);
//!     let stats = result.into_result()?;
//!     println!("Transferred {} rows", stats.rows_transferred);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod integrity;
pub mod orchestrator;
pub mod transfer;

// Re-exports for convenient access
pub use config::{Partitioning, TransferSettings};
pub use crate::core::{
    DataPipe, IntegrityPolicy, ProgressMonitor, RuntimeParameters, TransferConsumer,
    TransferParameters, TransferProducer, TransferTask,
};
pub use error::{AggregatedError, Result, TransferError};
pub use integrity::IntegrityHighWaterMark;
pub use orchestrator::{Orchestrator, TransferPhase, TransferResult, TransferStatus, TransferSummary};
pub use transfer::{ParallelTransferRunner, RunReport, TransferStatistics};
