//! Parallel transfer of started pipes.
//!
//! The parallel phase is split into:
//! - [`job`]: partitioning of pipes into disjoint worker assignments
//! - [`worker`]: sequential transfer of one assignment
//! - [`group`]: spawning, joining and cancelling workers
//! - [`runner`]: the phase itself, including the run-wide finish signal
//! - [`stats`]: the statistics accumulator

pub mod group;
pub mod job;
pub mod runner;
pub mod stats;
pub mod worker;

pub use group::{JobGroup, Joined};
pub use job::{job_count, partition, JobAssignment};
pub use runner::{ParallelTransferRunner, RunReport};
pub use stats::TransferStatistics;
pub use worker::{TransferWorker, WorkerResult};
