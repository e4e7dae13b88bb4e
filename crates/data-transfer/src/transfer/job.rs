//! Work assignments for the parallel phase.
//!
//! A [`JobAssignment`] is the set of pipe indices one worker owns. The
//! assignments produced by [`partition`] are disjoint and together cover every
//! pipe exactly once.

use crate::config::Partitioning;

/// Pipes owned by one worker, in ascending index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAssignment {
    /// Worker index (spawn order).
    pub worker: usize,

    /// Indices into the ordered pipe list.
    pub pipes: Vec<usize>,
}

impl JobAssignment {
    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }
}

/// Number of workers for `pipe_count` pipes under `max_parallelism`.
pub fn job_count(pipe_count: usize, max_parallelism: usize) -> usize {
    pipe_count.min(max_parallelism)
}

/// Split `pipe_count` pipes into `jobs` assignments.
///
/// Returns an empty list when `jobs == 0`. With `jobs <= pipe_count` every
/// assignment is non-empty.
pub fn partition(pipe_count: usize, jobs: usize, strategy: Partitioning) -> Vec<JobAssignment> {
    if jobs == 0 {
        return Vec::new();
    }

    let mut assignments: Vec<JobAssignment> = (0..jobs)
        .map(|worker| JobAssignment {
            worker,
            pipes: Vec::with_capacity(pipe_count / jobs + 1),
        })
        .collect();

    match strategy {
        Partitioning::RoundRobin => {
            for pipe in 0..pipe_count {
                assignments[pipe % jobs].pipes.push(pipe);
            }
        }
        Partitioning::Contiguous => {
            // First `extra` workers take one more pipe each.
            let base = pipe_count / jobs;
            let extra = pipe_count % jobs;
            let mut next = 0;
            for assignment in &mut assignments {
                let size = base + usize::from(assignment.worker < extra);
                assignment.pipes.extend(next..next + size);
                next += size;
            }
        }
    }

    assignments
}
