//! Transfer statistics and their merge.

use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::time::Duration;

/// Counters reported by one worker, or the sum over several.
///
/// Merging is associative and commutative, so worker results can be folded
/// in any order. Execute time is summed across workers, not maxed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStatistics {
    /// Total rows transferred.
    pub rows_transferred: u64,

    /// Time spent inside producers, summed over pipes.
    pub execute_time: Duration,

    /// Pipes that finished without error.
    pub pipes_completed: usize,
}

impl TransferStatistics {
    /// Statistics of a single finished pipe.
    pub fn pipe(rows: u64, execute_time: Duration) -> Self {
        Self {
            rows_transferred: rows,
            execute_time,
            pipes_completed: 1,
        }
    }

    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: &TransferStatistics) {
        self.rows_transferred = self.rows_transferred.saturating_add(other.rows_transferred);
        self.execute_time = self.execute_time.saturating_add(other.execute_time);
        self.pipes_completed = self.pipes_completed.saturating_add(other.pipes_completed);
    }

    /// Add execution time of an attempt that moved no counted rows.
    pub fn add_execute_time(&mut self, elapsed: Duration) {
        self.execute_time = self.execute_time.saturating_add(elapsed);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Rows per second of cumulative execute time.
    pub fn rows_per_second(&self) -> u64 {
        let secs = self.execute_time.as_secs_f64();
        if secs > 0.0 {
            (self.rows_transferred as f64 / secs) as u64
        } else {
            0
        }
    }
}

impl AddAssign<&TransferStatistics> for TransferStatistics {
    fn add_assign(&mut self, rhs: &TransferStatistics) {
        self.merge(rhs);
    }
}

impl AddAssign for TransferStatistics {
    fn add_assign(&mut self, rhs: TransferStatistics) {
        self.merge(&rhs);
    }
}

impl Add for TransferStatistics {
    type Output = TransferStatistics;

    fn add(mut self, rhs: TransferStatistics) -> TransferStatistics {
        self.merge(&rhs);
        self
    }
}

impl Sum for TransferStatistics {
    fn sum<I: Iterator<Item = TransferStatistics>>(iter: I) -> Self {
        iter.fold(TransferStatistics::default(), Add::add)
    }
}

impl<'a> Sum<&'a TransferStatistics> for TransferStatistics {
    fn sum<I: Iterator<Item = &'a TransferStatistics>>(iter: I) -> Self {
        iter.fold(TransferStatistics::default(), |mut acc, s| {
            acc.merge(s);
            acc
        })
    }
}
