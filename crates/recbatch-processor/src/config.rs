//! Batch processor configuration.

use std::time::Duration;

/// Deadline for a whole batch when none is configured.
pub const DEFAULT_BATCH_DEADLINE: Duration = Duration::from_secs(30);

/// Worker count used when the host parallelism cannot be determined.
const FALLBACK_WORKER_COUNT: usize = 4;

/// Batch processor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of workers in the pool.
    pub worker_count: usize,

    /// Wall-clock budget for one batch, from submission to the last outcome.
    pub batch_deadline: Duration,

    /// Artificial delay each task waits before touching the store.
    pub task_delay: Duration,
}

impl Config {
    /// Builder method to set the worker count.
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Builder method to set the batch deadline.
    pub fn with_batch_deadline(mut self, deadline: Duration) -> Self {
        self.batch_deadline = deadline;
        self
    }

    /// Builder method to set the per-task delay.
    pub fn with_task_delay(mut self, delay: Duration) -> Self {
        self.task_delay = delay;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(FALLBACK_WORKER_COUNT),
            batch_deadline: DEFAULT_BATCH_DEADLINE,
            task_delay: Duration::ZERO,
        }
    }
}
