//! Batch processor - fans record ids out onto the worker pool.
//!
//! Every id becomes one task. Tasks report a [`TaskOutcome`] over a channel
//! to a single collector owned by the calling batch, so successes are
//! aggregated without any shared mutable state. Each task holds an
//! `OutcomeReporter` that reports exactly once: explicitly when the task
//! finishes, or as cancelled when the task is dropped unfinished.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use recbatch_core::{BatchId, Record, RecordId, StoreError, TaskError, TaskOutcome};

use crate::config::Config;
use crate::metrics::BatchReport;
use crate::pool::{PoolError, WorkerPool};
use crate::store::RecordStore;

/// Upper bound applied to the configured deadline so it always fits in an
/// `Instant`.
const MAX_BATCH_DEADLINE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Errors that abort a whole batch.
///
/// Individual record failures never surface here.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Batch timed out after {deadline:?} ({completed}/{submitted} tasks finished)")]
    Timeout {
        deadline: Duration,
        completed: usize,
        submitted: usize,
    },

    #[error("Batch processing was cancelled")]
    Cancelled,

    #[error("Batch execution failed: {0}")]
    Execution(#[from] PoolError),

    #[error("Failed to list record ids: {0}")]
    Store(#[from] StoreError),
}

/// Records and report of a completed batch.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Saved records of every successful task, in completion order.
    pub records: Vec<Record>,
    pub report: BatchReport,
}

/// Processes batches of records against a store.
pub struct BatchProcessor {
    store: Arc<dyn RecordStore>,
    pool: Arc<WorkerPool>,
    config: Config,
}

impl BatchProcessor {
    /// Create a processor that schedules onto `pool`.
    ///
    /// The pool is owned by the caller and may be shared between processors.
    pub fn new(store: Arc<dyn RecordStore>, pool: Arc<WorkerPool>, config: Config) -> Self {
        Self {
            store,
            pool,
            config,
        }
    }

    /// Process every record in the store.
    pub async fn process_all(&self) -> Result<Vec<Record>, BatchError> {
        self.process_all_with_cancel(CancellationToken::new()).await
    }

    /// Process every record in the store, giving up when `cancel` fires.
    ///
    /// Listing the ids counts against the same deadline as the tasks.
    pub async fn process_all_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> Result<Vec<Record>, BatchError> {
        let deadline = self.deadline();

        let ids = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Batch cancelled while listing record ids");
                return Err(BatchError::Cancelled);
            }
            listed = tokio::time::timeout_at(deadline, self.store.find_all_ids()) => match listed {
                Ok(ids) => ids?,
                Err(_) => {
                    warn!(
                        deadline = ?self.config.batch_deadline,
                        "Deadline elapsed while listing record ids"
                    );
                    return Err(BatchError::Timeout {
                        deadline: self.config.batch_deadline,
                        completed: 0,
                        submitted: 0,
                    });
                }
            },
        };

        self.run_batch(ids, cancel, deadline)
            .await
            .map(|output| output.records)
    }

    /// Process the given ids. Duplicates are processed once per occurrence.
    pub async fn process_ids(&self, ids: Vec<RecordId>) -> Result<Vec<Record>, BatchError> {
        self.process_ids_with_cancel(ids, CancellationToken::new())
            .await
    }

    pub async fn process_ids_with_cancel(
        &self,
        ids: Vec<RecordId>,
        cancel: CancellationToken,
    ) -> Result<Vec<Record>, BatchError> {
        self.execute(ids, cancel).await.map(|output| output.records)
    }

    /// Run one batch and return its records together with the run report.
    ///
    /// Fails with [`BatchError::Timeout`] when the configured deadline elapses
    /// first, and with [`BatchError::Cancelled`] when `cancel` fires first.
    /// Successes collected before either are discarded.
    pub async fn execute(
        &self,
        ids: Vec<RecordId>,
        cancel: CancellationToken,
    ) -> Result<BatchOutput, BatchError> {
        self.run_batch(ids, cancel, self.deadline()).await
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.config.batch_deadline.min(MAX_BATCH_DEADLINE)
    }

    async fn run_batch(
        &self,
        ids: Vec<RecordId>,
        cancel: CancellationToken,
        deadline: Instant,
    ) -> Result<BatchOutput, BatchError> {
        let batch_id = BatchId::generate();
        let submitted = ids.len();

        info!(
            batch_id = %batch_id,
            records = submitted,
            workers = self.pool.size(),
            deadline = ?self.config.batch_deadline,
            "Starting batch"
        );

        // Tasks still running when this call returns, or when its future is
        // dropped, are told to stop.
        let batch_token = cancel.child_token();
        let _abandon = batch_token.clone().drop_guard();

        let (tx, mut rx) = mpsc::unbounded_channel();
        for id in ids {
            let task = RecordTask {
                id,
                store: self.store.clone(),
                delay: self.config.task_delay,
                cancel: batch_token.clone(),
            };
            let reporter = OutcomeReporter::new(id, tx.clone());
            self.pool.submit(task.run(reporter))?;
        }
        drop(tx);

        let mut report = BatchReport::new(batch_id.clone(), submitted);
        let mut records = Vec::with_capacity(submitted);

        let waited = tokio::select! {
            biased;
            _ = cancel.cancelled() => Wait::Cancelled,
            collected = tokio::time::timeout_at(
                deadline,
                collect(&batch_id, &mut rx, &mut report, &mut records),
            ) => match collected {
                Ok(()) => Wait::Done,
                Err(_) => Wait::TimedOut,
            },
        };

        match waited {
            Wait::Done => {
                report.finish();
                info!(
                    batch_id = %batch_id,
                    submitted = report.submitted,
                    succeeded = report.succeeded,
                    not_found = report.not_found,
                    failed = report.failed,
                    duration_ms = report.duration_ms().unwrap_or_default(),
                    "Batch completed"
                );
                Ok(BatchOutput { records, report })
            }
            Wait::TimedOut => {
                warn!(
                    batch_id = %batch_id,
                    completed = report.completed(),
                    submitted,
                    "Batch deadline elapsed"
                );
                Err(BatchError::Timeout {
                    deadline: self.config.batch_deadline,
                    completed: report.completed(),
                    submitted,
                })
            }
            Wait::Cancelled => {
                warn!(
                    batch_id = %batch_id,
                    completed = report.completed(),
                    submitted,
                    "Batch cancelled by caller"
                );
                Err(BatchError::Cancelled)
            }
        }
    }
}

enum Wait {
    Done,
    TimedOut,
    Cancelled,
}

/// Drain outcomes until every task has reported.
async fn collect(
    batch_id: &BatchId,
    rx: &mut mpsc::UnboundedReceiver<TaskOutcome>,
    report: &mut BatchReport,
    records: &mut Vec<Record>,
) {
    while let Some(outcome) = rx.recv().await {
        report.observe(&outcome);
        match outcome {
            TaskOutcome::Success(record) => {
                debug!(batch_id = %batch_id, record_id = ?record.id, "Record processed");
                records.push(record);
            }
            TaskOutcome::NotFound(id) => {
                warn!(batch_id = %batch_id, record_id = %id, "Record not found, skipping");
            }
            TaskOutcome::Failed { id, error } => {
                warn!(
                    batch_id = %batch_id,
                    record_id = %id,
                    error = %error,
                    "Failed to process record"
                );
            }
        }
    }
}

/// Sends a task's outcome to the collector exactly once.
struct OutcomeReporter {
    id: RecordId,
    tx: Option<mpsc::UnboundedSender<TaskOutcome>>,
}

impl OutcomeReporter {
    fn new(id: RecordId, tx: mpsc::UnboundedSender<TaskOutcome>) -> Self {
        Self { id, tx: Some(tx) }
    }

    fn report(mut self, outcome: TaskOutcome) {
        if let Some(tx) = self.tx.take() {
            // The collector is gone once the batch has returned.
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for OutcomeReporter {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(TaskOutcome::failed(self.id, TaskError::Cancelled));
        }
    }
}

/// Work for a single record id.
struct RecordTask {
    id: RecordId,
    store: Arc<dyn RecordStore>,
    delay: Duration,
    cancel: CancellationToken,
}

impl RecordTask {
    async fn run(self, reporter: OutcomeReporter) {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => TaskOutcome::failed(self.id, TaskError::Cancelled),
            result = AssertUnwindSafe(self.process()).catch_unwind() => match result {
                Ok(outcome) => outcome,
                Err(panic) => TaskOutcome::failed(
                    self.id,
                    TaskError::Panicked(panic_message(panic.as_ref())),
                ),
            },
        };
        reporter.report(outcome);
    }

    async fn process(&self) -> TaskOutcome {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut record = match self.store.find_by_id(self.id).await {
            Ok(Some(record)) => record,
            Ok(None) => return TaskOutcome::NotFound(self.id),
            Err(e) => return TaskOutcome::failed(self.id, e),
        };

        record.mark_processed();

        match self.store.save(record).await {
            Ok(saved) if saved.is_processed() => TaskOutcome::Success(saved),
            Ok(saved) => TaskOutcome::failed(
                self.id,
                StoreError::Internal(format!("save returned status {}", saved.status)),
            ),
            Err(e) => TaskOutcome::failed(self.id, e),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
