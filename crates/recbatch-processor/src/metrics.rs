//! Batch run reports and their Prometheus text rendering.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use recbatch_core::{BatchId, TaskOutcome};

/// Summary of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub batch_id: BatchId,

    /// Number of tasks handed to the pool.
    pub submitted: usize,

    pub succeeded: usize,
    pub not_found: usize,
    pub failed: usize,

    pub started_at: DateTime<Utc>,

    /// Set once every outcome has been collected.
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchReport {
    /// Start a report for a batch of `submitted` tasks.
    pub fn new(batch_id: BatchId, submitted: usize) -> Self {
        Self {
            batch_id,
            submitted,
            succeeded: 0,
            not_found: 0,
            failed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Count one outcome.
    pub fn observe(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Success(_) => self.succeeded += 1,
            TaskOutcome::NotFound(_) => self.not_found += 1,
            TaskOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Number of tasks that have reported so far.
    pub fn completed(&self) -> usize {
        self.succeeded + self.not_found + self.failed
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall time of the run in milliseconds, if finished.
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds())
    }
}

/// Format a report as Prometheus text.
pub fn render(report: &BatchReport) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "# HELP recbatch_tasks_total Tasks in the batch by outcome"
    )
    .ok();
    writeln!(output, "# TYPE recbatch_tasks_total gauge").ok();
    writeln!(
        output,
        "recbatch_tasks_total{{outcome=\"submitted\"}} {}",
        report.submitted
    )
    .ok();
    writeln!(
        output,
        "recbatch_tasks_total{{outcome=\"succeeded\"}} {}",
        report.succeeded
    )
    .ok();
    writeln!(
        output,
        "recbatch_tasks_total{{outcome=\"not_found\"}} {}",
        report.not_found
    )
    .ok();
    writeln!(
        output,
        "recbatch_tasks_total{{outcome=\"failed\"}} {}",
        report.failed
    )
    .ok();

    if let Some(ms) = report.duration_ms() {
        writeln!(output).ok();
        writeln!(
            output,
            "# HELP recbatch_batch_duration_milliseconds Wall time of the batch"
        )
        .ok();
        writeln!(output, "# TYPE recbatch_batch_duration_milliseconds gauge").ok();
        writeln!(output, "recbatch_batch_duration_milliseconds {ms}").ok();
    }

    output
}
