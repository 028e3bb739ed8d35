//! Per-record task outcomes.

use crate::{Record, RecordId, TaskError};

/// Result of processing one identifier.
///
/// Exists only while a batch is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The record was transformed and saved.
    Success(Record),
    /// No record exists for the id.
    NotFound(RecordId),
    /// Lookup, save or scheduling failed for the id.
    Failed { id: RecordId, error: TaskError },
}

impl TaskOutcome {
    /// Build a failed outcome.
    pub fn failed(id: RecordId, error: impl Into<TaskError>) -> Self {
        Self::Failed {
            id,
            error: error.into(),
        }
    }
}
