//! Core domain errors.

use thiserror::Error;

use crate::RecordId;

/// Errors reported by a record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the call.
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// A concurrent writer got there first.
    #[error("Write conflict on record {0}")]
    Conflict(RecordId),

    /// No ids are left to assign to new records.
    #[error("Record id space exhausted")]
    IdsExhausted,

    /// Any other store-side failure.
    #[error("Record store error: {0}")]
    Internal(String),
}

/// Why a single record's task failed.
///
/// Never fatal to a batch; the record is simply left out of the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Lookup or save failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The task was cancelled before it finished.
    #[error("Task cancelled")]
    Cancelled,

    /// The task panicked.
    #[error("Task panicked: {0}")]
    Panicked(String),
}
