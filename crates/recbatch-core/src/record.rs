//! The Record entity.

use serde::{Deserialize, Serialize};

use crate::{RecordId, RecordStatus};

/// A persisted entity that batches process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned id. `None` until the first save.
    pub id: Option<RecordId>,

    /// Display name.
    pub name: String,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Current status.
    #[serde(default)]
    pub status: RecordStatus,

    /// Contact email, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Record {
    /// Create a new unsaved Record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            status: RecordStatus::New,
            email: None,
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// Builder method to set description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder method to set status.
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    /// Apply the batch transformation.
    ///
    /// Idempotent: an already processed record stays processed.
    pub fn mark_processed(&mut self) {
        self.status = RecordStatus::Processed;
    }

    /// Check if the record is in the terminal state.
    pub fn is_processed(&self) -> bool {
        self.status.is_terminal()
    }
}
