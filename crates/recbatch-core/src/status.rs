//! Record status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a Record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// Record created, not yet touched by a batch.
    #[default]
    New,
    /// Record has been through a batch run.
    Processed,
}

impl RecordStatus {
    /// Returns true if the status is the terminal processed marker.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Processed => "PROCESSED",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
