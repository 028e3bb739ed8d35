//! Newtype wrappers for identifiers to ensure type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a Record.
///
/// Assigned by the record store on first save. Ids are numeric and ordered,
/// so stores can hand them out sequentially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Create a new RecordId from a raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id that follows this one, `None` at the end of the id space.
    pub const fn checked_next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for one batch run, used to correlate logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(String);

impl BatchId {
    /// Generate a new random BatchId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_id_generate() {
        let id1 = BatchId::generate();
        let id2 = BatchId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_display() {
        let id = RecordId::new(42);
        assert_eq!(format!("{}", id), "42");
    }

    #[test]
    fn test_record_id_next_and_order() {
        let id = RecordId::new(7);
        let next = id.checked_next().unwrap();
        assert_eq!(next.get(), 8);
        assert!(id < next);
        assert_eq!(RecordId::new(u64::MAX).checked_next(), None);
    }

    #[test]
    fn test_record_id_serializes_as_number() {
        let json = serde_json::to_string(&RecordId::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
