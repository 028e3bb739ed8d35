//! recbatch Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - An async runtime
//! - A concrete record store
//! - Logging or configuration
//!
//! The batch processor and its collaborators are built on top of these.

pub mod error;
pub mod ids;
pub mod outcome;
pub mod record;
pub mod status;

// Re-export commonly used types
pub use error::{StoreError, TaskError};
pub use ids::{BatchId, RecordId};
pub use outcome::TaskOutcome;
pub use record::Record;
pub use status::RecordStatus;
