//! recbatch Processor Library
//!
//! Fans a batch of record ids out onto an explicitly sized worker pool,
//! collects per-record outcomes and enforces a single batch deadline.

pub mod config;
pub mod metrics;
pub mod pool;
pub mod processor;
pub mod store;

pub use config::Config;
pub use metrics::BatchReport;
pub use pool::{PoolError, WorkerPool};
pub use processor::{BatchError, BatchOutput, BatchProcessor};
pub use store::{InMemoryRecordStore, RecordStore};
