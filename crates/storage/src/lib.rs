//! Storage Layer
//!
//! Append-only JSON-lines detection log and its monthly aggregation.

mod entry;
mod log;
mod report;

pub use entry::{DetectionLogEntry, LoggedObject, SCHEMA_VERSION};
pub use log::{read_log, DetectionLog, LogContents};
pub use report::{MonthlyReport, ObjectCount};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}
