//! Alerting System
//!
//! Decides which warnings become detection log entries and writes them.

mod manager;

pub use manager::{EventLogConfig, EventLogger, LogContext};
