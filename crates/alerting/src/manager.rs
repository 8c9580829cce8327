//! Detection Event Logger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use storage::{DetectionLog, DetectionLogEntry, MonthlyReport, StorageError};
use tracing::{debug, error, info};
use warning::TacticalWarning;

/// Event log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// JSON-lines log file
    pub path: PathBuf,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs/detections.log"),
        }
    }
}

/// Request details recorded alongside a warning
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    pub filename: String,
}

impl LogContext {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }
}

/// Appends qualifying warnings to the detection log
#[derive(Clone)]
pub struct EventLogger {
    log: Arc<DetectionLog>,
}

impl EventLogger {
    /// Open the configured log file
    pub fn open(config: &EventLogConfig) -> Result<Self, StorageError> {
        info!("Creating event logger at {}", config.path.display());
        Ok(Self::new(Arc::new(DetectionLog::open(&config.path)?)))
    }

    pub fn new(log: Arc<DetectionLog>) -> Self {
        Self { log }
    }

    /// Log `warning` if its level is CAUTION or ALERT.
    ///
    /// Returns whether an entry was written. Write failures are reported and
    /// swallowed. Performs blocking file I/O.
    pub fn log_if_qualifying(&self, warning: &TacticalWarning, ctx: &LogContext) -> bool {
        if !warning.level.is_reportable() {
            debug!(level = %warning.level, "Warning below logging threshold");
            return false;
        }

        let entry = DetectionLogEntry::from_warning(warning, &ctx.filename);
        match self.log.append(&entry) {
            Ok(()) => {
                info!(level = %warning.level, source = %warning.source, filename = %ctx.filename, "Detection event logged");
                metrics::counter!("coastwatch_log_writes_total").increment(1);
                true
            }
            Err(e) => {
                error!(filename = %ctx.filename, "Failed to write detection log: {}", e);
                metrics::counter!("coastwatch_log_write_failures_total").increment(1);
                false
            }
        }
    }

    /// Statistics for one month of the log
    pub fn monthly_report(&self, year: i32, month: u32) -> Result<MonthlyReport, StorageError> {
        let contents = self.log.read_entries()?;
        Ok(MonthlyReport::build(&contents.entries, year, month).with_skipped(contents.skipped))
    }
}
