//! Append-only JSON-lines detection log

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::entry::DetectionLogEntry;
use crate::StorageError;

/// Parsed log file
#[derive(Debug, Clone, Default)]
pub struct LogContents {
    pub entries: Vec<DetectionLogEntry>,
    /// Lines that could not be parsed
    pub skipped: usize,
}

/// Detection log opened for appending.
///
/// Every entry is serialized in full before the lock is taken and written
/// with a single `write_all`, so concurrent appends never interleave.
pub struct DetectionLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl DetectionLog {
    /// Open (or create) the log at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("Detection log opened at {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append one entry as a single line
    pub fn append(&self, entry: &DetectionLogEntry) -> Result<(), StorageError> {
        let mut line = serde_json::to_vec(entry).map_err(|e| StorageError::Serialization(e.to_string()))?;
        line.push(b'\n');

        let mut file = self
            .file
            .lock()
            .map_err(|e| StorageError::Io(std::io::Error::new(ErrorKind::Other, format!("Lock error: {}", e))))?;
        file.write_all(&line)?;

        debug!(level = %entry.level, filename = %entry.filename, "Detection log entry appended");
        Ok(())
    }

    /// Read back every entry written so far
    pub fn read_entries(&self) -> Result<LogContents, StorageError> {
        read_log(&self.path)
    }
}

/// Read a detection log, skipping malformed lines.
///
/// A missing file reads as an empty log.
pub fn read_log(path: impl AsRef<Path>) -> Result<LogContents, StorageError> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Detection log {} does not exist yet", path.display());
            return Ok(LogContents::default());
        }
        Err(e) => return Err(e.into()),
    };

    let mut contents = LogContents::default();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<DetectionLogEntry>(&line) {
            Ok(entry) => contents.entries.push(entry),
            Err(e) => {
                warn!("Skipping malformed log line {}: {}", index + 1, e);
                contents.skipped += 1;
            }
        }
    }

    Ok(contents)
}
