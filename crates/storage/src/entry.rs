//! Detection log records

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use detection::{DistanceStatus, ObjectClass};
use serde::{Deserialize, Deserializer, Serialize};
use warning::{TacticalWarning, WarningLevel, WarningSource};

/// Current log line format
pub const SCHEMA_VERSION: u32 = 1;

/// Object reference kept with a log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedObject {
    pub class_name: String,
    pub distance_status: DistanceStatus,
}

/// One line of the detection log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionLogEntry {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Local>,
    pub level: WarningLevel,
    pub summary: String,
    pub action: String,
    #[serde(default = "default_source")]
    pub source: WarningSource,
    /// Labels such as `person → CRITICAL`
    #[serde(default)]
    pub detected_objects: Vec<String>,
    #[serde(default)]
    pub objects: Vec<LoggedObject>,
    pub filename: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_source() -> WarningSource {
    WarningSource::Primary
}

impl DetectionLogEntry {
    /// Record a warning for an uploaded file
    pub fn from_warning(warning: &TacticalWarning, filename: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            timestamp: warning.timestamp,
            level: warning.level,
            summary: warning.summary.clone(),
            action: warning.action.clone(),
            source: warning.source,
            detected_objects: warning.detected_labels(),
            objects: warning
                .raw_detections
                .iter()
                .map(|d| LoggedObject {
                    class_name: d.class_name.clone(),
                    distance_status: d.distance_status,
                })
                .collect(),
            filename: filename.to_string(),
        }
    }

    /// Class names of the logged objects.
    ///
    /// Lines written before `objects` existed only carry labels, so the name
    /// is taken from the part before the arrow. Korean class labels from
    /// those lines resolve to the canonical class name.
    pub fn object_names(&self) -> Vec<String> {
        if !self.objects.is_empty() {
            return self.objects.iter().map(|o| o.class_name.clone()).collect();
        }
        self.detected_objects
            .iter()
            .filter_map(|label| label.split('→').next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| match ObjectClass::from_label(name) {
                Some(class) => class.as_str().to_string(),
                None => name.to_string(),
            })
            .collect()
    }
}

/// RFC 3339, or the legacy `YYYY-MM-DD HH:MM:SS` local time
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Local>, D::Error> {
    let raw = String::deserialize(deserializer)?;

    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S").map_err(serde::de::Error::custom)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| serde::de::Error::custom(format!("nonexistent local time: {}", raw)))
}
