//! Warning types

use chrono::{DateTime, Local};
use detection::DetectionSummary;
use fallback::{Assessment, WarningLevel};
use serde::{Deserialize, Serialize};

/// Which path produced a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningSource {
    /// Generated by the text backend
    Primary,
    /// Deterministic rule engine
    Fallback,
    /// Nothing was detected
    Empty,
    /// The generation task itself failed
    Error,
}

impl WarningSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningSource::Primary => "PRIMARY",
            WarningSource::Fallback => "FALLBACK",
            WarningSource::Empty => "EMPTY",
            WarningSource::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for WarningSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthesized speech, base64-encoded on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    /// Container format, e.g. `mp3`
    pub format: String,
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
}

/// Leveled natural-language warning for one inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalWarning {
    pub level: WarningLevel,
    pub summary: String,
    pub action: String,
    pub source: WarningSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioClip>,
    pub raw_detections: Vec<DetectionSummary>,
    pub timestamp: DateTime<Local>,
}

impl TacticalWarning {
    /// Build a warning stamped with the current time
    pub fn new(assessment: Assessment, source: WarningSource, raw_detections: Vec<DetectionSummary>) -> Self {
        Self {
            level: assessment.level,
            summary: assessment.summary,
            action: assessment.action,
            source,
            audio: None,
            raw_detections,
            timestamp: Local::now(),
        }
    }

    /// Warning for a generation task that aborted
    pub fn error(raw_detections: Vec<DetectionSummary>) -> Self {
        Self::new(
            Assessment::new(WarningLevel::Caution, "Warning generation failed", "Manual check required"),
            WarningSource::Error,
            raw_detections,
        )
    }

    /// Detection labels in input order
    pub fn detected_labels(&self) -> Vec<String> {
        self.raw_detections.iter().map(DetectionSummary::label).collect()
    }

    /// Text handed to speech synthesis
    pub fn spoken_text(&self) -> String {
        match self.source {
            WarningSource::Primary => format!(
                "[{}] {}. {}",
                self.level,
                self.summary.trim_end_matches('.'),
                self.action
            ),
            _ => format!("[{}] {}", self.level, self.summary),
        }
    }
}

mod base64_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
