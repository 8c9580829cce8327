//! Warning levels and assessments

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Tactical warning level, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningLevel {
    #[serde(alias = "안전")]
    Safe,
    #[serde(alias = "주의")]
    Caution,
    #[serde(alias = "경보")]
    Alert,
}

impl WarningLevel {
    /// All levels, least severe first
    pub const ALL: [WarningLevel; 3] = [WarningLevel::Safe, WarningLevel::Caution, WarningLevel::Alert];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningLevel::Safe => "SAFE",
            WarningLevel::Caution => "CAUTION",
            WarningLevel::Alert => "ALERT",
        }
    }

    /// Operator-facing Korean label
    pub fn korean_label(&self) -> &'static str {
        match self {
            WarningLevel::Safe => "안전",
            WarningLevel::Caution => "주의",
            WarningLevel::Alert => "경보",
        }
    }

    /// Whether an event at this level goes to the detection log
    pub fn is_reportable(&self) -> bool {
        *self >= WarningLevel::Caution
    }
}

impl std::fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A level string outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown warning level: {0:?}")]
pub struct UnknownLevel(pub String);

impl FromStr for WarningLevel {
    type Err = UnknownLevel;

    /// Accepts the English names in any case, optionally bracketed, and the
    /// Korean labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']').trim();
        let upper = trimmed.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == upper || level.korean_label() == trimmed)
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

/// Level, summary, and recommended action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub level: WarningLevel,
    pub summary: String,
    pub action: String,
}

impl Assessment {
    pub fn new(level: WarningLevel, summary: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            level,
            summary: summary.into(),
            action: action.into(),
        }
    }
}
