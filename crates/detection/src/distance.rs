//! Distance classification from relative box height
//!
//! A 2D frame has no depth channel, so distance is approximated by how much
//! of the image height an object occupies.

use serde::{Deserialize, Serialize};

/// Relative distance bucket, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistanceStatus {
    Far,
    Medium,
    Critical,
}

impl DistanceStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceStatus::Far => "FAR",
            DistanceStatus::Medium => "MEDIUM",
            DistanceStatus::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for DistanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Height-ratio thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceThresholds {
    /// Ratio above which an object is CRITICAL (default: 0.5)
    pub critical: f64,
    /// Ratio above which an object is MEDIUM (default: 0.2)
    pub warning: f64,
}

impl Default for DistanceThresholds {
    fn default() -> Self {
        Self {
            critical: 0.5,
            warning: 0.2,
        }
    }
}

impl DistanceThresholds {
    /// Classify a box height against the image height.
    ///
    /// `image_height` must be positive. Boundary ratios fall into the lower
    /// bucket.
    pub fn classify(&self, box_height: f64, image_height: f64) -> DistanceStatus {
        debug_assert!(image_height > 0.0, "image height must be positive");

        let ratio = box_height / image_height;

        if ratio > self.critical {
            DistanceStatus::Critical
        } else if ratio > self.warning {
            DistanceStatus::Medium
        } else {
            DistanceStatus::Far
        }
    }
}

/// Classify with the default thresholds
pub fn classify(box_height: f64, image_height: f64) -> DistanceStatus {
    DistanceThresholds::default().classify(box_height, image_height)
}
