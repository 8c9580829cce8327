//! Normalization of raw detector output into detection summaries

use serde::{Deserialize, Serialize};

use crate::class::ObjectClass;
use crate::distance::{DistanceStatus, DistanceThresholds};

/// One box as emitted by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Detector class id
    pub class_id: u32,
    /// Detection confidence (0.0 to 1.0)
    pub confidence: f32,
    /// Bounding box [x1, y1, x2, y2] in image pixels
    pub bbox: [f32; 4],
}

/// Box extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

/// Normalized detection with its distance verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub class_id: u32,
    pub class_name: String,
    /// Rounded to 2 decimals
    pub confidence: f64,
    /// Rounded to 1 decimal
    pub bbox: [f64; 4],
    pub box_size: BoxSize,
    pub distance_status: DistanceStatus,
}

impl DetectionSummary {
    /// Known class, if the id is in the table
    pub fn object_class(&self) -> Option<ObjectClass> {
        ObjectClass::from_id(self.class_id)
    }

    /// Whether this object belongs to the high-risk set
    pub fn is_high_risk(&self) -> bool {
        self.object_class().map_or(false, |c| c.is_high_risk())
    }

    /// Compact label, e.g. `person → CRITICAL`
    pub fn label(&self) -> String {
        format!("{} → {}", self.class_name, self.distance_status)
    }
}

/// Normalize with the default distance thresholds
pub fn normalize(raw: &[RawDetection], image_height: u32) -> Vec<DetectionSummary> {
    normalize_with(raw, image_height, &DistanceThresholds::default())
}

/// Normalize raw detections.
///
/// Unknown class ids are kept under a synthesized `unknown_<id>` name.
/// Rounding only affects the reported values; classification uses the
/// detector's coordinates as-is.
pub fn normalize_with(
    raw: &[RawDetection],
    image_height: u32,
    thresholds: &DistanceThresholds,
) -> Vec<DetectionSummary> {
    raw.iter()
        .map(|det| {
            let [x1, y1, x2, y2] = det.bbox.map(f64::from);
            let box_height = y2 - y1;
            let box_width = x2 - x1;

            DetectionSummary {
                class_id: det.class_id,
                class_name: ObjectClass::name_for_id(det.class_id),
                confidence: round_to(f64::from(det.confidence), 2),
                bbox: [x1, y1, x2, y2].map(|v| round_to(v, 1)),
                box_size: BoxSize {
                    width: round_to(box_width, 1),
                    height: round_to(box_height, 1),
                },
                distance_status: thresholds.classify(box_height, f64::from(image_height)),
            }
        })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(class_id: u32, bbox: [f32; 4]) -> RawDetection {
        RawDetection {
            class_id,
            confidence: 0.876,
            bbox,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize(&[], 1000).is_empty());
    }

    #[test]
    fn test_boundary_box_is_far() {
        let summaries = normalize(&[raw(3, [10.0, 10.0, 20.0, 210.0])], 1000);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].class_name, "person");
        assert_eq!(summaries[0].box_size.height, 200.0);
        assert_eq!(summaries[0].distance_status, DistanceStatus::Far);
    }

    #[test]
    fn test_close_person_is_critical() {
        let summaries = normalize(&[raw(3, [0.0, 0.0, 50.0, 600.0])], 1000);
        assert_eq!(summaries[0].distance_status, DistanceStatus::Critical);
        assert!(summaries[0].is_high_risk());
        assert_eq!(summaries[0].label(), "person → CRITICAL");
    }

    #[test]
    fn test_unknown_class_is_kept() {
        let summaries = normalize(&[raw(42, [0.0, 0.0, 10.0, 10.0])], 100);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].class_name, "unknown_42");
        assert!(!summaries[0].is_high_risk());
    }

    #[test]
    fn test_rounding() {
        let summaries = normalize(&[raw(0, [1.26, 2.34, 101.97, 52.06])], 480);
        let s = &summaries[0];
        assert_eq!(s.confidence, 0.88);
        assert_eq!(s.bbox, [1.3, 2.3, 102.0, 52.1]);
        assert_eq!(s.box_size.width, 100.7);
        assert_eq!(s.box_size.height, 49.7);
    }

    #[test]
    fn test_classification_uses_unrounded_height() {
        // 100.04 rounds to 100.0 but the unrounded ratio is above 0.2
        let summaries = normalize(&[raw(1, [0.0, 0.0, 10.0, 100.04])], 500);
        assert_eq!(summaries[0].box_size.height, 100.0);
        assert_eq!(summaries[0].distance_status, DistanceStatus::Medium);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let input = vec![
            raw(0, [12.5, 40.25, 80.0, 300.75]),
            raw(4, [100.0, 100.0, 400.0, 900.0]),
            raw(9, [0.0, 0.0, 1.0, 1.0]),
        ];
        let first = serde_json::to_vec(&normalize(&input, 1080)).unwrap();
        let second = serde_json::to_vec(&normalize(&input, 1080)).unwrap();
        assert_eq!(first, second);
    }
}
