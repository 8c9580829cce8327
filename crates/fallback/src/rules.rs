//! Deterministic assessment rules

use detection::{DetectionSummary, DistanceStatus};
use tracing::debug;

use crate::level::{Assessment, WarningLevel};

const ACTION_ALERT: &str = "Verify visually and report up the chain immediately.";
const ACTION_CAUTION: &str = "Continue observing movement.";
const ACTION_SAFE: &str = "Maintain normal watch.";

/// Rule engine used when text generation is unavailable
#[derive(Debug, Clone, Default)]
pub struct FallbackEngine;

impl FallbackEngine {
    /// Create a new fallback engine
    pub fn new() -> Self {
        Self
    }

    /// Assess a set of detections.
    ///
    /// - any high-risk class at CRITICAL distance → ALERT
    /// - otherwise any MEDIUM detection → CAUTION
    /// - otherwise SAFE
    pub fn evaluate(&self, detections: &[DetectionSummary]) -> Assessment {
        let critical: Vec<&DetectionSummary> = detections
            .iter()
            .filter(|d| d.distance_status == DistanceStatus::Critical)
            .collect();
        let medium_count = detections
            .iter()
            .filter(|d| d.distance_status == DistanceStatus::Medium)
            .count();
        let has_high_risk = critical.iter().any(|d| d.is_high_risk());

        debug!(
            critical = critical.len(),
            medium = medium_count,
            has_high_risk,
            "Evaluating fallback rules"
        );

        if !critical.is_empty() && has_high_risk {
            return Assessment::new(
                WarningLevel::Alert,
                format!(
                    "{} at close range, including high-risk targets.",
                    count_phrase(critical.len())
                ),
                ACTION_ALERT,
            );
        }

        if medium_count > 0 {
            return Assessment::new(
                WarningLevel::Caution,
                format!("{} at medium range.", count_phrase(medium_count)),
                ACTION_CAUTION,
            );
        }

        let summary = if critical.is_empty() {
            "Only distant objects observed.".to_string()
        } else {
            format!(
                "{} at close range, none in a high-risk category.",
                count_phrase(critical.len())
            )
        };

        Assessment::new(WarningLevel::Safe, summary, ACTION_SAFE)
    }
}

fn count_phrase(n: usize) -> String {
    if n == 1 {
        "1 object detected".to_string()
    } else {
        format!("{} objects detected", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection::{normalize, RawDetection};

    /// Summaries on a 1000px-tall image; heights pick the distance bucket
    fn summaries(items: &[(u32, f32)]) -> Vec<DetectionSummary> {
        let raw: Vec<RawDetection> = items
            .iter()
            .map(|&(class_id, height)| RawDetection {
                class_id,
                confidence: 0.9,
                bbox: [0.0, 0.0, 50.0, height],
            })
            .collect();
        normalize(&raw, 1000)
    }

    const PERSON: u32 = 3;
    const MERCHANT: u32 = 1;
    const WARSHIP: u32 = 2;

    #[test]
    fn test_close_person_is_alert() {
        let result = FallbackEngine::new().evaluate(&summaries(&[(PERSON, 600.0)]));
        assert_eq!(result.level, WarningLevel::Alert);
        assert!(result.summary.contains('1'));
        assert_eq!(result.action, ACTION_ALERT);
    }

    #[test]
    fn test_alert_counts_all_critical() {
        let result = FallbackEngine::new().evaluate(&summaries(&[
            (PERSON, 600.0),
            (MERCHANT, 700.0),
            (WARSHIP, 100.0),
        ]));
        assert_eq!(result.level, WarningLevel::Alert);
        assert!(result.summary.starts_with("2 objects"));
    }

    #[test]
    fn test_medium_range_is_caution() {
        let result = FallbackEngine::new().evaluate(&summaries(&[(WARSHIP, 300.0), (MERCHANT, 250.0)]));
        assert_eq!(result.level, WarningLevel::Caution);
        assert!(result.summary.starts_with("2 objects"));
        assert_eq!(result.action, ACTION_CAUTION);
    }

    #[test]
    fn test_close_low_risk_with_medium_is_caution() {
        let result = FallbackEngine::new().evaluate(&summaries(&[(MERCHANT, 800.0), (PERSON, 300.0)]));
        assert_eq!(result.level, WarningLevel::Caution);
    }

    #[test]
    fn test_close_low_risk_only_is_safe() {
        let result = FallbackEngine::new().evaluate(&summaries(&[(MERCHANT, 800.0)]));
        assert_eq!(result.level, WarningLevel::Safe);
        assert!(result.summary.contains("none in a high-risk category"));
    }

    #[test]
    fn test_unknown_class_close_is_not_high_risk() {
        let result = FallbackEngine::new().evaluate(&summaries(&[(12, 900.0)]));
        assert_eq!(result.level, WarningLevel::Safe);
    }

    #[test]
    fn test_distant_only_is_safe() {
        let result = FallbackEngine::new().evaluate(&summaries(&[(PERSON, 200.0), (WARSHIP, 50.0)]));
        assert_eq!(result.level, WarningLevel::Safe);
        assert_eq!(result.summary, "Only distant objects observed.");
        assert_eq!(result.action, ACTION_SAFE);
    }

    #[test]
    fn test_empty_is_safe() {
        let result = FallbackEngine::new().evaluate(&[]);
        assert_eq!(result.level, WarningLevel::Safe);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn alert_iff_close_high_risk(items in prop::collection::vec((0u32..6, 1.0f32..1000.0), 0..12)) {
                let dets = summaries(&items);
                let result = FallbackEngine::new().evaluate(&dets);

                let close_high_risk = dets
                    .iter()
                    .any(|d| d.distance_status == DistanceStatus::Critical && d.is_high_risk());
                let any_medium = dets.iter().any(|d| d.distance_status == DistanceStatus::Medium);

                let expected = if close_high_risk {
                    WarningLevel::Alert
                } else if any_medium {
                    WarningLevel::Caution
                } else {
                    WarningLevel::Safe
                };
                prop_assert_eq!(result.level, expected);
                prop_assert!(!result.summary.is_empty());
                prop_assert!(!result.action.is_empty());
            }
        }
    }
}
