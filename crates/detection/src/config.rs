//! Detector configuration

use serde::{Deserialize, Serialize};

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Custom-trained coastal model
    pub model_path: String,

    /// Lower-capability model loaded when the custom model is unavailable
    pub fallback_model_path: Option<String>,

    /// Minimum class score kept after decoding
    pub confidence_threshold: f32,

    /// IoU above which overlapping boxes of the same class are suppressed
    pub iou_threshold: f32,

    /// Square model input size in pixels
    pub input_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/coastwatch-yolo11s.onnx".to_string(),
            fallback_model_path: Some("models/yolov8n.onnx".to_string()),
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            input_size: 640,
        }
    }
}
