//! Maritime Object Detection
//!
//! Turns drone and still imagery into structured detection summaries:
//! - Fixed class table for the five coastal categories
//! - Distance classification from relative box height
//! - Normalization of raw detector output
//! - YOLO inference through tract-onnx, with a secondary model fallback

pub mod class;
pub mod config;
pub mod detector;
pub mod distance;
pub mod normalizer;
mod postprocess;

pub use class::ObjectClass;
pub use config::DetectorConfig;
pub use detector::{load_detector, load_detector_with, Detector, DetectorOutput, LoadedDetector, YoloDetector};
pub use distance::{classify, DistanceStatus, DistanceThresholds};
pub use normalizer::{normalize, normalize_with, BoxSize, DetectionSummary, RawDetection};

use thiserror::Error;

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unexpected model output shape: {0:?}")]
    InvalidOutput(Vec<usize>),

    #[error("Image processing failed: {0}")]
    Image(String),
}
