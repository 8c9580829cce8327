//! Object detector boundary and the tract-onnx YOLO implementation

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::DynamicImage;
use tract_onnx::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::DetectorConfig;
use crate::normalizer::RawDetection;
use crate::postprocess::{decode, DecodeParams, Layout};
use crate::DetectionError;

/// Raw boxes plus the dimensions of the image they refer to
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOutput {
    pub detections: Vec<RawDetection>,
    pub image_width: u32,
    pub image_height: u32,
}

/// Object detector.
///
/// Implementations are constructed once and shared read-only across
/// concurrent requests.
pub trait Detector: Send + Sync {
    /// Detect objects in a decoded image
    fn detect(&self, image: &DynamicImage) -> Result<DetectorOutput, DetectionError>;
}

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// YOLO detector running an ONNX export through tract
pub struct YoloDetector {
    model: OnnxPlan,
    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl YoloDetector {
    /// Load and optimize an ONNX model
    pub fn load(model_path: &str, config: &DetectorConfig) -> Result<Self, DetectionError> {
        info!("Loading detection model from {}", model_path);
        let size = config.input_size as usize;

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| DetectionError::ModelLoad(format!("{}: {}", model_path, e)))?;

        Ok(Self {
            model,
            input_size: config.input_size,
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
        })
    }

    fn preprocess(&self, image: &DynamicImage) -> Tensor {
        let size = self.input_size;
        let resized = imageops::resize(&image.to_rgb8(), size, size, FilterType::Triangle);

        tract_ndarray::Array4::from_shape_fn((1, 3, size as usize, size as usize), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        })
        .into_tensor()
    }
}

impl Detector for YoloDetector {
    fn detect(&self, image: &DynamicImage) -> Result<DetectorOutput, DetectionError> {
        let start = std::time::Instant::now();
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(DetectionError::Image("empty image".to_string()));
        }

        let input = self.preprocess(image);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| DetectionError::InvalidOutput(Vec::new()))?;
        let shape = output.shape().to_vec();
        let layout = Layout::from_shape(&shape).ok_or_else(|| DetectionError::InvalidOutput(shape.clone()))?;
        let data = output
            .as_slice::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let params = DecodeParams {
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            scale_x: width as f32 / self.input_size as f32,
            scale_y: height as f32 / self.input_size as f32,
            image_width: width as f32,
            image_height: height as f32,
        };
        let detections = decode(data, layout, &params);

        debug!(
            "Detected {} objects in {}ms",
            detections.len(),
            start.elapsed().as_millis()
        );

        Ok(DetectorOutput {
            detections,
            image_width: width,
            image_height: height,
        })
    }
}

/// A detector together with where it came from
pub struct LoadedDetector {
    pub detector: Arc<dyn Detector>,
    pub model_path: String,
    /// True when the secondary model had to be used
    pub is_fallback: bool,
}

/// Load the configured model, falling back to the secondary model
pub fn load_detector(config: &DetectorConfig) -> Result<LoadedDetector, DetectionError> {
    load_detector_with(config, |path| {
        YoloDetector::load(path, config).map(|d| Arc::new(d) as Arc<dyn Detector>)
    })
}

/// Load ladder with a pluggable loader
pub fn load_detector_with<F>(config: &DetectorConfig, load: F) -> Result<LoadedDetector, DetectionError>
where
    F: Fn(&str) -> Result<Arc<dyn Detector>, DetectionError>,
{
    let primary_err = match load(&config.model_path) {
        Ok(detector) => {
            info!("Custom detection model loaded: {}", config.model_path);
            return Ok(LoadedDetector {
                detector,
                model_path: config.model_path.clone(),
                is_fallback: false,
            });
        }
        Err(e) => e,
    };

    let Some(fallback_path) = &config.fallback_model_path else {
        error!("Detection model failed to load and no fallback is configured: {}", primary_err);
        return Err(primary_err);
    };

    warn!(
        "Custom model load failed: {} | using fallback model {}",
        primary_err, fallback_path
    );

    match load(fallback_path) {
        Ok(detector) => {
            info!("Fallback detection model loaded: {}", fallback_path);
            Ok(LoadedDetector {
                detector,
                model_path: fallback_path.clone(),
                is_fallback: true,
            })
        }
        Err(e) => {
            error!("Fallback detection model failed to load: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullDetector;

    impl Detector for NullDetector {
        fn detect(&self, image: &DynamicImage) -> Result<DetectorOutput, DetectionError> {
            Ok(DetectorOutput {
                detections: Vec::new(),
                image_width: image.width(),
                image_height: image.height(),
            })
        }
    }

    fn config() -> DetectorConfig {
        DetectorConfig {
            model_path: "custom.onnx".to_string(),
            fallback_model_path: Some("backup.onnx".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_primary_model_preferred() {
        let loaded = load_detector_with(&config(), |_| Ok(Arc::new(NullDetector) as Arc<dyn Detector>)).unwrap();
        assert_eq!(loaded.model_path, "custom.onnx");
        assert!(!loaded.is_fallback);
    }

    #[test]
    fn test_falls_back_to_secondary_model() {
        let loaded = load_detector_with(&config(), |path| {
            if path == "custom.onnx" {
                Err(DetectionError::ModelLoad("missing".to_string()))
            } else {
                Ok(Arc::new(NullDetector) as Arc<dyn Detector>)
            }
        })
        .unwrap();
        assert_eq!(loaded.model_path, "backup.onnx");
        assert!(loaded.is_fallback);
    }

    #[test]
    fn test_both_models_missing() {
        let result = load_detector_with(&config(), |path| {
            Err(DetectionError::ModelLoad(path.to_string()))
        });
        assert!(matches!(result, Err(DetectionError::ModelLoad(p)) if p == "backup.onnx"));
    }

    #[test]
    fn test_missing_onnx_file_is_load_error() {
        let result = YoloDetector::load("/nonexistent/model.onnx", &DetectorConfig::default());
        assert!(matches!(result, Err(DetectionError::ModelLoad(_))));
    }
}
