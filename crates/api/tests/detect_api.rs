//! Integration tests for the detection API
//!
//! Drives the router in-process with a stub detector and the rule-based
//! warning path.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use alerting::{EventLogConfig, EventLogger};
use async_trait::async_trait;
use api::{create_router, AppState, WarningPipeline};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use detection::{DetectionError, Detector, DetectorOutput, LoadedDetector, RawDetection};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::Value;
use speech::Narrator;
use tower::ServiceExt;
use warning::{BackendError, ChatMessage, GeneratorConfig, TextBackend, WarningGenerator};

const BOUNDARY: &str = "coastwatch-test-boundary";

/// Returns a fixed set of boxes for every image
struct StubDetector {
    boxes: Vec<RawDetection>,
}

impl Detector for StubDetector {
    fn detect(&self, image: &DynamicImage) -> Result<DetectorOutput, DetectionError> {
        Ok(DetectorOutput {
            detections: self.boxes.clone(),
            image_width: image.width(),
            image_height: image.height(),
        })
    }
}

struct FailingDetector;

impl Detector for FailingDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<DetectorOutput, DetectionError> {
        Err(DetectionError::Inference("tensor shape mismatch".to_string()))
    }
}

/// Text backend whose task dies mid-request
struct PanickingBackend;

#[async_trait]
impl TextBackend for PanickingBackend {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, BackendError> {
        panic!("text backend crashed")
    }
}

struct TestApp {
    router: Router,
    log_path: PathBuf,
    _dir: tempfile::TempDir,
}

fn setup(detector: Option<Arc<dyn Detector>>) -> TestApp {
    setup_with_backend(detector, None)
}

fn setup_with_backend(detector: Option<Arc<dyn Detector>>, backend: Option<Arc<dyn TextBackend>>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("detections.log");
    let event_logger = EventLogger::open(&EventLogConfig { path: log_path.clone() }).unwrap();

    let pipeline = WarningPipeline::new(
        WarningGenerator::new(backend, GeneratorConfig::default()),
        Narrator::disabled(),
        event_logger,
    );
    let loaded = detector.map(|detector| LoadedDetector {
        detector,
        model_path: "models/stub.onnx".to_string(),
        is_fallback: false,
    });

    TestApp {
        router: create_router(Arc::new(AppState::new(loaded, pipeline))),
        log_path,
        _dir: dir,
    }
}

fn stub(boxes: Vec<RawDetection>) -> Option<Arc<dyn Detector>> {
    Some(Arc::new(StubDetector { boxes }))
}

fn person(bbox: [f32; 4]) -> RawDetection {
    RawDetection {
        class_id: 3,
        confidence: 0.91,
        bbox,
    }
}

/// PNG of the given size
fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn multipart_request(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/detect")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn log_lines(app: &TestApp) -> Vec<Value> {
    std::fs::read_to_string(&app.log_path)
        .unwrap_or_default()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn test_boundary_ratio_is_far_and_safe() {
    let app = setup(stub(vec![person([10.0, 10.0, 20.0, 210.0])]));

    let (status, body) = send(&app, multipart_request("file", "shore.png", "image/png", &png(8, 1000))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["image_info"]["height"], 1000);
    assert_eq!(body["detections"][0]["distance_status"], "FAR");
    assert_eq!(body["detected_objects"][0], "person → FAR");
    assert_eq!(body["warning"]["level"], "SAFE");
    assert_eq!(body["warning"]["source"], "FALLBACK");
    assert!(body["warning"].get("audio").is_none());
    assert!(log_lines(&app).is_empty());
}

#[tokio::test]
async fn test_close_person_alerts_and_logs_once() {
    let app = setup(stub(vec![person([0.0, 0.0, 50.0, 600.0])]));

    let (status, body) = send(&app, multipart_request("file", "beach.png", "image/png", &png(64, 1000))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detections"][0]["class_name"], "person");
    assert_eq!(body["detections"][0]["distance_status"], "CRITICAL");
    assert_eq!(body["warning"]["level"], "ALERT");
    assert_eq!(body["warning"]["source"], "FALLBACK");

    let lines = log_lines(&app);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "ALERT");
    assert_eq!(lines[0]["filename"], "beach.png");
    assert_eq!(lines[0]["schema_version"], 1);
    assert_eq!(lines[0]["detected_objects"][0], "person → CRITICAL");
}

#[tokio::test]
async fn test_crashed_generation_still_answers() {
    let app = setup_with_backend(
        stub(vec![person([10.0, 10.0, 20.0, 210.0])]),
        Some(Arc::new(PanickingBackend)),
    );

    let (status, body) = send(&app, multipart_request("file", "pier.png", "image/png", &png(8, 1000))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["warning"]["source"], "ERROR");
    assert_eq!(body["warning"]["level"], "CAUTION");
    assert_eq!(body["warning"]["action"], "Manual check required");
    assert_eq!(body["detections"][0]["distance_status"], "FAR");

    let lines = log_lines(&app);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["source"], "ERROR");
    assert_eq!(lines[0]["filename"], "pier.png");
}

#[tokio::test]
async fn test_no_detections_is_empty_source() {
    let app = setup(stub(Vec::new()));

    let (status, body) = send(&app, multipart_request("file", "sea.png", "image/png", &png(32, 32))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["warning"]["level"], "SAFE");
    assert_eq!(body["warning"]["source"], "EMPTY");
    assert_eq!(body["detections"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_non_image_rejected() {
    let app = setup(stub(Vec::new()));

    let (status, body) = send(&app, multipart_request("file", "notes.txt", "text/plain", b"hello")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_undecodable_image_rejected() {
    let app = setup(stub(Vec::new()));

    let (status, _) = send(&app, multipart_request("file", "broken.png", "image/png", b"not a png")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_file_field_rejected() {
    let app = setup(stub(Vec::new()));

    let (status, _) = send(&app, multipart_request("image", "a.png", "image/png", &png(4, 4))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detector_failure_is_server_error() {
    let app = setup(Some(Arc::new(FailingDetector)));

    let (status, body) = send(&app, multipart_request("file", "a.png", "image/png", &png(4, 4))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
}

#[tokio::test]
async fn test_without_model_detect_unavailable() {
    let app = setup(None);

    let (status, body) = send(&app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], false);
    assert!(body["model_path"].is_null());

    let (status, _) = send(&app, multipart_request("file", "a.png", "image/png", &png(4, 4))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health_reports_model() {
    let app = setup(stub(Vec::new()));

    let (status, body) = send(&app, get("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_path"], "models/stub.onnx");
    assert_eq!(body["fallback_model"], false);
    assert_eq!(body["text_backend"], false);
    assert_eq!(body["speech_enabled"], false);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_monthly_report_counts_logged_events() {
    let app = setup(stub(vec![person([0.0, 0.0, 50.0, 600.0])]));

    for name in ["a.png", "b.png"] {
        let (status, _) = send(&app, multipart_request("file", name, "image/png", &png(16, 1000))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, get("/api/v1/reports/monthly")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["by_level"]["ALERT"], 2);
    assert_eq!(body["by_object"][0]["name"], "person");
    assert_eq!(body["skipped_lines"], 0);
}

#[tokio::test]
async fn test_monthly_report_rejects_bad_month() {
    let app = setup(stub(Vec::new()));

    let (status, body) = send(&app, get("/api/v1/reports/monthly?year=2025&month=13")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, body) = send(&app, get("/api/v1/reports/monthly?year=2020&month=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_root_and_metrics() {
    let app = setup(stub(Vec::new()));

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["health_check"], "/api/v1/health");

    let (status, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
