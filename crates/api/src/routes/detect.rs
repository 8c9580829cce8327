//! Detection Route

use alerting::LogContext;
use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Local;
use detection::{normalize_with, DetectionSummary, DetectorOutput};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use warning::TacticalWarning;

use crate::error::ApiError;
use crate::AppState;

/// Uploaded image dimensions
#[derive(Debug, Serialize)]
pub struct ImageInfo {
    pub filename: String,
    pub height: u32,
    pub width: u32,
}

/// Response for the detect endpoint
#[derive(Debug, Serialize)]
pub struct DetectionResponse {
    pub status: String,
    pub timestamp: String,
    pub processing_time_seconds: f64,
    pub image_info: ImageInfo,
    pub detections: Vec<DetectionSummary>,
    pub detected_objects: Vec<String>,
    pub warning: TacticalWarning,
}

struct Upload {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        return Ok(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::BadRequest("Missing multipart field `file`".to_string()))
}

/// Detect objects in an uploaded image and produce a tactical warning
pub async fn detect(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<DetectionResponse>, ApiError> {
    let start = Instant::now();
    metrics::counter!("coastwatch_detect_requests_total").increment(1);

    let upload = read_upload(&mut multipart).await?;
    let is_image = upload
        .content_type
        .as_deref()
        .map_or(false, |ct| ct.starts_with("image/"));
    if !is_image {
        warn!(filename = %upload.filename, content_type = ?upload.content_type, "Rejected non-image upload");
        return Err(ApiError::BadRequest("Only image files can be uploaded".to_string()));
    }

    let detector = state.detector.as_ref().map(|d| Arc::clone(&d.detector));
    let bytes = upload.bytes;
    let output: DetectorOutput = tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("Cannot decode image: {}", e)))?;
        let detector = detector.ok_or(ApiError::ModelUnavailable)?;
        detector.detect(&image).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Detection task failed: {}", e)))??;

    if output.image_height == 0 {
        return Err(ApiError::BadRequest("Image has zero height".to_string()));
    }

    let detections = normalize_with(&output.detections, output.image_height, &state.thresholds);
    let detected_objects: Vec<String> = detections.iter().map(DetectionSummary::label).collect();
    info!(
        filename = %upload.filename,
        count = detections.len(),
        "Detection complete"
    );

    // Runs to completion even if the client disconnects
    let ctx = LogContext::new(upload.filename.clone());
    let pipeline = Arc::clone(&state.pipeline);
    let task_detections = detections.clone();
    let task_ctx = ctx.clone();
    let handle = tokio::spawn(async move { pipeline.run(&task_detections, &task_ctx).await });

    let warning = match handle.await {
        Ok(warning) => warning,
        Err(e) => state.pipeline.aborted(detections.clone(), &ctx, &e.to_string()).await,
    };

    let elapsed = start.elapsed().as_secs_f64();
    Ok(Json(DetectionResponse {
        status: "success".to_string(),
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        processing_time_seconds: (elapsed * 100.0).round() / 100.0,
        image_info: ImageInfo {
            filename: upload.filename,
            height: output.image_height,
            width: output.image_width,
        },
        detections,
        detected_objects,
        warning,
    }))
}
