//! Coastwatch API Server
//!
//! HTTP boundary for image uploads, service health, and monthly detection
//! reports.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use anyhow::Context;
use chrono::Local;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub mod error;
pub mod pipeline;
pub mod rate_limit;
mod routes;
pub mod settings;

pub use error::ApiError;
pub use pipeline::WarningPipeline;
pub use rate_limit::{create_governor_config, RateLimitConfig};
pub use settings::{LoggingConfig, ServerConfig, Settings};
pub use routes::detect::{DetectionResponse, ImageInfo};

use alerting::EventLogger;
use detection::{load_detector, DistanceThresholds, LoadedDetector};
use speech::{Narrator, OpenAiSpeech, SpeechSynthesizer};
use warning::{OpenAiChatBackend, TextBackend, WarningGenerator};

/// Application state shared across handlers.
///
/// Built once at startup and read-only afterwards.
pub struct AppState {
    /// `None` when no model could be loaded
    pub detector: Option<LoadedDetector>,
    pub thresholds: DistanceThresholds,
    pub pipeline: Arc<WarningPipeline>,
    /// Prometheus handle, present when the exporter is installed
    pub metrics: Option<PrometheusHandle>,
    pub rate_limit: RateLimitConfig,
    pub max_upload_bytes: usize,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    /// Create state with default thresholds and no rate limiting
    pub fn new(detector: Option<LoadedDetector>, pipeline: WarningPipeline) -> Self {
        Self {
            detector,
            thresholds: DistanceThresholds::default(),
            pipeline: Arc::new(pipeline),
            metrics: None,
            rate_limit: RateLimitConfig::disabled(),
            max_upload_bytes: ServerConfig::default().max_upload_bytes,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: DistanceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_limits(mut self, rate_limit: RateLimitConfig, max_upload_bytes: usize) -> Self {
        self.rate_limit = rate_limit;
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_path: Option<String>,
    /// True when the secondary model is serving
    pub fallback_model: bool,
    /// False when every warning comes from the rule engine
    pub text_backend: bool,
    pub speech_enabled: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut detect_routes: Router<Arc<AppState>> =
        Router::new().route("/api/v1/detect", post(routes::detect::detect));

    match create_governor_config(&state.rate_limit) {
        Some(config) => detect_routes = detect_routes.layer(GovernorLayer { config }),
        None if state.rate_limit.enabled => warn!("Invalid rate limit settings, uploads are not rate limited"),
        None => {}
    }

    Router::new()
        .route("/", get(root_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/reports/monthly", get(routes::reports::get_monthly))
        .route("/metrics", get(metrics_handler))
        .merge(detect_routes)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Service information
async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Coastwatch coastal surveillance API",
        "version": state.version,
        "health_check": "/api/v1/health",
        "detect": "/api/v1/detect",
        "monthly_report": "/api/v1/reports/monthly",
    }))
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.detector.is_some(),
        model_path: state.detector.as_ref().map(|d| d.model_path.clone()),
        fallback_model: state.detector.as_ref().map_or(false, |d| d.is_fallback),
        text_backend: state.pipeline.has_text_backend(),
        speech_enabled: state.pipeline.speech_enabled(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    Json(response)
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed").into_response(),
    }
}

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

/// Assemble the detector, warning pipeline and event log from settings
pub async fn build_state(settings: &Settings, metrics: Option<PrometheusHandle>) -> anyhow::Result<AppState> {
    let detector_config = settings.detector.clone();
    let detector = match tokio::task::spawn_blocking(move || load_detector(&detector_config)).await? {
        Ok(loaded) => Some(loaded),
        Err(e) => {
            error!("No detection model available, detect requests will return 503: {}", e);
            None
        }
    };

    let backend = match OpenAiChatBackend::new(settings.llm.clone()) {
        Ok(backend) => {
            info!(model = %settings.llm.model, "Text backend configured");
            Some(Arc::new(backend) as Arc<dyn TextBackend>)
        }
        Err(e) => {
            warn!("Text backend unavailable ({}), warnings will come from the rule engine", e);
            None
        }
    };
    let generator = WarningGenerator::new(backend, settings.generator.clone());

    let narrator = match OpenAiSpeech::from_config(settings.speech.clone()) {
        Some(speech) => {
            info!(voice = %settings.speech.voice, "Speech synthesis configured");
            Narrator::new(
                Some(Arc::new(speech) as Arc<dyn SpeechSynthesizer>),
                Duration::from_secs(settings.speech.timeout_secs),
            )
        }
        None => {
            info!("Speech synthesis disabled");
            Narrator::disabled()
        }
    };

    let event_logger = EventLogger::open(&settings.event_log).context("Failed to open detection log")?;

    Ok(AppState::new(detector, WarningPipeline::new(generator, narrator, event_logger))
        .with_thresholds(settings.distance)
        .with_limits(settings.rate_limit.clone(), settings.server.max_upload_bytes)
        .with_metrics(metrics))
}

/// Run the server
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus exporter not installed: {}", e);
            None
        }
    };

    let state = Arc::new(build_state(&settings, metrics).await?);
    let app = create_router(state);

    let addr = settings.server.bind_addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
