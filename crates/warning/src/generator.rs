//! Warning generation state machine
//!
//! EMPTY → ATTEMPT(1..=max_retries) → PRIMARY | FALLBACK

use std::sync::Arc;
use std::time::Duration;

use detection::DetectionSummary;
use fallback::{Assessment, FallbackEngine, WarningLevel};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::backend::{ChatMessage, TextBackend};
use crate::prompt::build_messages;
use crate::reply::parse_reply;
use crate::types::{TacticalWarning, WarningSource};

/// Generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Backend attempts before falling back
    pub max_retries: u32,
    /// Upper bound on a single attempt
    pub attempt_timeout_ms: u64,
    /// Backoff unit; attempt `n` waits `n * retry_backoff_ms` before the next
    pub retry_backoff_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            attempt_timeout_ms: 20_000,
            retry_backoff_ms: 500,
        }
    }
}

/// Result of a single backend attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(Assessment),
    RetryableFailure(String),
    TerminalFailure(String),
}

/// Produces tactical warnings, degrading to the rule engine when needed
pub struct WarningGenerator {
    backend: Option<Arc<dyn TextBackend>>,
    config: GeneratorConfig,
    fallback: FallbackEngine,
}

impl WarningGenerator {
    /// Create a generator; `None` means every warning comes from the rule engine
    pub fn new(backend: Option<Arc<dyn TextBackend>>, config: GeneratorConfig) -> Self {
        Self {
            backend,
            config,
            fallback: FallbackEngine::new(),
        }
    }

    /// Whether a text backend is configured
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Generate with the configured retry budget
    pub async fn generate(&self, detections: &[DetectionSummary]) -> TacticalWarning {
        self.generate_with_retries(detections, self.config.max_retries).await
    }

    /// Generate a warning, trying the backend at most `max_retries` times
    pub async fn generate_with_retries(&self, detections: &[DetectionSummary], max_retries: u32) -> TacticalWarning {
        if detections.is_empty() {
            return finish(
                Assessment::new(WarningLevel::Safe, "No objects detected.", "Maintain normal watch."),
                WarningSource::Empty,
                detections,
            );
        }

        match &self.backend {
            Some(backend) => {
                let messages = build_messages(detections);
                for attempt in 1..=max_retries {
                    match self.attempt(backend.as_ref(), &messages).await {
                        AttemptOutcome::Success(assessment) => {
                            info!(attempt, level = %assessment.level, "Warning generated by text backend");
                            return finish(assessment, WarningSource::Primary, detections);
                        }
                        AttemptOutcome::RetryableFailure(reason) => {
                            warn!(attempt, max_retries, reason = %reason, "Warning generation attempt failed");
                            if attempt < max_retries {
                                sleep(Duration::from_millis(self.config.retry_backoff_ms * u64::from(attempt))).await;
                            }
                        }
                        AttemptOutcome::TerminalFailure(reason) => {
                            warn!(attempt, reason = %reason, "Text backend rejected the request, skipping retries");
                            break;
                        }
                    }
                }
            }
            None => debug!("No text backend configured"),
        }

        let assessment = self.fallback.evaluate(detections);
        info!(level = %assessment.level, "Using fallback warning");
        finish(assessment, WarningSource::Fallback, detections)
    }

    async fn attempt(&self, backend: &dyn TextBackend, messages: &[ChatMessage]) -> AttemptOutcome {
        let limit = Duration::from_millis(self.config.attempt_timeout_ms);

        match timeout(limit, backend.complete(messages)).await {
            Err(_) => AttemptOutcome::RetryableFailure(format!("timed out after {}ms", limit.as_millis())),
            Ok(Err(e)) if e.is_retryable() => AttemptOutcome::RetryableFailure(e.to_string()),
            Ok(Err(e)) => AttemptOutcome::TerminalFailure(e.to_string()),
            Ok(Ok(text)) => match parse_reply(&text) {
                Ok(assessment) => AttemptOutcome::Success(assessment),
                Err(e) => AttemptOutcome::RetryableFailure(e.to_string()),
            },
        }
    }
}

fn finish(assessment: Assessment, source: WarningSource, detections: &[DetectionSummary]) -> TacticalWarning {
    metrics::counter!("coastwatch_warnings_total", "source" => source.as_str()).increment(1);
    TacticalWarning::new(assessment, source, detections.to_vec())
}
