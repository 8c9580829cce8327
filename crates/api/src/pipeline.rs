//! Warning pipeline: generation, narration, event logging

use alerting::{EventLogger, LogContext};
use detection::DetectionSummary;
use speech::Narrator;
use tracing::{error, info};
use warning::{TacticalWarning, WarningGenerator};

/// Post-detection stages for one request
pub struct WarningPipeline {
    generator: WarningGenerator,
    narrator: Narrator,
    event_logger: EventLogger,
}

impl WarningPipeline {
    pub fn new(generator: WarningGenerator, narrator: Narrator, event_logger: EventLogger) -> Self {
        Self {
            generator,
            narrator,
            event_logger,
        }
    }

    pub fn event_logger(&self) -> &EventLogger {
        &self.event_logger
    }

    /// Whether warnings can come from the text backend
    pub fn has_text_backend(&self) -> bool {
        self.generator.has_backend()
    }

    pub fn speech_enabled(&self) -> bool {
        self.narrator.is_enabled()
    }

    /// Generate, narrate and log a warning for `detections`
    pub async fn run(&self, detections: &[DetectionSummary], ctx: &LogContext) -> TacticalWarning {
        let warning = self.generator.generate(detections).await;
        let warning = self.narrator.attach_audio(warning).await;
        self.log_event(&warning, ctx).await;

        info!(
            filename = %ctx.filename,
            level = %warning.level,
            source = %warning.source,
            audio = warning.audio.is_some(),
            "Warning ready"
        );
        warning
    }

    /// Warning used when [`run`](Self::run) did not complete
    pub async fn aborted(&self, detections: Vec<DetectionSummary>, ctx: &LogContext, reason: &str) -> TacticalWarning {
        error!(filename = %ctx.filename, "Warning generation aborted: {}", reason);
        metrics::counter!("coastwatch_warnings_total", "source" => "ERROR").increment(1);

        let warning = TacticalWarning::error(detections);
        self.log_event(&warning, ctx).await;
        warning
    }

    /// File writes run on the blocking pool
    async fn log_event(&self, warning: &TacticalWarning, ctx: &LogContext) -> bool {
        if !warning.level.is_reportable() {
            return self.event_logger.log_if_qualifying(warning, ctx);
        }

        let logger = self.event_logger.clone();
        let (warning, ctx) = (warning.clone(), ctx.clone());
        match tokio::task::spawn_blocking(move || logger.log_if_qualifying(&warning, &ctx)).await {
            Ok(written) => written,
            Err(e) => {
                error!("Detection log task failed: {}", e);
                false
            }
        }
    }
}
