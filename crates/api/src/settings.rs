//! Service configuration
//!
//! Layered as: built-in defaults, then `coastwatch.toml` (or an explicit
//! file), then `COASTWATCH__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};

use alerting::EventLogConfig;
use config::{Config, ConfigError, Environment, File};
use detection::{DetectorConfig, DistanceThresholds};
use serde::{Deserialize, Serialize};
use speech::SpeechConfig;
use warning::{ChatBackendConfig, GeneratorConfig};

use crate::rate_limit::RateLimitConfig;

/// Default configuration file, loaded when present
pub const DEFAULT_CONFIG_FILE: &str = "coastwatch.toml";

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upload size cap in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,tower_http=info".to_string(),
            json: false,
        }
    }
}

/// Complete service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub detector: DetectorConfig,
    pub distance: DistanceThresholds,
    pub llm: ChatBackendConfig,
    pub generator: GeneratorConfig,
    pub speech: SpeechConfig,
    pub event_log: EventLogConfig,
    pub rate_limit: RateLimitConfig,
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("COASTWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        let settings = settings.with_env_api_key(std::env::var("OPENAI_API_KEY").ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Use `key` for the text and speech backends when none is configured
    pub fn with_env_api_key(mut self, key: Option<String>) -> Self {
        let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
            return self;
        };
        if self.llm.api_key.is_none() {
            self.llm.api_key = Some(key.clone());
        }
        if self.speech.api_key.is_none() {
            self.speech.api_key = Some(key);
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.distance;
        if !(0.0 < d.warning && d.warning < d.critical) {
            return Err(ConfigError::Message(format!(
                "distance thresholds must satisfy 0 < warning < critical (got warning={}, critical={})",
                d.warning, d.critical
            )));
        }
        if self.detector.input_size == 0 {
            return Err(ConfigError::Message("detector.input_size must be positive".to_string()));
        }
        Ok(())
    }
}
