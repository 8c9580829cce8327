//! OpenAI-compatible speech endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{SpeechError, SpeechSynthesizer};

/// Speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Falls back to `OPENAI_API_KEY` when unset
    pub api_key: Option<String>,
    pub model: String,
    pub voice: String,
    pub format: String,
    /// Upper bound on one synthesis call
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            format: "mp3".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// Client for `POST {base_url}/audio/speech`
pub struct OpenAiSpeech {
    http_client: reqwest::Client,
    config: SpeechConfig,
    api_key: String,
}

impl OpenAiSpeech {
    /// Build a client, or `None` when speech is disabled or has no key
    pub fn from_config(config: SpeechConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty())?;

        let http_client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build speech HTTP client: {}", e);
                return None;
            }
        };

        Some(Self {
            http_client,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let request = SpeechRequest {
            model: &self.config.model,
            voice: &self.config.voice,
            input: text,
            response_format: &self.config.format,
        };
        debug!(chars = text.chars().count(), "Requesting speech synthesis");

        let resp = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout
                } else {
                    SpeechError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SpeechError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| SpeechError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn format(&self) -> &str {
        &self.config.format
    }
}
