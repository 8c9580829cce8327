//! Generative-text backend boundary

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Backend error types
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Text backend is not configured")]
    NotConfigured,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    /// Whether another attempt could succeed.
    ///
    /// Rate limiting and server errors are transient; any other 4xx means the
    /// request itself (or its credentials) is wrong.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::NotConfigured => false,
            BackendError::Transport(_) | BackendError::Timeout | BackendError::MalformedResponse(_) => true,
            BackendError::Status { code, .. } => *code == 429 || *code >= 500,
        }
    }
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Text completion backend
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Complete a conversation, returning the assistant's raw content
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError>;
}

/// OpenAI-compatible chat backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatBackendConfig {
    /// API root, without the trailing `/chat/completions`
    pub base_url: String,
    /// Falls back to `OPENAI_API_KEY` when unset
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    /// Transport-level timeout; attempts are also bounded by the generator
    pub request_timeout_secs: u64,
}

impl Default for ChatBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat completions client
pub struct OpenAiChatBackend {
    http_client: reqwest::Client,
    config: ChatBackendConfig,
    api_key: String,
}

impl OpenAiChatBackend {
    /// Create a client; fails when no API key is available
    pub fn new(config: ChatBackendConfig) -> Result<Self, BackendError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(BackendError::NotConfigured)?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextBackend for OpenAiChatBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            response_format: ResponseFormat { kind: "json_object" },
        };

        debug!(model = %self.config.model, messages = messages.len(), "Sending chat completion request");

        let resp = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout
                } else {
                    BackendError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Chat backend returned {}: {}", status, body);
            return Err(BackendError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::MalformedResponse("no message content".to_string()))
    }
}
