//! Speech Synthesis
//!
//! Voice output for tactical warnings. Synthesis is a post-processing step
//! on a finalized warning and never changes its content.

mod narrator;
mod openai;

pub use narrator::Narrator;
pub use openai::{OpenAiSpeech, SpeechConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Speech error types
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Synthesis timed out")]
    Timeout,
}

/// Text-to-speech engine
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, returning encoded audio
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;

    /// Container format of the returned audio
    fn format(&self) -> &str;
}
