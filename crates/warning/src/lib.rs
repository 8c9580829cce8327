//! Tactical Warning Generation
//!
//! Turns detection summaries into a leveled tactical warning:
//! - Prompt construction with an explicit output contract
//! - OpenAI-compatible chat backend
//! - Bounded retries with per-attempt timeouts
//! - Deterministic fallback when the backend is unavailable or non-conformant

pub mod backend;
pub mod generator;
pub mod prompt;
pub mod reply;
pub mod types;

pub use backend::{BackendError, ChatBackendConfig, ChatMessage, OpenAiChatBackend, Role, TextBackend};
pub use generator::{AttemptOutcome, GeneratorConfig, WarningGenerator};
pub use prompt::build_messages;
pub use reply::{parse_reply, ReplyError};
pub use types::{AudioClip, TacticalWarning, WarningSource};

pub use fallback::{Assessment, WarningLevel};
