//! Validation of backend replies

use fallback::{Assessment, UnknownLevel, WarningLevel};
use serde::Deserialize;
use thiserror::Error;

/// Reasons a reply does not satisfy the output contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    #[error("Reply is not a JSON object: {0}")]
    InvalidJson(String),

    #[error("Reply field `{0}` is missing or empty")]
    EmptyField(&'static str),

    #[error(transparent)]
    UnknownLevel(#[from] UnknownLevel),
}

#[derive(Deserialize)]
struct RawReply {
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    action: Option<String>,
}

/// Parse a reply into an assessment.
///
/// Markdown code fences around the object are tolerated. All three fields
/// must be present and non-blank, and `level` must be one of the known
/// levels.
pub fn parse_reply(text: &str) -> Result<Assessment, ReplyError> {
    let body = strip_fences(text);
    let raw: RawReply = serde_json::from_str(body).map_err(|e| ReplyError::InvalidJson(e.to_string()))?;

    let level = required(raw.level, "level")?;
    let summary = required(raw.summary, "summary")?;
    let action = required(raw.action, "action")?;

    let level: WarningLevel = level.parse()?;
    Ok(Assessment::new(level, summary, action))
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ReplyError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ReplyError::EmptyField(field)),
    }
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
