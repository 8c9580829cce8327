//! Rule-Based Fallback System
//!
//! Provides a deterministic tactical assessment when the text-generation
//! backend is unavailable or keeps returning unusable output.

mod level;
mod rules;

pub use level::{Assessment, UnknownLevel, WarningLevel};
pub use rules::FallbackEngine;
