//! Dataset Preparation
//!
//! Offline tooling for detector training data:
//! - Annotation JSON to YOLO label conversion on a bounded worker pool
//! - Image/label pairing checks
//! - Copying only matched pairs into a clean tree

pub mod annotation;
pub mod convert;
pub mod pairing;

pub use annotation::{Annotation, AnnotationFile};
pub use convert::{convert_dataset, ConvertOptions, ConvertStats};
pub use pairing::{filter_pairs, verify_pairs, PairReport};

use thiserror::Error;

/// Dataset error types
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid annotation file {path}: {message}")]
    Json { path: String, message: String },

    #[error("Worker failed: {0}")]
    Worker(String),
}
