//! Image/label pairing

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::DatasetError;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Pairing status of an image and label directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairReport {
    pub images: usize,
    pub labels: usize,
    /// Image stems with no label file
    pub missing_labels: Vec<String>,
    /// Label stems with no image file
    pub missing_images: Vec<String>,
}

impl PairReport {
    pub fn is_matched(&self) -> bool {
        self.missing_labels.is_empty() && self.missing_images.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn is_label(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "txt")
}

/// Files in `dir` accepted by `keep`, keyed by file stem
fn files_by_stem(dir: &Path, keep: fn(&Path) -> bool) -> Result<BTreeMap<String, PathBuf>, DatasetError> {
    let mut files = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !keep(&path) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.insert(stem.to_string(), path);
        }
    }
    Ok(files)
}

/// Report images without labels and labels without images
pub fn verify_pairs(image_dir: &Path, label_dir: &Path) -> Result<PairReport, DatasetError> {
    let images = files_by_stem(image_dir, is_image)?;
    let labels = files_by_stem(label_dir, is_label)?;

    let image_stems: BTreeSet<&String> = images.keys().collect();
    let label_stems: BTreeSet<&String> = labels.keys().collect();

    let report = PairReport {
        images: images.len(),
        labels: labels.len(),
        missing_labels: image_stems.difference(&label_stems).map(|s| s.to_string()).collect(),
        missing_images: label_stems.difference(&image_stems).map(|s| s.to_string()).collect(),
    };

    info!(
        images = report.images,
        labels = report.labels,
        missing_labels = report.missing_labels.len(),
        missing_images = report.missing_images.len(),
        "Pairing check complete"
    );
    Ok(report)
}

/// Copy matched image/label pairs into `out_images` and `out_labels`.
///
/// Returns the number of pairs copied.
pub fn filter_pairs(
    image_dir: &Path,
    label_dir: &Path,
    out_images: &Path,
    out_labels: &Path,
) -> Result<usize, DatasetError> {
    fs::create_dir_all(out_images)?;
    fs::create_dir_all(out_labels)?;

    let images = files_by_stem(image_dir, is_image)?;
    let labels = files_by_stem(label_dir, is_label)?;

    let mut copied = 0;
    for (stem, label_path) in &labels {
        let Some(image_path) = images.get(stem) else {
            debug!("No image for label {}", stem);
            continue;
        };

        for (src, dst_dir) in [(image_path, out_images), (label_path, out_labels)] {
            if let Some(name) = src.file_name() {
                fs::copy(src, dst_dir.join(name))?;
            }
        }
        copied += 1;
    }

    info!("Copied {} matched pairs", copied);
    Ok(copied)
}
