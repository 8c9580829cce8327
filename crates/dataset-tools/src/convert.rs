//! Annotation JSON to YOLO conversion

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::annotation::AnnotationFile;
use crate::DatasetError;

/// Conversion inputs
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub json_dir: PathBuf,
    pub image_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Files converted concurrently
    pub workers: usize,
}

/// Per-run counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    /// Label files written
    pub converted: usize,
    /// Files with nothing to write
    pub skipped: usize,
    /// Files that could not be read or written
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Converted,
    Skipped,
}

/// Convert every `*.json` file in `json_dir` into a YOLO label file
pub async fn convert_dataset(options: ConvertOptions) -> Result<ConvertStats, DatasetError> {
    fs::create_dir_all(&options.out_dir)?;

    let mut inputs: Vec<PathBuf> = fs::read_dir(&options.json_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
        .collect();
    inputs.sort();
    info!("Converting {} annotation files with {} workers", inputs.len(), options.workers);

    let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
    let image_dir = Arc::new(options.image_dir);
    let out_dir = Arc::new(options.out_dir);
    let mut tasks = JoinSet::new();

    for json_path in inputs {
        let semaphore = Arc::clone(&semaphore);
        let image_dir = Arc::clone(&image_dir);
        let out_dir = Arc::clone(&out_dir);

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| DatasetError::Worker(e.to_string()))?;
            let path = json_path.clone();
            let result = tokio::task::spawn_blocking(move || convert_file(&path, &image_dir, &out_dir))
                .await
                .map_err(|e| DatasetError::Worker(e.to_string()))?;
            result.map_err(|e| {
                warn!("Conversion failed for {}: {}", json_path.display(), e);
                e
            })
        });
    }

    let mut stats = ConvertStats::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(FileOutcome::Converted)) => stats.converted += 1,
            Ok(Ok(FileOutcome::Skipped)) => stats.skipped += 1,
            Ok(Err(_)) => stats.failed += 1,
            Err(e) => {
                warn!("Conversion task aborted: {}", e);
                stats.failed += 1;
            }
        }
    }

    info!(
        converted = stats.converted,
        skipped = stats.skipped,
        failed = stats.failed,
        "Conversion finished"
    );
    Ok(stats)
}

fn convert_file(json_path: &Path, image_dir: &Path, out_dir: &Path) -> Result<FileOutcome, DatasetError> {
    let raw = fs::read_to_string(json_path)?;
    let file: AnnotationFile = serde_json::from_str(&raw).map_err(|e| DatasetError::Json {
        path: json_path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut lines = Vec::with_capacity(file.annotations.len());
    for ann in &file.annotations {
        let image_path = image_dir.join(&ann.filename);
        let (width, height) = match image::image_dimensions(&image_path) {
            Ok(dims) => dims,
            Err(e) => {
                warn!("Skipping annotation, cannot read {}: {}", image_path.display(), e);
                continue;
            }
        };
        match ann.to_yolo_line(width, height) {
            Some(line) => lines.push(line),
            None => warn!("Skipping annotation with class {} in {}", ann.class, json_path.display()),
        }
    }

    if lines.is_empty() {
        debug!("Nothing to write for {}", json_path.display());
        return Ok(FileOutcome::Skipped);
    }

    let out_path = out_dir.join(json_path.with_extension("txt").file_name().unwrap_or_default());
    fs::write(&out_path, lines.join("\n"))?;
    Ok(FileOutcome::Converted)
}
