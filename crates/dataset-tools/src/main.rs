//! Coastwatch dataset tools

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dataset_tools::{convert_dataset, filter_pairs, verify_pairs, ConvertOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "coastwatch-dataset", version, about = "Detector training data preparation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert annotation JSON files into YOLO label files
    Convert {
        #[arg(long)]
        json_dir: PathBuf,
        #[arg(long)]
        image_dir: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        /// Concurrent conversions
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
    /// Report images without labels and labels without images
    Verify {
        #[arg(long)]
        image_dir: PathBuf,
        #[arg(long)]
        label_dir: PathBuf,
    },
    /// Copy matched image/label pairs into a new tree
    Filter {
        #[arg(long)]
        image_dir: PathBuf,
        #[arg(long)]
        label_dir: PathBuf,
        #[arg(long)]
        out_image_dir: PathBuf,
        #[arg(long)]
        out_label_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Convert {
            json_dir,
            image_dir,
            out_dir,
            workers,
        } => {
            let stats = convert_dataset(ConvertOptions {
                json_dir,
                image_dir,
                out_dir,
                workers,
            })
            .await
            .context("Conversion failed")?;
            println!(
                "converted: {}, skipped: {}, failed: {}",
                stats.converted, stats.skipped, stats.failed
            );
        }
        Command::Verify { image_dir, label_dir } => {
            let report = verify_pairs(&image_dir, &label_dir).context("Pairing check failed")?;
            for stem in &report.missing_labels {
                warn!("Image without label: {}", stem);
            }
            for stem in &report.missing_images {
                warn!("Label without image: {}", stem);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Filter {
            image_dir,
            label_dir,
            out_image_dir,
            out_label_dir,
        } => {
            let copied = filter_pairs(&image_dir, &label_dir, &out_image_dir, &out_label_dir)
                .context("Filtering failed")?;
            info!("Filtered dataset written to {}", out_image_dir.display());
            println!("copied pairs: {}", copied);
        }
    }

    Ok(())
}
