//! Coastwatch - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, Settings};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "coastwatch", version, about = "Coastal surveillance detection and warning service")]
struct Args {
    /// Configuration file (defaults to ./coastwatch.toml when present)
    #[arg(short, long, env = "COASTWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    init_logging(&settings.logging)?;

    info!("=== Coastwatch v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Detection log: {}", settings.event_log.path.display());

    run_server(settings).await
}
