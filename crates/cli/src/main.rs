//! Drowsiness Monitor - Main Entry Point

use std::path::PathBuf;

use clap::Parser;
use monitor_cli::config::AppConfig;
use monitor_cli::{init_logging, run_trace};
use tracing::info;

/// Replay a landmark trace through the drowsiness detector
#[derive(Parser)]
#[command(name = "drowsiness-monitor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON-lines landmark trace to replay
    trace: PathBuf,

    /// Configuration file (default: ./drowsiness.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the EAR threshold
    #[arg(long)]
    ear_threshold: Option<f32>,

    /// Override the consecutive low-EAR frame count
    #[arg(long)]
    frames: Option<u32>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(threshold) = cli.ear_threshold {
        config.session.ear_threshold = threshold;
    }
    if let Some(frames) = cli.frames {
        config.session.consecutive_frame_threshold = frames;
    }

    init_logging(&config.logging, cli.verbose)?;

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(summary) = run_trace(config, &cli.trace).await? {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
