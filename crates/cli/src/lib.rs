//! Drowsiness Monitor Driver
//!
//! Loads configuration, initialises logging, and drives a detection
//! session over a recorded landmark trace.

pub mod config;
pub mod trace;

use std::path::Path;
use std::sync::{Arc, Mutex};

use alerting::LogOnlyBackend;
use session::{
    ControllerOptions, RunnerEvent, SessionController, SessionError, SessionRunner, SessionSummary,
};
use thiserror::Error;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{AppConfig, LoggingConfig};
use crate::trace::{LandmarkTrace, TraceError};

/// Driver error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Session aborted: {0}")]
    Aborted(String),
}

/// Resolve the configured level, raised by `-v` flags
pub fn log_level(config: &LoggingConfig, verbose: u8) -> Level {
    let configured = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let raised = match verbose {
        0 => configured,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // Level ordering: TRACE is the most verbose
    raised.max(configured)
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig, verbose: u8) -> Result<(), CliError> {
    let level = log_level(config, verbose);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| CliError::Logging(e.to_string()))
}

/// Replay a trace file through a full detection session
pub async fn run_trace(
    config: AppConfig,
    trace_path: &Path,
) -> Result<Option<SessionSummary>, CliError> {
    let trace = LandmarkTrace::load(trace_path)?;
    if trace.is_empty() {
        warn!("Trace {} has no frames", trace_path.display());
    }
    run_with_trace(config, &trace).await
}

/// Controller options for trace replay
///
/// Recorded landmarks are in capture coordinates, so replayed frames are
/// never resized and nothing is drawn onto them.
pub fn trace_options(config: &AppConfig) -> ControllerOptions {
    let mut camera = config.camera.clone();
    if let Some(width) = camera.resize_width.take() {
        debug!("Ignoring resize_width {} for trace replay", width);
    }
    ControllerOptions {
        camera,
        alert: config.alert.clone(),
        annotate_frames: false,
    }
}

/// Drive a session over an in-memory trace until it ends or Ctrl-C
pub async fn run_with_trace(
    config: AppConfig,
    trace: &LandmarkTrace,
) -> Result<Option<SessionSummary>, CliError> {
    let options = trace_options(&config);

    let mut controller = SessionController::new(
        Box::new(trace.video_source(config.camera.width, config.camera.height)),
        Box::new(trace.extractor()),
        Box::new(LogOnlyBackend::default()),
        options,
    );

    let session_id = controller.start(config.session.clone())?;
    info!("Status: {} (session {})", controller.status().as_str(), session_id);

    let controller = Arc::new(Mutex::new(controller));
    let mut runner = SessionRunner::spawn(controller, config.capture_loop.runner_options())?;

    loop {
        tokio::select! {
            event = runner.next() => match event {
                Some(RunnerEvent::Frame(report)) => {
                    if report.alert_started {
                        warn!("ALERT! Driver drowsy at frame {}", report.sequence);
                    }
                }
                Some(RunnerEvent::Ended(summary)) => return Ok(Some(summary)),
                Some(RunnerEvent::Failed(reason)) => return Err(CliError::Aborted(reason)),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping detection");
                break;
            }
        }
    }

    Ok(runner.stop())
}
