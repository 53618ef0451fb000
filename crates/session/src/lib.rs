//! Drowsiness Detection Session
//!
//! Owns the lifecycle of one detection session:
//! - Scoped acquisition of the video stream and alert cue
//! - One `tick()` per frame: capture, landmarks, EAR, hysteresis, alert cue
//! - A cooperative capture loop that can be cancelled from another thread

mod controller;
mod runner;

#[cfg(test)]
mod test_support;

pub use controller::{
    ControllerOptions, FrameReport, SessionController, SessionStatus, SessionSummary, SkipReason,
    TickOutcome,
};
pub use runner::{RunnerEvent, RunnerOptions, SessionRunner, SharedController, StopSignal};

use camera_capture::CameraError;
use thiserror::Error;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A detection session is already active")]
    AlreadyActive,

    #[error("No detection session is active")]
    NotActive,

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid landmark input: {0}")]
    InvalidInput(String),

    #[error("Capture failed: {0}")]
    Capture(#[from] CameraError),
}
