//! Camera Capture Library for Driver Monitoring
//!
//! Provides the video-frame side of the drowsiness pipeline:
//! - Decoded RGB frames with resize helpers
//! - The `VideoSource` / `FrameStream` capture abstraction
//! - An in-memory replay source for offline runs and tests

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{FrameStream, ReadOutcome, ReplaySource, VideoSource};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Frame read failed: {0}")]
    Read(String),
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0")
    pub device: String,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS
    pub fps: u32,
    /// Upper bound on a single blocking frame read
    pub read_timeout_ms: u64,
    /// Working width frames are resized to before landmark extraction
    pub resize_width: Option<u32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
            fps: 30,
            read_timeout_ms: 100,
            resize_width: Some(850),
        }
    }
}

impl CameraConfig {
    /// Read timeout as a duration
    pub fn read_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.read_timeout_ms)
    }
}
