//! Driver Monitoring System (DMS)
//!
//! Drowsiness detection from facial landmarks:
//! - Eye aspect ratio (EAR) from six eye-contour points
//! - Consecutive low-EAR frame counting (hysteresis)
//! - Alert state machine (idle, watching, alerting)
//! - Overlay data for the monitoring view

pub mod analysis;
pub mod config;
pub mod geometry;
pub mod landmarks;
pub mod monitor;
pub mod overlay;
pub mod state;

pub use analysis::{FrameObservation, FrameVerdict};
pub use config::SessionConfig;
pub use geometry::{eye_aspect_ratio, Point2D};
pub use landmarks::{
    first_face_landmarks, EyeLandmarks, FaceLandmarks, FaceRegion, LandmarkExtractor,
};
pub use monitor::DrowsinessMonitor;
pub use overlay::Overlay;
pub use state::{DrowsinessPhase, MonitorState};

use thiserror::Error;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Expected {expected} landmark points, got {actual}")]
    InvalidInput { expected: usize, actual: usize },

    #[error("Eye corners coincide, aspect ratio undefined")]
    DegenerateGeometry,

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Landmark extraction failed: {0}")]
    Extraction(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
}

impl DmsError {
    /// Errors that only spoil the current frame
    pub fn is_frame_recoverable(&self) -> bool {
        matches!(
            self,
            DmsError::DegenerateGeometry | DmsError::Extraction(_) | DmsError::ImageProcessing(_)
        )
    }
}
