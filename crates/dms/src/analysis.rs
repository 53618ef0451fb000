//! Per-frame observations and verdicts

use serde::{Deserialize, Serialize};

use crate::landmarks::{EyeLandmarks, FaceLandmarks};
use crate::state::DrowsinessPhase;
use crate::DmsError;

/// Eye landmarks seen in one frame; consumed immediately, never retained
#[derive(Debug, Clone, Default)]
pub struct FrameObservation {
    pub left_eye: Option<EyeLandmarks>,
    pub right_eye: Option<EyeLandmarks>,
    /// Frame sequence number
    pub sequence: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
}

impl FrameObservation {
    /// Observation for a frame without a detected face
    pub fn empty(sequence: u32, timestamp_ns: u64) -> Self {
        Self {
            sequence,
            timestamp_ns,
            ..Default::default()
        }
    }

    /// Slice both eyes out of a face landmark set
    pub fn from_face(
        face: Option<&FaceLandmarks>,
        sequence: u32,
        timestamp_ns: u64,
    ) -> Result<Self, DmsError> {
        let Some(face) = face else {
            return Ok(Self::empty(sequence, timestamp_ns));
        };

        Ok(Self {
            left_eye: Some(face.left_eye()?),
            right_eye: Some(face.right_eye()?),
            sequence,
            timestamp_ns,
        })
    }

    pub fn has_eyes(&self) -> bool {
        self.left_eye.is_some() || self.right_eye.is_some()
    }
}

/// Monitor output for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameVerdict {
    /// Averaged EAR, absent when no eyes were seen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear: Option<f32>,

    /// Whether the drowsiness alert is raised
    pub alert: bool,

    /// Phase after this frame
    pub phase: DrowsinessPhase,
}
