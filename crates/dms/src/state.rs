//! Drowsiness state tracking

use serde::{Deserialize, Serialize};

/// Where the monitor sits in its hysteresis cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrowsinessPhase {
    /// Eyes open, counter at zero
    #[default]
    Idle,
    /// Eyes low but not yet long enough to alert
    Watching,
    /// Sustained eye closure
    Alerting,
}

impl DrowsinessPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Watching => "watching",
            Self::Alerting => "alerting",
        }
    }
}

/// Per-session monitor state (tracked across frames)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorState {
    /// Consecutive frames with EAR below threshold
    pub consecutive_low_ear_count: u32,

    /// Whether the alert is currently raised
    pub is_alerting: bool,

    /// EAR of the last frame that had eyes
    pub last_ear: Option<f32>,
}

impl MonitorState {
    /// Current phase derived from counter and alert flag
    pub fn phase(&self) -> DrowsinessPhase {
        if self.is_alerting {
            DrowsinessPhase::Alerting
        } else if self.consecutive_low_ear_count > 0 {
            DrowsinessPhase::Watching
        } else {
            DrowsinessPhase::Idle
        }
    }

    /// Reset state (on session start/stop)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
