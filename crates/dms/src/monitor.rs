//! Temporal drowsiness detection
//!
//! Turns per-frame EAR values into a stable alert decision. A frame with
//! EAR below threshold advances a counter; any open-eye frame resets it in
//! one step. The alert is raised once the counter reaches the configured
//! number of frames and held for as long as the eyes stay low.

use tracing::{debug, warn};

use crate::analysis::{FrameObservation, FrameVerdict};
use crate::config::SessionConfig;
use crate::state::MonitorState;
use crate::DmsError;

/// Hysteresis engine owning the per-session [`MonitorState`]
#[derive(Debug, Default)]
pub struct DrowsinessMonitor {
    state: MonitorState,
}

impl DrowsinessMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Reset to idle (on session start/stop)
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Process one frame's observation
    ///
    /// A frame without eyes is a skipped tick: the counter and alert flag are
    /// left as they were. Geometry errors are returned untouched so the
    /// caller can decide between skipping the frame and ending the session.
    pub fn process_frame(
        &mut self,
        observation: &FrameObservation,
        config: &SessionConfig,
    ) -> Result<FrameVerdict, DmsError> {
        let Some(ear) = Self::average_ear(observation)? else {
            return Ok(FrameVerdict {
                ear: None,
                alert: self.state.is_alerting,
                phase: self.state.phase(),
            });
        };

        let was_alerting = self.state.is_alerting;

        if ear < config.ear_threshold {
            self.state.consecutive_low_ear_count =
                self.state.consecutive_low_ear_count.saturating_add(1);
        } else {
            self.state.consecutive_low_ear_count = 0;
        }

        self.state.is_alerting =
            self.state.consecutive_low_ear_count >= config.consecutive_frame_threshold;
        self.state.last_ear = Some(ear);

        if self.state.is_alerting && !was_alerting {
            warn!(
                "Drowsiness detected at frame {}: EAR {:.3} low for {} frames",
                observation.sequence, ear, self.state.consecutive_low_ear_count
            );
        } else if was_alerting && !self.state.is_alerting {
            debug!("Eyes open again at frame {} (EAR {:.3})", observation.sequence, ear);
        }

        Ok(FrameVerdict {
            ear: Some(ear),
            alert: self.state.is_alerting,
            phase: self.state.phase(),
        })
    }

    /// Mean EAR over the eyes present; a lone eye stands in for both
    fn average_ear(observation: &FrameObservation) -> Result<Option<f32>, DmsError> {
        let ear = match (&observation.left_eye, &observation.right_eye) {
            (Some(left), Some(right)) => {
                Some((left.aspect_ratio()? + right.aspect_ratio()?) / 2.0)
            }
            (Some(eye), None) | (None, Some(eye)) => Some(eye.aspect_ratio()?),
            (None, None) => None,
        };
        Ok(ear)
    }
}
