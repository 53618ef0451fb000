//! Drowsiness session configuration

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Tunables for one detection session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// EAR below this counts as a closed-eye frame
    pub ear_threshold: f32,

    /// Consecutive closed-eye frames before alerting
    pub consecutive_frame_threshold: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.22,
            consecutive_frame_threshold: 20,
        }
    }
}

impl SessionConfig {
    /// Create strict config (alerts sooner)
    pub fn strict() -> Self {
        Self {
            ear_threshold: 0.25,
            consecutive_frame_threshold: 15,
        }
    }

    /// Create lenient config (fewer false alerts)
    pub fn lenient() -> Self {
        Self {
            ear_threshold: 0.20,
            consecutive_frame_threshold: 30,
        }
    }

    /// Reject out-of-range tunables
    pub fn validate(&self) -> Result<(), DmsError> {
        if !(self.ear_threshold > 0.0 && self.ear_threshold < 1.0) {
            return Err(DmsError::InvalidConfig(format!(
                "ear_threshold must be in (0, 1), got {}",
                self.ear_threshold
            )));
        }
        if self.consecutive_frame_threshold < 1 {
            return Err(DmsError::InvalidConfig(
                "consecutive_frame_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert_eq!(config.ear_threshold, 0.22);
        assert_eq!(config.consecutive_frame_threshold, 20);
        assert!(config.validate().is_ok());
        assert!(SessionConfig::strict().validate().is_ok());
        assert!(SessionConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_threshold_bounds() {
        for bad in [0.0, 1.0, -0.1, 1.5, f32::NAN] {
            let config = SessionConfig {
                ear_threshold: bad,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(DmsError::InvalidConfig(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_zero_frames_rejected() {
        let config = SessionConfig {
            consecutive_frame_threshold: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DmsError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"ear_threshold":0.3}"#).unwrap();
        assert_eq!(config.ear_threshold, 0.3);
        assert_eq!(config.consecutive_frame_threshold, 20);
    }
}
