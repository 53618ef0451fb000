//! Audio playback interface

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load alert sound {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Playback failed: {0}")]
    Playback(String),
}

/// A loaded alert cue
pub trait AlertPlayer: Send {
    /// Start the cue
    fn play(&mut self) -> Result<(), AudioError>;

    /// Whether the cue is still sounding
    fn is_playing(&self) -> bool;

    /// Cut the cue short
    fn stop(&mut self);
}

/// Audio device able to load a cue from disk
pub trait AudioBackend: Send {
    fn load(&self, path: &Path) -> Result<Box<dyn AlertPlayer>, AudioError>;
}

/// Backend for headless runs: "plays" a cue by logging it
#[derive(Debug, Clone)]
pub struct LogOnlyBackend {
    /// How long a cue counts as playing
    pub cue_duration: Duration,
}

impl Default for LogOnlyBackend {
    fn default() -> Self {
        Self {
            cue_duration: Duration::from_secs(2),
        }
    }
}

impl AudioBackend for LogOnlyBackend {
    fn load(&self, path: &Path) -> Result<Box<dyn AlertPlayer>, AudioError> {
        info!("Alert cue {} registered (log only)", path.display());
        Ok(Box::new(LogOnlyPlayer {
            path: path.to_path_buf(),
            cue_duration: self.cue_duration,
            started: None,
        }))
    }
}

struct LogOnlyPlayer {
    path: PathBuf,
    cue_duration: Duration,
    started: Option<Instant>,
}

impl AlertPlayer for LogOnlyPlayer {
    fn play(&mut self) -> Result<(), AudioError> {
        warn!("ALERT: playing {}", self.path.display());
        self.started = Some(Instant::now());
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.started
            .is_some_and(|started| started.elapsed() < self.cue_duration)
    }

    fn stop(&mut self) {
        self.started = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_only_cue_plays_for_duration() {
        let backend = LogOnlyBackend {
            cue_duration: Duration::from_secs(60),
        };
        let mut player = backend.load(Path::new("music.wav")).unwrap();
        assert!(!player.is_playing());

        player.play().unwrap();
        assert!(player.is_playing());

        player.stop();
        assert!(!player.is_playing());
    }

    #[test]
    fn test_zero_length_cue_never_reports_playing() {
        let backend = LogOnlyBackend {
            cue_duration: Duration::ZERO,
        };
        let mut player = backend.load(Path::new("music.wav")).unwrap();
        player.play().unwrap();
        assert!(!player.is_playing());
    }
}
