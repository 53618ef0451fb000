//! Alert Manager Implementation

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use crate::player::{AlertPlayer, AudioBackend, AudioError};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Sound played while the driver is drowsy
    pub sound_path: PathBuf,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sound_path: PathBuf::from("music.wav"),
        }
    }
}

/// State of the drowsiness alert
#[derive(Debug, Clone, Default)]
pub struct AlertState {
    /// Last time the cue was started
    pub last_fired: Option<Instant>,
    /// Number of times the cue was started
    pub fire_count: usize,
    /// Number of transitions into the alerting state
    pub rising_edges: usize,
    /// Whether the alert was raised on the last verdict
    pub active: bool,
}

/// Drives the alert cue from per-frame alert decisions
///
/// Starts the cue only when it is not already sounding, so a sustained
/// alert never stacks or restarts playback.
pub struct AlertManager {
    /// Loaded cue
    player: Box<dyn AlertPlayer>,
    /// Alert bookkeeping
    state: AlertState,
}

impl AlertManager {
    /// Create a new alert manager around a loaded cue
    pub fn new(player: Box<dyn AlertPlayer>) -> Self {
        Self {
            player,
            state: AlertState::default(),
        }
    }

    /// Load the configured cue through an audio backend
    pub fn load(backend: &dyn AudioBackend, config: &AlertConfig) -> Result<Self, AudioError> {
        info!("Loading alert sound from {}", config.sound_path.display());
        Ok(Self::new(backend.load(&config.sound_path)?))
    }

    /// Feed one frame's alert flag. Returns true if the cue was started.
    pub fn on_verdict(&mut self, alert: bool) -> Result<bool, AudioError> {
        if !alert {
            if self.state.active {
                debug!("Alert cleared");
            }
            self.state.active = false;
            return Ok(false);
        }

        if !self.state.active {
            self.state.rising_edges += 1;
            self.state.active = true;
        }

        if self.player.is_playing() {
            return Ok(false);
        }

        self.player.play()?;
        self.state.fire_count += 1;
        self.state.last_fired = Some(Instant::now());
        info!("Alert cue started (count: {})", self.state.fire_count);
        Ok(true)
    }

    /// Stop any sounding cue and clear the active flag
    pub fn silence(&mut self) {
        if self.player.is_playing() {
            debug!("Silencing alert cue");
        }
        self.player.stop();
        self.state.active = false;
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    /// Get number of times the cue was started
    pub fn fire_count(&self) -> usize {
        self.state.fire_count
    }
}
