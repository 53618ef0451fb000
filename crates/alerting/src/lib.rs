//! Alerting System
//!
//! Audio cue playback for drowsiness alerts, with repeat-play suppression.

mod manager;
mod player;

pub use manager::{AlertConfig, AlertManager, AlertState};
pub use player::{AlertPlayer, AudioBackend, AudioError, LogOnlyBackend};
