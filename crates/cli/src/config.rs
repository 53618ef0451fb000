//! Layered application configuration

use std::path::Path;
use std::time::Duration;

use alerting::AlertConfig;
use camera_capture::CameraConfig;
use config::{Config, ConfigError, Environment, File};
use dms::SessionConfig;
use serde::{Deserialize, Serialize};
use session::RunnerOptions;

/// Environment variable prefix, e.g. `DROWSY_SESSION__EAR_THRESHOLD`
pub const ENV_PREFIX: &str = "DROWSY";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level: error, warn, info, debug, trace
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Capture loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Spacing between ticks (milliseconds)
    pub tick_interval_ms: u64,
    /// Reports buffered for the consumer
    pub channel_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            channel_capacity: 64,
        }
    }
}

impl LoopConfig {
    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            channel_capacity: self.channel_capacity,
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub camera: CameraConfig,
    pub alert: AlertConfig,
    #[serde(rename = "loop")]
    pub capture_loop: LoopConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from an optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        } else {
            builder = builder.add_source(File::with_name("drowsiness").required(false));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
