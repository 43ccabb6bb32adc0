//! Layered monitor settings: defaults, optional file, environment

use alerting::{TrackerConfig, TrackerError};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment prefix, e.g. `DMS_MONITOR__SOUND__VOLUME=0.4`
pub const ENV_PREFIX: &str = "DMS_MONITOR";

/// Settings error types
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Alert sound settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    /// Master switch for audible alerts
    pub enabled: bool,
    /// Playback volume (0.0-1.0, default: 0.7)
    pub volume: f32,
    /// WAV clip to play; the synthesized tone is used without one
    pub clip_path: Option<PathBuf>,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.7,
            clip_path: None,
        }
    }
}

/// Monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Escalation timings
    pub tracker: TrackerConfig,
    /// Sound output
    pub sound: SoundSettings,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            json_logs: false,
            tracker: TrackerConfig::default(),
            sound: SoundSettings::default(),
        }
    }
}

impl MonitorSettings {
    /// Load settings from an optional file plus `DMS_MONITOR__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.tracker.validate()?;
        if !(0.0..=1.0).contains(&self.sound.volume) {
            return Err(SettingsError::Invalid(format!(
                "sound.volume must be within 0.0-1.0, got {}",
                self.sound.volume
            )));
        }
        Ok(())
    }
}
