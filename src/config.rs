// SPDX-License-Identifier: GPL-3.0-only

//! Persisted capture defaults
//!
//! `Settings` is an explicit value owned by whoever composes the controller.
//! It is loaded once at startup and saved when the process is about to go
//! away; nothing reads it behind the owner's back.

use crate::backends::camera::{ExposureMode, FocusMode};
use crate::constants::{
    DEFAULT_LENS_POSITION, MAX_RECORDING_DURATION, MIN_USABLE_RECORDING_DURATION, SessionPreset,
};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "flaneur";
/// Settings file name
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Recording duration limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingLimits {
    /// Recording stops itself after this many seconds
    pub max_duration_secs: f64,
    /// Recordings must run longer than this to count as finished
    pub min_usable_secs: f64,
}

impl RecordingLimits {
    pub fn max_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_duration_secs).unwrap_or(MAX_RECORDING_DURATION)
    }

    pub fn min_usable(&self) -> Duration {
        Duration::try_from_secs_f64(self.min_usable_secs).unwrap_or(MIN_USABLE_RECORDING_DURATION)
    }

    /// Whether a recording of this length is worth keeping
    pub fn is_usable(&self, duration: Duration) -> bool {
        duration > self.min_usable()
    }
}

impl Default for RecordingLimits {
    fn default() -> Self {
        Self {
            max_duration_secs: MAX_RECORDING_DURATION.as_secs_f64(),
            min_usable_secs: MIN_USABLE_RECORDING_DURATION.as_secs_f64(),
        }
    }
}

/// User-facing capture defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Exposure mode restored on launch (continuous or locked)
    pub exposure_mode: ExposureMode,
    /// Focus mode preference; `Locked` applies `lens_position` at startup
    pub focus_mode: FocusMode,
    /// Whether the torch should be lit while the camera is in front
    pub torch_enabled: bool,
    /// Lens position applied at startup
    pub lens_position: f32,
    /// Exposure bias applied at startup, in EV
    pub exposure_bias: f32,
    /// Session capture preset
    pub preset: SessionPreset,
    /// Recording duration limits
    pub recording: RecordingLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exposure_mode: ExposureMode::ContinuousAuto,
            focus_mode: FocusMode::Locked,
            torch_enabled: false,
            lens_position: DEFAULT_LENS_POSITION,
            exposure_bias: 0.0,
            preset: SessionPreset::default(),
            recording: RecordingLimits::default(),
        }
    }
}

impl Settings {
    /// Default settings file location (`~/.config/flaneur/settings.json`)
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(ConfigError::Io(_)) if !path.exists() => {
                info!(path = %path.display(), "No settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable settings");
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_limits_threshold_is_exclusive() {
        let limits = RecordingLimits::default();
        assert!(!limits.is_usable(Duration::from_millis(100)));
        assert!(!limits.is_usable(Duration::from_millis(250)));
        assert!(limits.is_usable(Duration::from_millis(251)));
    }

    #[test]
    fn test_invalid_limits_fall_back() {
        let limits = RecordingLimits {
            max_duration_secs: -1.0,
            min_usable_secs: f64::NAN,
        };
        assert_eq!(limits.max_duration(), MAX_RECORDING_DURATION);
        assert_eq!(limits.min_usable(), MIN_USABLE_RECORDING_DURATION);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "torch_enabled": true }"#).unwrap();
        assert!(settings.torch_enabled);
        assert_eq!(settings.lens_position, DEFAULT_LENS_POSITION);
        assert_eq!(settings.recording, RecordingLimits::default());
    }
}
