// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture core

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for backend calls
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Device or session backend errors
    Device(DeviceError),
    /// Settings load/save errors
    Config(ConfigError),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors reported by a capture backend
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The device refused the configuration lock (busy, disconnected, ...)
    LockUnavailable(String),
    /// The device does not support the requested mode or value
    Unsupported(String),
    /// A value was rejected before reaching the device (NaN, infinity)
    InvalidValue(String),
    /// The device accepted the lock but the mutation failed
    Failed(String),
    /// Session-level failure (start/stop running)
    Session(String),
    /// Output-level failure (movie file, photo)
    Output(String),
}

/// Settings persistence errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Settings file could not be read or written
    Io(String),
    /// Settings file content is not valid
    Parse(String),
    /// No configuration directory on this platform
    NoConfigDir,
}

/// Classification of a controller failure
///
/// None of these are fatal. Device configuration failures are logged and
/// surfaced as an event, invalid transitions are ignored, and short
/// recordings come out as discarded completions.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// Lock or mutation failure; the requested change was dropped
    DeviceConfiguration {
        /// Name of the operation, e.g. `set_torch`
        operation: &'static str,
        /// What the backend reported
        source: DeviceError,
    },
    /// Operation not valid in the current state
    InvalidTransition {
        /// Name of the operation
        operation: &'static str,
        /// State the controller was in
        state: crate::controller::SessionState,
    },
    /// Recording did not run past the usable threshold
    RecordingTooShort {
        /// Duration the recording actually ran
        duration: std::time::Duration,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Device(e) => write!(f, "Device error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::LockUnavailable(msg) => write!(f, "Could not lock device: {}", msg),
            DeviceError::Unsupported(msg) => write!(f, "Not supported: {}", msg),
            DeviceError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
            DeviceError::Failed(msg) => write!(f, "Configuration failed: {}", msg),
            DeviceError::Session(msg) => write!(f, "Session error: {}", msg),
            DeviceError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Invalid settings file: {}", msg),
            ConfigError::NoConfigDir => write!(f, "No configuration directory available"),
        }
    }
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::DeviceConfiguration { operation, source } => {
                write!(f, "{} failed: {}", operation, source)
            }
            ControllerError::InvalidTransition { operation, state } => {
                write!(f, "{} is not valid while {:?}", operation, state)
            }
            ControllerError::RecordingTooShort { duration } => write!(
                f,
                "Recording too short ({:.2}s)",
                duration.as_secs_f64()
            ),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DeviceError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ControllerError {}

impl From<DeviceError> for AppError {
    fn from(err: DeviceError) -> Self {
        AppError::Device(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
