// SPDX-License-Identifier: MPL-2.0

//! Capture backend abstraction
//!
//! The controller never talks to platform media APIs directly. A backend
//! provides the session, the device and the outputs through these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │        UI Layer          │
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │ CaptureSessionController │  ← State machine, lock discipline
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │ CaptureSession           │
//! │ CaptureDevice            │  ← Backend traits
//! │ MovieOutput / PhotoOutput│
//! └────────────┬─────────────┘
//!              │
//!              ▼
//!   ┌─────────────────────┐
//!   │ Platform / Simulated│  ← Concrete implementation
//!   └─────────────────────┘
//! ```

pub mod lock;
pub mod simulated;
pub mod types;

pub use lock::ConfigurationLock;
pub use types::*;

use crate::constants::SessionPreset;
use crate::errors::DeviceResult;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The capture session the device and outputs are attached to
pub trait CaptureSession: Send {
    /// Start delivering frames to preview and outputs
    fn start_running(&mut self) -> DeviceResult<()>;

    /// Stop delivering frames
    fn stop_running(&mut self) -> DeviceResult<()>;

    /// Whether the session is currently running
    fn is_running(&self) -> bool;

    /// Select the capture preset used from the next start on
    fn set_preset(&mut self, preset: SessionPreset) -> DeviceResult<()>;

    fn preset(&self) -> SessionPreset;
}

/// The active capture hardware
///
/// Mutators are only valid between `lock_for_configuration` and
/// `unlock_for_configuration`. Calling one outside that bracket is a
/// programming error; use [`ConfigurationLock`] rather than calling the lock
/// methods by hand.
pub trait CaptureDevice: Send {
    /// Describe the device
    fn info(&self) -> DeviceInfo;

    // ===== Lock bracket =====

    /// Acquire exclusive configuration access
    fn lock_for_configuration(&mut self) -> DeviceResult<()>;

    /// Release exclusive configuration access
    fn unlock_for_configuration(&mut self);

    // ===== Exposure =====

    fn exposure_mode(&self) -> ExposureMode;

    fn set_exposure_mode(&mut self, mode: ExposureMode) -> DeviceResult<()>;

    fn set_exposure_point_of_interest(&mut self, point: PointOfInterest) -> DeviceResult<()>;

    fn exposure_target_bias(&self) -> f32;

    /// Range the device accepts for the exposure target bias, in EV
    fn exposure_bias_range(&self) -> ParameterRange;

    fn set_exposure_target_bias(&mut self, bias: f32) -> DeviceResult<()>;

    // ===== Focus =====

    fn focus_mode(&self) -> FocusMode;

    fn lens_position(&self) -> f32;

    /// Lock focus at a lens position in [0, 1]
    fn set_focus_mode_locked(&mut self, lens_position: f32) -> DeviceResult<()>;

    // ===== Torch =====

    fn has_torch(&self) -> bool;

    /// Whether the torch LED is actually lit
    fn is_torch_active(&self) -> bool;

    fn torch_mode(&self) -> TorchMode;

    fn set_torch_mode(&mut self, mode: TorchMode) -> DeviceResult<()>;
}

/// Movie file output
pub trait MovieOutput: Send {
    /// Begin writing a movie to `destination`
    fn start_recording(&mut self, destination: &Path) -> DeviceResult<()>;

    /// Stop writing and finalize the file
    fn stop_recording(&mut self) -> DeviceResult<()>;

    /// Whether the output is currently writing
    fn is_recording(&self) -> bool;

    /// Duration written so far, if the output tracks it
    fn recorded_duration(&self) -> Option<Duration> {
        None
    }
}

/// Still photo output
pub trait PhotoOutput: Send {
    /// Capture a single still and write it to `destination`
    fn capture_photo(&mut self, destination: &Path) -> DeviceResult<PathBuf>;
}

/// Everything a controller needs from a platform
pub struct CaptureBackend {
    pub session: Box<dyn CaptureSession>,
    pub device: Box<dyn CaptureDevice>,
    pub movie_output: Box<dyn MovieOutput>,
    pub photo_output: Option<Box<dyn PhotoOutput>>,
}

impl CaptureBackend {
    pub fn new(
        session: Box<dyn CaptureSession>,
        device: Box<dyn CaptureDevice>,
        movie_output: Box<dyn MovieOutput>,
    ) -> Self {
        Self {
            session,
            device,
            movie_output,
            photo_output: None,
        }
    }

    /// Attach a still photo output
    pub fn with_photo_output(mut self, output: Box<dyn PhotoOutput>) -> Self {
        self.photo_output = Some(output);
        self
    }
}

impl std::fmt::Debug for CaptureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureBackend")
            .field("device", &self.device.info().name)
            .field("session_running", &self.session.is_running())
            .field("has_photo_output", &self.photo_output.is_some())
            .finish()
    }
}
