// SPDX-License-Identifier: MPL-2.0

//! Flaneur - capture core for a minimal video camera
//!
//! This library holds the part of the camera app that is not UI: the capture
//! session state machine, device configuration with strict lock discipline,
//! recording lifecycle with a duration cap, permission gating and export of
//! finished recordings.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`controller`]: `CaptureSessionController`, the session/device façade
//! - [`backends`]: Platform seam (session, device, outputs) and a simulated backend
//! - [`config`]: Persisted capture defaults
//! - [`permissions`]: Camera, microphone and photo library gating
//! - [`storage`]: Temporary recording paths, export and cleanup
//!
//! # Example
//!
//! ```no_run
//! use flaneur::backends::camera::simulated::simulated_backend;
//! use flaneur::{CaptureSessionController, Settings};
//!
//! # async fn demo() {
//! let (backend, _probes) = simulated_backend();
//! let (controller, _events) = CaptureSessionController::new(backend, Settings::default());
//! controller.start_session();
//! if let Some(handle) = controller.start_recording(flaneur::storage::temporary_recording_path()) {
//!     let finished = handle.finished().await;
//!     println!("{:?}", finished);
//! }
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod controller;
pub mod errors;
pub mod permissions;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::{CaptureBackend, ExposureMode, PointOfInterest, TorchMode};
pub use config::Settings;
pub use controller::{
    CaptureSessionController, ControllerEvent, RecordingFinished, RecordingHandle, SessionState,
};
pub use errors::{AppError, AppResult, ControllerError, DeviceError};
