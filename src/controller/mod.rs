// SPDX-License-Identifier: GPL-3.0-only

//! Capture session controller
//!
//! Owns the capture session, the device and the outputs, and is the only code
//! that touches the device. The UI layer drives it through plain method calls
//! and listens on the event stream returned by [`CaptureSessionController::new`].
//!
//! ```text
//!            start_session               start_recording
//!   ┌──────┐ ───────────▶ ┌─────────┐ ───────────────▶ ┌───────────┐
//!   │ Idle │              │ Running │                  │ Recording │
//!   └──────┘ ◀─────────── └─────────┘ ◀─────────────── └───────────┘
//!            stop_session              stop_recording / duration cap /
//!                                      output finished
//! ```
//!
//! Invalid transitions are ignored. Device setters run inside a
//! [`ConfigurationLock`](crate::backends::camera::ConfigurationLock) bracket;
//! failures are logged, reported as [`ControllerEvent::ConfigurationFailed`]
//! and the change is dropped.

mod events;
mod state;

pub use events::{
    ControllerEvent, EventReceiver, RecordingFinished, RecordingHandle, StopReason,
};
pub use state::SessionState;

use crate::backends::camera::lock::with_configuration_lock;
use crate::backends::camera::{
    CaptureBackend, CaptureDevice, CaptureSession, DeviceInfo, ExposureMode, FocusMode,
    MovieOutput, ParameterRange, PhotoOutput, PointOfInterest, TorchMode,
};
use crate::config::Settings;
use crate::constants::{DEFAULT_LENS_POSITION, LENS_POSITION_RANGE, SessionPreset};
use crate::errors::{ControllerError, DeviceError, DeviceResult};
use state::{ActiveRecording, RecordingState};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Everything guarded by the controller mutex
struct ControllerInner {
    session: Box<dyn CaptureSession>,
    device: Box<dyn CaptureDevice>,
    movie_output: Box<dyn MovieOutput>,
    photo_output: Option<Box<dyn PhotoOutput>>,
    running: bool,
    recording: RecordingState,
    settings: Settings,
}

impl ControllerInner {
    fn state(&self) -> SessionState {
        if self.recording.is_recording() {
            SessionState::Recording
        } else if self.running {
            SessionState::Running
        } else {
            SessionState::Idle
        }
    }

    /// Run a mutation inside a device lock bracket
    fn configure<R>(
        &mut self,
        operation: &'static str,
        configure: impl FnOnce(&mut dyn CaptureDevice) -> DeviceResult<R>,
    ) -> Result<R, ControllerError> {
        with_configuration_lock(self.device.as_mut(), configure)
            .map_err(|source| ControllerError::DeviceConfiguration { operation, source })
    }
}

/// Torch change that refuses up front on hardware without a torch
fn apply_torch(device: &mut dyn CaptureDevice, enabled: bool) -> DeviceResult<()> {
    if !device.has_torch() {
        return Err(DeviceError::Unsupported(format!(
            "{} has no torch",
            device.info().name
        )));
    }
    device.set_torch_mode(TorchMode::from_enabled(enabled))
}

fn lens_position_range() -> ParameterRange {
    ParameterRange::new(LENS_POSITION_RANGE.0, LENS_POSITION_RANGE.1)
}

/// Camera session and device-control façade
///
/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct CaptureSessionController {
    inner: Arc<Mutex<ControllerInner>>,
    events: mpsc::UnboundedSender<ControllerEvent>,
}

impl CaptureSessionController {
    /// Create a controller over `backend` and apply the initial device
    /// configuration from `settings`
    ///
    /// The session is not started; call [`start_session`](Self::start_session)
    /// when the capture screen comes to the foreground.
    pub fn new(backend: CaptureBackend, settings: Settings) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let CaptureBackend {
            session,
            device,
            movie_output,
            photo_output,
        } = backend;

        info!(device = %device.info().name, "Creating capture session controller");

        let controller = Self {
            inner: Arc::new(Mutex::new(ControllerInner {
                session,
                device,
                movie_output,
                photo_output,
                running: false,
                recording: RecordingState::Idle,
                settings,
            })),
            events,
        };
        controller.apply_initial_configuration();
        (controller, receiver)
    }

    fn lock(&self) -> MutexGuard<'_, ControllerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ControllerEvent) {
        if self.events.send(event).is_err() {
            trace!("No listener for controller events");
        }
    }

    /// Log and surface configuration failures, passing the result through
    fn report<T>(&self, result: Result<T, ControllerError>) -> Result<T, ControllerError> {
        if let Err(ControllerError::DeviceConfiguration { operation, source }) = &result {
            warn!(
                operation = *operation,
                error = %source,
                "Device configuration failed, change dropped"
            );
            self.emit(ControllerEvent::ConfigurationFailed {
                operation: *operation,
            });
        }
        result
    }

    /// Lens position, exposure bias and exposure mode in one bracket
    fn apply_initial_configuration(&self) {
        let result = {
            let mut inner = self.lock();
            let settings = inner.settings.clone();
            inner.configure("initial_configuration", |device| {
                if settings.focus_mode == FocusMode::Locked {
                    let lens = lens_position_range()
                        .clamp(settings.lens_position)
                        .unwrap_or(DEFAULT_LENS_POSITION);
                    device.set_focus_mode_locked(lens)?;
                }
                let bias = device
                    .exposure_bias_range()
                    .clamp(settings.exposure_bias)
                    .unwrap_or(0.0);
                device.set_exposure_target_bias(bias)?;
                device.set_exposure_mode(settings.exposure_mode)
            })
        };
        let _ = self.report(result);
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Start the capture session. Does nothing if it is already running.
    pub fn start_session(&self) {
        let mut inner = self.lock();
        if inner.running {
            debug!("Capture session already running");
            return;
        }
        let preset = inner.settings.preset;
        let session = inner.session.as_mut();
        let result = session
            .set_preset(preset)
            .and_then(|()| session.start_running());
        if result.is_ok() {
            inner.running = true;
        }
        drop(inner);

        match result {
            Ok(()) => {
                info!(preset = preset.display_name(), "Capture session started");
                self.emit(ControllerEvent::StateChanged(SessionState::Running));
            }
            Err(e) => {
                warn!(error = %e, "Failed to start capture session");
                self.emit(ControllerEvent::ConfigurationFailed {
                    operation: "start_session",
                });
            }
        }
    }

    /// Stop the capture session, ending any active recording first.
    /// Does nothing if the session is already stopped.
    pub fn stop_session(&self) {
        if self.is_recording() {
            self.finish_recording(None, StopReason::SessionStopped);
        }

        let mut inner = self.lock();
        if !inner.running {
            debug!("Capture session already stopped");
            return;
        }
        if let Err(e) = inner.session.stop_running() {
            warn!(error = %e, "Capture session did not stop cleanly");
        }
        inner.running = false;
        drop(inner);

        info!("Capture session stopped");
        self.emit(ControllerEvent::StateChanged(SessionState::Idle));
    }

    /// App moved to the background: end the recording and stop the session
    pub fn enter_background(&self) {
        debug!("Entering background");
        self.stop_session();
    }

    /// App became active again: restart the session and relight the torch
    /// if the user left it on
    pub fn become_active(&self) {
        debug!("Becoming active");
        self.start_session();
        let relight = {
            let inner = self.lock();
            inner.settings.torch_enabled && inner.device.has_torch()
        };
        if relight {
            let _ = self.set_torch(true);
        }
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Start recording to `destination`
    ///
    /// Returns `None` without side effects when the session is not running or
    /// a recording is already active. The returned handle resolves when the
    /// recording ends, however it ends.
    pub fn start_recording(&self, destination: impl Into<PathBuf>) -> Option<RecordingHandle> {
        let path = destination.into();
        let mut inner = self.lock();

        let state = inner.state();
        if state != SessionState::Running {
            let err = ControllerError::InvalidTransition {
                operation: "start_recording",
                state,
            };
            debug!(error = %err, "Ignoring start_recording");
            return None;
        }

        if let Err(e) = inner.movie_output.start_recording(&path) {
            drop(inner);
            warn!(path = %path.display(), error = %e, "Failed to start recording");
            self.emit(ControllerEvent::OutputFailed {
                operation: "start_recording",
                message: e.to_string(),
            });
            return None;
        }

        let id = Uuid::new_v4();
        let max_duration = inner.settings.recording.max_duration();
        let (completion, receiver) = oneshot::channel();
        let cap_task = self.spawn_duration_cap(id, max_duration);
        inner.recording = RecordingState::Active(ActiveRecording {
            id,
            path: path.clone(),
            started_at: Instant::now(),
            completion: Some(completion),
            cap_task,
        });
        drop(inner);

        info!(
            %id,
            path = %path.display(),
            max_secs = max_duration.as_secs_f64(),
            "Recording started"
        );
        self.emit(ControllerEvent::StateChanged(SessionState::Recording));
        Some(RecordingHandle::new(id, path, receiver))
    }

    /// Timer that stops recording `id` once `max_duration` has passed
    fn spawn_duration_cap(
        &self,
        id: Uuid,
        max_duration: Duration,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; recording duration cap is only applied on stop");
            return None;
        };
        let controller = self.clone();
        Some(runtime.spawn(async move {
            tokio::time::sleep(max_duration).await;
            if controller
                .finish_recording(Some(id), StopReason::DurationCap)
                .is_some()
            {
                info!(%id, "Recording reached maximum duration");
            }
        }))
    }

    /// Stop the active recording
    ///
    /// Returns the completion that was also sent to the recording's handle
    /// and the event stream, or `None` if nothing was recording.
    pub fn stop_recording(&self) -> Option<RecordingFinished> {
        let finished = self.finish_recording(None, StopReason::Requested);
        if finished.is_none() {
            debug!("No recording to stop");
        }
        finished
    }

    /// The movie output reports it finished writing `path` on its own
    ///
    /// Ends the recording if `path` is the active one. `error` is whatever
    /// the output reported alongside the completion.
    pub fn handle_output_finished(
        &self,
        path: &Path,
        error: Option<DeviceError>,
    ) -> Option<RecordingFinished> {
        let id = {
            let inner = self.lock();
            match inner.recording.file_path() {
                Some(active) if active == path => inner.recording.id(),
                _ => None,
            }
        };
        let Some(id) = id else {
            debug!(path = %path.display(), "Output finished for an inactive recording");
            return None;
        };

        if let Some(e) = error {
            warn!(path = %path.display(), error = %e, "Movie output finished with an error");
            self.emit(ControllerEvent::OutputFailed {
                operation: "recording",
                message: e.to_string(),
            });
        }
        self.finish_recording(Some(id), StopReason::OutputFinished)
    }

    fn finish_recording(&self, id: Option<Uuid>, reason: StopReason) -> Option<RecordingFinished> {
        let mut inner = self.lock();
        let mut active = inner.recording.take_matching(id)?;

        // The output's own clock wins when it keeps one
        let limits = inner.settings.recording;
        let duration = inner
            .movie_output
            .recorded_duration()
            .unwrap_or_else(|| active.started_at.elapsed())
            .min(limits.max_duration());

        // An output that reports finishing may still consider itself busy
        let stop_error = if reason == StopReason::OutputFinished
            && !inner.movie_output.is_recording()
        {
            None
        } else {
            inner.movie_output.stop_recording().err()
        };
        if reason != StopReason::DurationCap {
            if let Some(task) = active.cap_task.take() {
                task.abort();
            }
        }

        let discarded = !limits.is_usable(duration);
        let finished = RecordingFinished {
            id: active.id,
            path: active.path.clone(),
            duration,
            discarded,
            reason,
        };

        // The player comes up next; it should not be lit by the torch
        let torch_result = if !discarded
            && inner.settings.torch_enabled
            && inner.device.is_torch_active()
        {
            Some(inner.configure("set_torch", |device| {
                device.set_torch_mode(TorchMode::Off)
            }))
        } else {
            None
        };
        let state = inner.state();
        drop(inner);

        if let Some(e) = stop_error {
            warn!(path = %finished.path.display(), error = %e, "Failed to stop movie output");
            self.emit(ControllerEvent::OutputFailed {
                operation: "stop_recording",
                message: e.to_string(),
            });
        }
        if let Some(result) = torch_result {
            let _ = self.report(result);
        }

        if discarded {
            let err = ControllerError::RecordingTooShort { duration };
            info!(id = %finished.id, ?reason, error = %err, "Recording discarded");
        } else {
            info!(
                id = %finished.id,
                ?reason,
                secs = finished.duration_secs(),
                path = %finished.path.display(),
                "Recording finished"
            );
        }

        if let Some(completion) = active.completion.take() {
            let _ = completion.send(finished.clone());
        }
        self.emit(ControllerEvent::RecordingFinished(finished.clone()));
        self.emit(ControllerEvent::StateChanged(state));
        Some(finished)
    }

    // =========================================================================
    // Still capture
    // =========================================================================

    /// Capture a still photo while the session is running
    ///
    /// Returns the written path, or `None` if the session is idle, there is no
    /// photo output, or the capture failed.
    pub fn capture_photo(&self, destination: impl Into<PathBuf>) -> Option<PathBuf> {
        let destination = destination.into();
        let mut inner = self.lock();

        let state = inner.state();
        if state == SessionState::Idle {
            let err = ControllerError::InvalidTransition {
                operation: "capture_photo",
                state,
            };
            debug!(error = %err, "Ignoring capture_photo");
            return None;
        }
        let Some(output) = inner.photo_output.as_mut() else {
            warn!("No photo output attached");
            return None;
        };
        let result = output.capture_photo(&destination);
        drop(inner);

        match result {
            Ok(path) => {
                info!(path = %path.display(), "Photo captured");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "Photo capture failed");
                self.emit(ControllerEvent::OutputFailed {
                    operation: "capture_photo",
                    message: e.to_string(),
                });
                None
            }
        }
    }

    // =========================================================================
    // Device parameters
    // =========================================================================

    /// Set the exposure mode, optionally moving the exposure point first
    pub fn set_exposure_mode(
        &self,
        mode: ExposureMode,
        point: Option<PointOfInterest>,
    ) -> Result<(), ControllerError> {
        debug!(?mode, ?point, "Setting exposure mode");
        let result = self.lock().configure("set_exposure_mode", |device| {
            if let Some(point) = point {
                device.set_exposure_point_of_interest(point)?;
            }
            device.set_exposure_mode(mode)
        });
        self.report(result)
    }

    /// Meter at `point` using the exposure mode from settings
    pub fn set_exposure_point(&self, point: PointOfInterest) -> Result<(), ControllerError> {
        let mode = self.lock().settings.exposure_mode;
        self.set_exposure_mode(mode, Some(point))
    }

    /// Set the exposure target bias in EV
    ///
    /// Finite values are clamped to the range the device reports; NaN and
    /// infinities are rejected. Returns the bias actually applied.
    pub fn set_exposure_bias(&self, bias: f32) -> Result<f32, ControllerError> {
        let result = {
            let mut inner = self.lock();
            let result = inner.configure("set_exposure_bias", |device| {
                let range = device.exposure_bias_range();
                let applied = range.clamp(bias).ok_or_else(|| {
                    DeviceError::InvalidValue(format!("exposure bias {}", bias))
                })?;
                if applied != bias {
                    debug!(requested = bias, applied, "Clamped exposure bias to device range");
                }
                device.set_exposure_target_bias(applied)?;
                Ok(applied)
            });
            if let Ok(applied) = result {
                inner.settings.exposure_bias = applied;
            }
            result
        };
        self.report(result)
    }

    /// Lock focus at a lens position
    ///
    /// Finite values are clamped to [0, 1]; NaN and infinities are rejected.
    /// Returns the position actually applied.
    pub fn set_focus_lens_position(&self, position: f32) -> Result<f32, ControllerError> {
        let result = {
            let mut inner = self.lock();
            let result = inner.configure("set_focus_lens_position", |device| {
                let applied = lens_position_range().clamp(position).ok_or_else(|| {
                    DeviceError::InvalidValue(format!("lens position {}", position))
                })?;
                if applied != position {
                    debug!(requested = position, applied, "Clamped lens position");
                }
                device.set_focus_mode_locked(applied)?;
                Ok(applied)
            });
            if let Ok(applied) = result {
                inner.settings.lens_position = applied;
                inner.settings.focus_mode = FocusMode::Locked;
            }
            result
        };
        self.report(result)
    }

    /// Turn the torch on or off
    pub fn set_torch(&self, enabled: bool) -> Result<(), ControllerError> {
        debug!(enabled, "Setting torch");
        let result = self.lock().configure("set_torch", |device| apply_torch(device, enabled));
        self.report(result)
    }

    /// Switch between locked and continuous exposure, remembering the choice
    pub fn toggle_exposure_lock(&self) -> Result<ExposureMode, ControllerError> {
        let result = {
            let mut inner = self.lock();
            let mode = inner.device.exposure_mode().toggled_lock();
            let result = inner
                .configure("set_exposure_mode", |device| device.set_exposure_mode(mode))
                .map(|()| mode);
            if result.is_ok() {
                inner.settings.exposure_mode = mode;
            }
            result
        };
        debug!(?result, "Toggled exposure lock");
        self.report(result)
    }

    /// Flip the torch based on whether it is lit, remembering the choice
    pub fn toggle_torch(&self) -> Result<bool, ControllerError> {
        let result = {
            let mut inner = self.lock();
            let enabled = !inner.device.is_torch_active();
            let result = inner
                .configure("set_torch", |device| apply_torch(device, enabled))
                .map(|()| enabled);
            if result.is_ok() {
                inner.settings.torch_enabled = enabled;
            }
            result
        };
        debug!(?result, "Toggled torch");
        self.report(result)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    pub fn is_recording(&self) -> bool {
        self.lock().recording.is_recording()
    }

    /// Time since the active recording started
    pub fn recording_elapsed(&self) -> Option<Duration> {
        self.lock().recording.elapsed()
    }

    pub fn current_exposure_mode(&self) -> ExposureMode {
        self.lock().device.exposure_mode()
    }

    pub fn current_torch_state(&self) -> TorchMode {
        self.lock().device.torch_mode()
    }

    pub fn current_exposure_bias(&self) -> f32 {
        self.lock().device.exposure_target_bias()
    }

    pub fn current_lens_position(&self) -> f32 {
        self.lock().device.lens_position()
    }

    /// Preset the session captures with
    pub fn session_preset(&self) -> SessionPreset {
        self.lock().session.preset()
    }

    pub fn device_info(&self) -> DeviceInfo {
        self.lock().device.info()
    }

    /// Snapshot of the settings, including choices made through the toggles
    pub fn settings(&self) -> Settings {
        self.lock().settings.clone()
    }
}

impl std::fmt::Debug for CaptureSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CaptureSessionController")
            .field("state", &inner.state())
            .field("device", &inner.device.info().name)
            .field("recording", &inner.recording.file_path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::simulated::{SimulatedDevice, simulated_backend};

    #[test]
    fn test_initial_configuration_uses_one_bracket() {
        let (backend, probes) = simulated_backend();
        let settings = Settings {
            lens_position: 0.8,
            exposure_bias: -1.0,
            exposure_mode: ExposureMode::Locked,
            ..Settings::default()
        };
        let (controller, _events) = CaptureSessionController::new(backend, settings);

        assert_eq!(probes.device.lock_count(), 1);
        assert_eq!(probes.device.unlock_count(), 1);
        assert_eq!(controller.current_lens_position(), 0.8);
        assert_eq!(controller.current_exposure_bias(), -1.0);
        assert_eq!(controller.current_exposure_mode(), ExposureMode::Locked);
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_initial_configuration_clamps_bad_settings() {
        let (backend, _probes) = simulated_backend();
        let settings = Settings {
            lens_position: 3.0,
            exposure_bias: f32::NAN,
            ..Settings::default()
        };
        let (controller, _events) = CaptureSessionController::new(backend, settings);

        assert_eq!(controller.current_lens_position(), 1.0);
        assert_eq!(controller.current_exposure_bias(), 0.0);
    }

    #[test]
    fn test_recording_without_runtime_still_caps_duration() {
        let (backend, _probes) = simulated_backend();
        let (controller, _events) = CaptureSessionController::new(backend, Settings::default());
        controller.start_session();

        let handle = controller.start_recording("/tmp/no-runtime.mov");
        assert!(handle.is_some());
        assert!(controller.is_recording());

        let finished = controller.stop_recording().unwrap();
        assert!(finished.duration <= Settings::default().recording.max_duration());
        assert!(finished.discarded);
        assert_eq!(controller.state(), SessionState::Running);
    }

    #[test]
    fn test_debug_output_names_device() {
        let backend = CaptureBackend::new(
            Box::new(crate::backends::camera::simulated::SimulatedSession::new()),
            Box::new(SimulatedDevice::new()),
            Box::new(crate::backends::camera::simulated::SimulatedMovieOutput::new()),
        );
        let (controller, _events) = CaptureSessionController::new(backend, Settings::default());
        let debug = format!("{:?}", controller);
        assert!(debug.contains("Simulated Back Camera"));
        assert!(debug.contains("Idle"));
    }
}
