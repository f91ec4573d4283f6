// SPDX-License-Identifier: GPL-3.0-only

//! In-process simulated capture backend
//!
//! Behaves like a well-mannered camera: it enforces the configuration lock,
//! rejects out-of-range values the way hardware does, and counts every lock
//! and unlock so callers can check bracket discipline. Faults can be injected
//! through the shared [`DeviceStats`] handle even after the device has been
//! moved into a controller.

use super::{
    CaptureBackend, CaptureDevice, CaptureSession, DeviceInfo, ExposureMode, FocusMode,
    MovieOutput, ParameterRange, PhotoOutput, PointOfInterest, TorchMode,
};
use crate::constants::{DEFAULT_LENS_POSITION, LENS_POSITION_RANGE, SessionPreset};
use crate::errors::{DeviceError, DeviceResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Bytes written in place of real media when file writes are enabled
const PLACEHOLDER_MOVIE: &[u8] = b"\x00\x00\x00\x14ftypqt  \x00\x00\x02\x00qt  ";
const PLACEHOLDER_PHOTO: &[u8] = b"\xFF\xD8\xFF\xD9";

/// Failure the simulated device should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `lock_for_configuration` fails
    RefuseLock,
    /// Every mutator returns an error
    FailMutation,
    /// Every mutator panics
    PanicOnMutation,
}

#[derive(Debug, Default)]
struct StatsInner {
    locks: AtomicUsize,
    unlocks: AtomicUsize,
    mutations: AtomicUsize,
    locked: AtomicBool,
    fault: Mutex<Option<Fault>>,
}

/// Shared view of a simulated device's lock accounting and fault state
#[derive(Debug, Clone, Default)]
pub struct DeviceStats {
    inner: Arc<StatsInner>,
}

impl DeviceStats {
    pub fn lock_count(&self) -> usize {
        self.inner.locks.load(Ordering::SeqCst)
    }

    pub fn unlock_count(&self) -> usize {
        self.inner.unlocks.load(Ordering::SeqCst)
    }

    /// Number of mutator calls that reached the device
    pub fn mutation_count(&self) -> usize {
        self.inner.mutations.load(Ordering::SeqCst)
    }

    pub fn is_locked(&self) -> bool {
        self.inner.locked.load(Ordering::SeqCst)
    }

    /// Make the device fail in the given way until cleared
    pub fn inject_fault(&self, fault: Fault) {
        *self.fault_slot() = Some(fault);
    }

    pub fn clear_fault(&self) {
        *self.fault_slot() = None;
    }

    fn fault(&self) -> Option<Fault> {
        *self.fault_slot()
    }

    fn fault_slot(&self) -> std::sync::MutexGuard<'_, Option<Fault>> {
        self.inner
            .fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Simulated capture device
#[derive(Debug)]
pub struct SimulatedDevice {
    stats: DeviceStats,
    has_torch: bool,
    exposure_mode: ExposureMode,
    exposure_point: PointOfInterest,
    exposure_bias: f32,
    bias_range: ParameterRange,
    focus_mode: FocusMode,
    lens_position: f32,
    torch_mode: TorchMode,
}

impl SimulatedDevice {
    /// Back wide-angle camera with a torch and a ±8 EV bias range
    pub fn new() -> Self {
        Self {
            stats: DeviceStats::default(),
            has_torch: true,
            exposure_mode: ExposureMode::ContinuousAuto,
            exposure_point: PointOfInterest::CENTER,
            exposure_bias: 0.0,
            bias_range: ParameterRange::new(-8.0, 8.0),
            focus_mode: FocusMode::ContinuousAuto,
            lens_position: DEFAULT_LENS_POSITION,
            torch_mode: TorchMode::Off,
        }
    }

    /// Device without a torch LED (e.g. a front camera)
    pub fn without_torch(mut self) -> Self {
        self.has_torch = false;
        self
    }

    /// Override the exposure bias range the device reports
    pub fn with_bias_range(mut self, range: ParameterRange) -> Self {
        self.bias_range = range;
        self
    }

    /// Shared handle for inspecting lock accounting and injecting faults
    pub fn stats(&self) -> DeviceStats {
        self.stats.clone()
    }

    pub fn inject_fault(&self, fault: Fault) {
        self.stats.inject_fault(fault);
    }

    pub fn exposure_point(&self) -> PointOfInterest {
        self.exposure_point
    }

    /// Gate every mutator: must be locked, then apply any injected fault
    fn begin_mutation(&self, what: &str) -> DeviceResult<()> {
        assert!(
            self.stats.is_locked(),
            "{} called without holding the configuration lock",
            what
        );
        match self.stats.fault() {
            Some(Fault::FailMutation) => {
                return Err(DeviceError::Failed(format!("{} rejected by device", what)));
            }
            Some(Fault::PanicOnMutation) => panic!("{} crashed in the device", what),
            _ => {}
        }
        self.stats.inner.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDevice for SimulatedDevice {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Simulated Back Camera".to_string(),
            id: "simulated:0".to_string(),
            has_torch: self.has_torch,
        }
    }

    fn lock_for_configuration(&mut self) -> DeviceResult<()> {
        if self.stats.fault() == Some(Fault::RefuseLock) {
            return Err(DeviceError::LockUnavailable(
                "device is in use by another client".to_string(),
            ));
        }
        assert!(
            !self.stats.is_locked(),
            "configuration lock acquired twice without release"
        );
        self.stats.inner.locked.store(true, Ordering::SeqCst);
        self.stats.inner.locks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unlock_for_configuration(&mut self) {
        assert!(
            self.stats.is_locked(),
            "configuration lock released without being held"
        );
        self.stats.inner.locked.store(false, Ordering::SeqCst);
        self.stats.inner.unlocks.fetch_add(1, Ordering::SeqCst);
    }

    fn exposure_mode(&self) -> ExposureMode {
        self.exposure_mode
    }

    fn set_exposure_mode(&mut self, mode: ExposureMode) -> DeviceResult<()> {
        self.begin_mutation("set_exposure_mode")?;
        self.exposure_mode = mode;
        Ok(())
    }

    fn set_exposure_point_of_interest(&mut self, point: PointOfInterest) -> DeviceResult<()> {
        self.begin_mutation("set_exposure_point_of_interest")?;
        self.exposure_point = point;
        Ok(())
    }

    fn exposure_target_bias(&self) -> f32 {
        self.exposure_bias
    }

    fn exposure_bias_range(&self) -> ParameterRange {
        self.bias_range
    }

    fn set_exposure_target_bias(&mut self, bias: f32) -> DeviceResult<()> {
        self.begin_mutation("set_exposure_target_bias")?;
        if !self.bias_range.contains(bias) {
            return Err(DeviceError::InvalidValue(format!(
                "bias {} outside [{}, {}]",
                bias, self.bias_range.min, self.bias_range.max
            )));
        }
        self.exposure_bias = bias;
        Ok(())
    }

    fn focus_mode(&self) -> FocusMode {
        self.focus_mode
    }

    fn lens_position(&self) -> f32 {
        self.lens_position
    }

    fn set_focus_mode_locked(&mut self, lens_position: f32) -> DeviceResult<()> {
        self.begin_mutation("set_focus_mode_locked")?;
        let (min, max) = LENS_POSITION_RANGE;
        if !(min..=max).contains(&lens_position) {
            return Err(DeviceError::InvalidValue(format!(
                "lens position {} outside [{}, {}]",
                lens_position, min, max
            )));
        }
        self.focus_mode = FocusMode::Locked;
        self.lens_position = lens_position;
        Ok(())
    }

    fn has_torch(&self) -> bool {
        self.has_torch
    }

    fn is_torch_active(&self) -> bool {
        self.has_torch && self.torch_mode.is_on()
    }

    fn torch_mode(&self) -> TorchMode {
        self.torch_mode
    }

    fn set_torch_mode(&mut self, mode: TorchMode) -> DeviceResult<()> {
        self.begin_mutation("set_torch_mode")?;
        if !self.has_torch {
            return Err(DeviceError::Unsupported("device has no torch".to_string()));
        }
        self.torch_mode = mode;
        Ok(())
    }
}

/// Simulated capture session
#[derive(Debug, Default)]
pub struct SimulatedSession {
    running: bool,
    fail_start: bool,
    preset: SessionPreset,
}

impl SimulatedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session whose `start_running` always fails
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }
}

impl CaptureSession for SimulatedSession {
    fn start_running(&mut self) -> DeviceResult<()> {
        if self.fail_start {
            return Err(DeviceError::Session("camera unavailable".to_string()));
        }
        self.running = true;
        Ok(())
    }

    fn stop_running(&mut self) -> DeviceResult<()> {
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_preset(&mut self, preset: SessionPreset) -> DeviceResult<()> {
        let (width, height) = preset.dimensions();
        debug!(width, height, "Simulated session preset");
        self.preset = preset;
        Ok(())
    }

    fn preset(&self) -> SessionPreset {
        self.preset
    }
}

/// Counters for the simulated movie output
#[derive(Debug, Clone, Default)]
pub struct OutputStats {
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl OutputStats {
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

/// Simulated movie file output
#[derive(Debug, Default)]
pub struct SimulatedMovieOutput {
    stats: OutputStats,
    active: Option<(PathBuf, Instant)>,
    write_files: bool,
    fail_start: bool,
}

impl SimulatedMovieOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a placeholder movie file on stop
    pub fn with_file_writes(mut self) -> Self {
        self.write_files = true;
        self
    }

    /// Output whose `start_recording` always fails
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> OutputStats {
        self.stats.clone()
    }
}

impl MovieOutput for SimulatedMovieOutput {
    fn start_recording(&mut self, destination: &Path) -> DeviceResult<()> {
        if self.fail_start {
            return Err(DeviceError::Output("not enough storage".to_string()));
        }
        if self.active.is_some() {
            return Err(DeviceError::Output("already recording".to_string()));
        }
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        self.active = Some((destination.to_path_buf(), Instant::now()));
        debug!(path = %destination.display(), "Simulated output started");
        Ok(())
    }

    fn stop_recording(&mut self) -> DeviceResult<()> {
        let Some((path, _)) = self.active.take() else {
            return Err(DeviceError::Output("not recording".to_string()));
        };
        self.stats.stops.fetch_add(1, Ordering::SeqCst);
        if self.write_files {
            std::fs::write(&path, PLACEHOLDER_MOVIE)
                .map_err(|e| DeviceError::Output(format!("failed to write movie: {}", e)))?;
        }
        debug!(path = %path.display(), "Simulated output stopped");
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    fn recorded_duration(&self) -> Option<Duration> {
        self.active.as_ref().map(|(_, started)| started.elapsed())
    }
}

/// Simulated still photo output
#[derive(Debug, Default)]
pub struct SimulatedPhotoOutput {
    write_files: bool,
}

impl SimulatedPhotoOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_writes(mut self) -> Self {
        self.write_files = true;
        self
    }
}

impl PhotoOutput for SimulatedPhotoOutput {
    fn capture_photo(&mut self, destination: &Path) -> DeviceResult<PathBuf> {
        let path = destination.with_extension("jpg");
        if self.write_files {
            std::fs::write(&path, PLACEHOLDER_PHOTO)
                .map_err(|e| DeviceError::Output(format!("failed to write photo: {}", e)))?;
        }
        Ok(path)
    }
}

/// Handles for inspecting a backend built by [`simulated_backend`]
#[derive(Debug, Clone)]
pub struct SimulatedProbes {
    pub device: DeviceStats,
    pub output: OutputStats,
}

/// Assemble a complete simulated backend
pub fn simulated_backend() -> (CaptureBackend, SimulatedProbes) {
    let device = SimulatedDevice::new();
    let output = SimulatedMovieOutput::new();
    let probes = SimulatedProbes {
        device: device.stats(),
        output: output.stats(),
    };
    info!(device = %device.info().name, "Using simulated capture backend");
    let backend = CaptureBackend::new(
        Box::new(SimulatedSession::new()),
        Box::new(device),
        Box::new(output),
    )
    .with_photo_output(Box::new(SimulatedPhotoOutput::new()));
    (backend, probes)
}
