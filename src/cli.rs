// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Recording a clip through the capture controller
//! - Showing and resetting the persisted settings

use flaneur::backends::camera::CaptureBackend;
use flaneur::backends::camera::simulated::{
    SimulatedDevice, SimulatedMovieOutput, SimulatedPhotoOutput, SimulatedSession,
};
use flaneur::constants::EXPOSURE_SLIDER_RANGE;
use flaneur::permissions::{PermissionGate, StaticPermissions};
use flaneur::{CaptureSessionController, ControllerEvent, Settings, storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Options for the `record` command
#[derive(Debug, Default)]
pub struct RecordOptions {
    /// Stop after this many seconds
    pub duration: Option<f64>,
    /// Export directory
    pub output: Option<PathBuf>,
    /// Light the torch for this recording only
    pub torch: bool,
    /// Exposure bias in EV
    pub bias: Option<f32>,
}

/// Record one clip with the simulated camera and export it if usable
pub fn record(
    settings_path: &Path,
    options: RecordOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(record_clip(settings_path, options))
}

async fn record_clip(
    settings_path: &Path,
    options: RecordOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let RecordOptions {
        duration,
        output,
        torch,
        bias,
    } = options;

    // Nothing is captured until every permission is in place
    let gate = PermissionGate::new(StaticPermissions::new(true));
    let report = gate.request_missing().await;
    if !report.all_granted() {
        for permission in report.denied() {
            let alert = permission.denied_alert();
            eprintln!("{}: {}", alert.title, alert.message);
        }
        return Err("Required permissions are missing".into());
    }

    let library_dir = match output {
        Some(dir) => dir,
        None => storage::default_library_dir().ok_or("No video directory available")?,
    };

    let settings = Settings::load_or_default(settings_path);
    let backend = CaptureBackend::new(
        Box::new(SimulatedSession::new()),
        Box::new(SimulatedDevice::new()),
        Box::new(SimulatedMovieOutput::new().with_file_writes()),
    )
    .with_photo_output(Box::new(SimulatedPhotoOutput::new().with_file_writes()));
    let (controller, mut events) = CaptureSessionController::new(backend, settings);

    controller.become_active();
    if torch {
        let _ = controller.set_torch(true);
    }
    if let Some(bias) = bias {
        let (min, max) = EXPOSURE_SLIDER_RANGE;
        let applied = controller.set_exposure_bias(bias.clamp(min, max))?;
        println!("Exposure bias: {:+.1} EV", applied);
    }

    let path = storage::temporary_recording_path();
    let Some(mut handle) = controller.start_recording(&path) else {
        return Err("Could not start recording".into());
    };
    let (width, height) = controller.session_preset().dimensions();
    println!(
        "Using camera: {} ({}x{})",
        controller.device_info().name,
        width,
        height
    );
    println!("Recording to {} (Ctrl+C to stop)", path.display());

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let target = duration.and_then(|secs| Duration::try_from_secs_f64(secs).ok());
    let start = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    let finished = loop {
        ticker.tick().await;

        if let Some(finished) = handle.try_finished() {
            println!();
            break Some(finished);
        }

        let elapsed = controller.recording_elapsed().unwrap_or_default();
        print!("\rRecording: {:05.2}s", elapsed.as_secs_f64());
        std::io::Write::flush(&mut std::io::stdout())?;

        let reached_target = target.is_some_and(|target| start.elapsed() >= target);
        if stop_flag.load(Ordering::SeqCst) || reached_target {
            println!();
            break controller.stop_recording();
        }
    };

    if torch {
        release_torch(&controller);
    }

    while let Ok(event) = events.try_recv() {
        match event {
            ControllerEvent::ConfigurationFailed { operation } => {
                eprintln!("Camera configuration failed: {}", operation);
            }
            ControllerEvent::OutputFailed { operation, message } => {
                eprintln!("{} failed: {}", operation, message);
            }
            _ => {}
        }
    }

    match finished {
        Some(finished) if finished.is_usable() => {
            let exported = storage::export_recording(&finished.path, &library_dir).await?;
            storage::discard_recording(&finished.path).await?;
            println!(
                "Saved {:.2}s video to {}",
                finished.duration_secs(),
                exported.display()
            );
        }
        Some(finished) => {
            storage::discard_recording(&finished.path).await?;
            println!(
                "Recording too short ({:.2}s), discarded",
                finished.duration_secs()
            );
        }
        None => return Err("Recording did not complete".into()),
    }

    controller.enter_background();
    controller.settings().save(settings_path)?;
    Ok(())
}

/// Turn off a torch lit with `--torch`; it only lasts for one recording
fn release_torch(controller: &CaptureSessionController) {
    if controller.current_torch_state().is_on() {
        let _ = controller.set_torch(false);
    }
}

/// Print the effective settings as JSON
pub fn show_settings(settings_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load_or_default(settings_path);
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Overwrite the settings file with defaults
pub fn reset_settings(settings_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    Settings::default().save(settings_path)?;
    println!("Settings reset: {}", settings_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flaneur::TorchMode;
    use flaneur::backends::camera::simulated::simulated_backend;

    #[tokio::test(start_paused = true)]
    async fn test_torch_flag_is_released_after_recording() {
        let (backend, _probes) = simulated_backend();
        let (controller, _events) = CaptureSessionController::new(backend, Settings::default());
        controller.become_active();
        controller.set_torch(true).unwrap();

        controller.start_recording("/tmp/cli-torch.mov").unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(controller.stop_recording().unwrap().is_usable());
        // Not a remembered choice, so finishing the recording leaves it lit
        assert_eq!(controller.current_torch_state(), TorchMode::On);

        release_torch(&controller);
        assert_eq!(controller.current_torch_state(), TorchMode::Off);
        assert!(!controller.settings().torch_enabled);
    }
}
