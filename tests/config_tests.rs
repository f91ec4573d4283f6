// SPDX-License-Identifier: MPL-2.0

//! Integration tests for settings persistence

use flaneur::Settings;
use flaneur::backends::camera::{ExposureMode, FocusMode};
use flaneur::constants::DEFAULT_LENS_POSITION;
use std::path::PathBuf;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("flaneur-config-{}", uuid::Uuid::new_v4()))
        .join(name)
}

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.exposure_mode, ExposureMode::ContinuousAuto);
    assert_eq!(settings.focus_mode, FocusMode::Locked);
    assert_eq!(settings.lens_position, DEFAULT_LENS_POSITION);
    assert!(!settings.torch_enabled, "Torch should be off by default");
}

#[test]
fn test_settings_save_and_load() {
    let path = scratch_path("settings.json");
    let settings = Settings {
        exposure_mode: ExposureMode::Locked,
        torch_enabled: true,
        lens_position: 0.75,
        exposure_bias: -1.5,
        ..Settings::default()
    };

    settings.save(&path).unwrap();
    let loaded = Settings::load(&path).unwrap();
    assert_eq!(loaded, settings);

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn test_missing_file_gives_defaults() {
    let path = scratch_path("missing.json");
    assert!(Settings::load(&path).is_err());
    assert_eq!(Settings::load_or_default(&path), Settings::default());
}

#[test]
fn test_corrupt_file_gives_defaults() {
    let path = scratch_path("corrupt.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Settings::load(&path).is_err());
    assert_eq!(Settings::load_or_default(&path), Settings::default());

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}
