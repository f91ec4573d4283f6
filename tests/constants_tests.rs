// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use flaneur::constants::{
    EXPOSURE_SLIDER_RANGE, LENS_POSITION_RANGE, MAX_RECORDING_DURATION,
    MIN_USABLE_RECORDING_DURATION, SessionPreset,
};
use std::time::Duration;

#[test]
fn test_recording_limits() {
    assert_eq!(MAX_RECORDING_DURATION, Duration::from_secs(15));
    assert_eq!(MIN_USABLE_RECORDING_DURATION, Duration::from_millis(250));
}

#[test]
fn test_ranges_are_well_formed() {
    assert!(LENS_POSITION_RANGE.0 < LENS_POSITION_RANGE.1);
    assert!(EXPOSURE_SLIDER_RANGE.0 < 0.0 && EXPOSURE_SLIDER_RANGE.1 > 0.0);
}

#[test]
fn test_preset_display_names_are_unique() {
    let names: Vec<_> = SessionPreset::ALL.iter().map(|p| p.display_name()).collect();
    for (i, name) in names.iter().enumerate() {
        assert!(!names[i + 1..].contains(name), "Duplicate preset name {}", name);
    }
}

#[test]
fn test_version_is_set() {
    assert!(!flaneur::constants::app_info::version().is_empty());
}
