// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest recording the app keeps; the recording stops itself once reached
pub const MAX_RECORDING_DURATION: Duration = Duration::from_secs(15);

/// Recordings must run longer than this to be handed to the player
pub const MIN_USABLE_RECORDING_DURATION: Duration = Duration::from_millis(250);

/// Lens position the camera starts with (0.0 = nearest, 1.0 = farthest)
pub const DEFAULT_LENS_POSITION: f32 = 0.4;

/// Valid lens position range
pub const LENS_POSITION_RANGE: (f32, f32) = (0.0, 1.0);

/// Exposure bias range offered by the exposure slider, in EV
pub const EXPOSURE_SLIDER_RANGE: (f32, f32) = (-3.0, 3.0);

/// Container extension of recorded movies
pub const MOVIE_EXTENSION: &str = "mov";

/// Session capture presets
///
/// The app always records at 1080p; the other presets exist so backends can
/// report what they actually negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPreset {
    /// 1280x720
    Hd1280x720,
    /// 1920x1080 (default)
    #[default]
    Hd1920x1080,
    /// 3840x2160
    Uhd3840x2160,
}

impl SessionPreset {
    /// All presets, smallest first
    pub const ALL: [SessionPreset; 3] = [
        SessionPreset::Hd1280x720,
        SessionPreset::Hd1920x1080,
        SessionPreset::Uhd3840x2160,
    ];

    /// Frame dimensions (width, height) in landscape sensor orientation
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SessionPreset::Hd1280x720 => (1280, 720),
            SessionPreset::Hd1920x1080 => (1920, 1080),
            SessionPreset::Uhd3840x2160 => (3840, 2160),
        }
    }

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionPreset::Hd1280x720 => "720p",
            SessionPreset::Hd1920x1080 => "1080p",
            SessionPreset::Uhd3840x2160 => "4K",
        }
    }
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_limits_are_ordered() {
        assert!(MIN_USABLE_RECORDING_DURATION < MAX_RECORDING_DURATION);
    }

    #[test]
    fn test_default_lens_position_in_range() {
        let (min, max) = LENS_POSITION_RANGE;
        assert!((min..=max).contains(&DEFAULT_LENS_POSITION));
    }

    #[test]
    fn test_preset_dimensions() {
        assert_eq!(SessionPreset::default().dimensions(), (1920, 1080));
        let mut prev = 0;
        for preset in SessionPreset::ALL {
            let (w, h) = preset.dimensions();
            assert!(w * h > prev);
            prev = w * h;
        }
    }
}
