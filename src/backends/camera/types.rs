// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for capture backends

use serde::{Deserialize, Serialize};

/// Exposure modes a capture device can run in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExposureMode {
    /// Single automatic adjustment, then hold
    Auto,
    /// Continuously re-meter the scene
    #[default]
    ContinuousAuto,
    /// Hold the current exposure
    Locked,
}

impl ExposureMode {
    /// Mode the exposure lock button switches to from this one
    pub fn toggled_lock(self) -> Self {
        match self {
            ExposureMode::Locked => ExposureMode::ContinuousAuto,
            ExposureMode::Auto | ExposureMode::ContinuousAuto => ExposureMode::Locked,
        }
    }

    /// Get display name for UI
    pub fn display_name(self) -> &'static str {
        match self {
            ExposureMode::Auto => "Auto",
            ExposureMode::ContinuousAuto => "Continuous",
            ExposureMode::Locked => "Locked",
        }
    }
}

/// Focus modes a capture device can run in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusMode {
    /// Lens held at a fixed position
    Locked,
    /// Single autofocus pass
    Auto,
    /// Continuous autofocus
    #[default]
    ContinuousAuto,
}

/// Torch (continuous LED) state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TorchMode {
    #[default]
    Off,
    On,
}

impl TorchMode {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled { TorchMode::On } else { TorchMode::Off }
    }

    pub fn is_on(self) -> bool {
        self == TorchMode::On
    }
}

/// Point in normalized device coordinates
///
/// (0, 0) is the top-left of the sensor in its native landscape orientation
/// and (1, 1) the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub x: f32,
    pub y: f32,
}

impl PointOfInterest {
    /// Sensor centre
    pub const CENTER: PointOfInterest = PointOfInterest { x: 0.5, y: 0.5 };

    /// Create a point, clamping both coordinates into [0, 1]
    ///
    /// Non-finite coordinates fall back to the centre of the frame.
    pub fn new(x: f32, y: f32) -> Self {
        let clamp = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 };
        Self {
            x: clamp(x),
            y: clamp(y),
        }
    }

    /// Convert a point in a portrait preview view into device coordinates
    ///
    /// The preview fills the view and the sensor is rotated 90° relative to
    /// it, so the view's vertical axis maps to the device x axis.
    pub fn from_portrait_view(x: f32, y: f32, view_width: f32, view_height: f32) -> Self {
        if view_width <= 0.0 || view_height <= 0.0 {
            return Self::CENTER;
        }
        Self::new(y / view_height, 1.0 - x / view_width)
    }
}

impl Default for PointOfInterest {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Inclusive range a device reports for a float parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
}

impl ParameterRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Finite bounds with `min <= max`
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Clamp a finite value into the range
    ///
    /// Returns `None` for NaN or infinities, and for a range that is not
    /// valid; neither ever reaches the device.
    pub fn clamp(&self, value: f32) -> Option<f32> {
        if !value.is_finite() || !self.is_valid() {
            return None;
        }
        Some(value.clamp(self.min, self.max))
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Descriptive information about the capture device
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Human-readable name
    pub name: String,
    /// Backend-specific identifier
    pub id: String,
    /// Whether the device has a torch LED
    pub has_torch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exposure_lock_toggle() {
        assert_eq!(ExposureMode::Locked.toggled_lock(), ExposureMode::ContinuousAuto);
        assert_eq!(ExposureMode::ContinuousAuto.toggled_lock(), ExposureMode::Locked);
        assert_eq!(ExposureMode::Auto.toggled_lock(), ExposureMode::Locked);
    }

    #[test]
    fn test_point_of_interest_clamps() {
        let p = PointOfInterest::new(-0.5, 1.5);
        assert_eq!(p, PointOfInterest { x: 0.0, y: 1.0 });

        let p = PointOfInterest::new(f32::NAN, 0.25);
        assert_eq!(p, PointOfInterest { x: 0.5, y: 0.25 });
    }

    #[test]
    fn test_portrait_view_conversion() {
        // Top-left of a portrait view is the top-right of the landscape sensor
        let p = PointOfInterest::from_portrait_view(0.0, 0.0, 390.0, 844.0);
        assert_eq!(p, PointOfInterest { x: 0.0, y: 1.0 });

        let p = PointOfInterest::from_portrait_view(195.0, 422.0, 390.0, 844.0);
        assert_eq!(p, PointOfInterest::CENTER);

        let p = PointOfInterest::from_portrait_view(10.0, 10.0, 0.0, 844.0);
        assert_eq!(p, PointOfInterest::CENTER);
    }

    #[test]
    fn test_parameter_range_clamp() {
        let range = ParameterRange::new(-8.0, 8.0);
        assert_eq!(range.clamp(12.0), Some(8.0));
        assert_eq!(range.clamp(-9.5), Some(-8.0));
        assert_eq!(range.clamp(1.5), Some(1.5));
        assert_eq!(range.clamp(f32::NAN), None);
        assert_eq!(range.clamp(f32::INFINITY), None);
    }

    #[test]
    fn test_degenerate_range_never_clamps() {
        assert_eq!(ParameterRange::new(2.0, -2.0).clamp(0.0), None);
        assert_eq!(ParameterRange::new(f32::NAN, 1.0).clamp(0.5), None);
        assert_eq!(ParameterRange::new(0.0, f32::INFINITY).clamp(0.5), None);
        assert_eq!(ParameterRange::new(1.0, 1.0).clamp(3.0), Some(1.0));
    }
}
