// SPDX-License-Identifier: GPL-3.0-only

//! Scoped device configuration lock
//!
//! A [`ConfigurationLock`] acquires the device's configuration lock when it is
//! created and releases it when dropped, so every exit path (early return,
//! `?`, panic) unlocks the device exactly once.

use super::CaptureDevice;
use crate::errors::DeviceResult;
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// Exclusive configuration access to a capture device
pub struct ConfigurationLock<'a> {
    device: &'a mut dyn CaptureDevice,
}

impl<'a> ConfigurationLock<'a> {
    /// Lock the device for configuration
    ///
    /// If the device refuses the lock nothing is held and nothing will be
    /// released.
    pub fn acquire(device: &'a mut dyn CaptureDevice) -> DeviceResult<Self> {
        device.lock_for_configuration()?;
        trace!("Device configuration lock acquired");
        Ok(Self { device })
    }
}

impl<'a> Deref for ConfigurationLock<'a> {
    type Target = dyn CaptureDevice + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.device
    }
}

impl<'a> DerefMut for ConfigurationLock<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.device
    }
}

impl Drop for ConfigurationLock<'_> {
    fn drop(&mut self) {
        self.device.unlock_for_configuration();
        trace!("Device configuration lock released");
    }
}

/// Run `configure` inside a lock bracket
pub fn with_configuration_lock<R>(
    device: &mut dyn CaptureDevice,
    configure: impl FnOnce(&mut dyn CaptureDevice) -> DeviceResult<R>,
) -> DeviceResult<R> {
    let mut lock = ConfigurationLock::acquire(device)?;
    configure(&mut *lock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::simulated::{Fault, SimulatedDevice};
    use crate::backends::camera::TorchMode;
    use crate::errors::DeviceError;

    #[test]
    fn test_lock_released_on_drop() {
        let mut device = SimulatedDevice::new();
        let stats = device.stats();
        {
            let mut lock = ConfigurationLock::acquire(&mut device).unwrap();
            lock.set_torch_mode(TorchMode::On).unwrap();
            assert!(stats.is_locked());
        }
        assert!(!stats.is_locked());
        assert_eq!(stats.lock_count(), 1);
        assert_eq!(stats.unlock_count(), 1);
    }

    #[test]
    fn test_refused_lock_is_not_released() {
        let mut device = SimulatedDevice::new();
        let stats = device.stats();
        device.inject_fault(Fault::RefuseLock);

        let result = ConfigurationLock::acquire(&mut device);
        assert!(matches!(result, Err(DeviceError::LockUnavailable(_))));
        assert_eq!(stats.lock_count(), 0);
        assert_eq!(stats.unlock_count(), 0);
    }

    #[test]
    fn test_lock_released_when_mutation_fails() {
        let mut device = SimulatedDevice::new();
        let stats = device.stats();
        device.inject_fault(Fault::FailMutation);

        let result = with_configuration_lock(&mut device, |d| d.set_torch_mode(TorchMode::On));
        assert!(result.is_err());
        assert_eq!(stats.lock_count(), 1);
        assert_eq!(stats.unlock_count(), 1);
        assert!(!stats.is_locked());
    }

    #[test]
    fn test_lock_released_on_panic() {
        let mut device = SimulatedDevice::new();
        let stats = device.stats();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _lock = ConfigurationLock::acquire(&mut device).unwrap();
            panic!("mutation blew up");
        }));
        assert!(result.is_err());
        assert_eq!(stats.unlock_count(), 1);
        assert!(!stats.is_locked());
    }
}
