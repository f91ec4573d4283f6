// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for capture hardware
//!
//! The controller reaches the platform's media framework only through the
//! traits in [`camera`]. A platform port implements them over its native
//! session/device/output objects; [`camera::simulated`] implements them in
//! process for tests and the developer binary.
//!
//! # Modules
//!
//! - [`camera`]: Session, device and output traits, the configuration lock
//!   guard, and the simulated backend

pub mod camera;
