// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # tankbot HAL
//!
//! Device facade for the tracked robot: two drive motors, one accessory
//! motor, touch, color and infrared sensors, speaker and brick LEDs.
//!
//! ## Architecture
//! - `hal/` - device traits (platform-agnostic)
//! - `platforms/` - backends (simulated, ev3dev)
//! - `devices` - the aggregate handed to behaviors
//! - `ir_mode` - exclusive-mode claims on IR sensors
//!
//! ## Usage
//! ```no_run
//! use tankbot_config::TankConfig;
//! use tankbot_hal::{build_devices, Completion, SoundClip};
//!
//! let config = TankConfig::default();
//! let devices = build_devices(&config).unwrap();
//! devices.probe_required().unwrap();
//! devices.play_sound(SoundClip::Up, Completion::Wait).unwrap();
//! ```

pub mod devices;
pub mod error;
pub mod hal;
pub mod ir_mode;
pub mod platforms;

pub use devices::{Devices, SoundClip, SoundLibrary};
pub use error::{DeviceError, DeviceKind, DeviceResult};
pub use hal::*;
pub use ir_mode::IrModeRegistry;
pub use platforms::build_devices;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
