// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// ev3dev sysfs backend for the real brick.
#[cfg(feature = "ev3dev")]
pub mod ev3dev;
/// In-memory robot used for dry runs and tests.
pub mod simulated;

pub use simulated::{FaultKind, SimCall, SimEvent, SimulatedRobot};

use tankbot_config::{Backend, TankConfig};
use tracing::info;

use crate::devices::Devices;
use crate::error::DeviceResult;
#[cfg(not(feature = "ev3dev"))]
use crate::error::{DeviceError, DeviceKind};

/// Build the device facade for the configured backend
///
/// # Errors
/// `DeviceError::Unavailable` if the backend cannot open its devices or was
/// not compiled in.
pub fn build_devices(config: &TankConfig) -> DeviceResult<Devices> {
    match config.platform.backend {
        Backend::Simulated => {
            info!("Using simulated robot backend");
            Ok(SimulatedRobot::new(config).devices(config))
        }
        #[cfg(feature = "ev3dev")]
        Backend::Ev3dev => ev3dev::open(config),
        #[cfg(not(feature = "ev3dev"))]
        Backend::Ev3dev => Err(DeviceError::unavailable(
            DeviceKind::TankDrive,
            "ev3dev backend not compiled in (enable the `ev3dev` feature)",
        )),
    }
}
