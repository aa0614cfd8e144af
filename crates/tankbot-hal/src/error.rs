// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the device facade

use std::fmt;
use std::time::Duration;

use crate::hal::IrMode;

/// Result type alias using DeviceError
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// Which physical unit a call was addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    TankDrive,
    Accessory,
    Touch,
    Color,
    Infrared,
    Speaker,
    Indicators,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::TankDrive => "tank drive",
            DeviceKind::Accessory => "accessory motor",
            DeviceKind::Touch => "touch sensor",
            DeviceKind::Color => "color sensor",
            DeviceKind::Infrared => "infrared sensor",
            DeviceKind::Speaker => "speaker",
            DeviceKind::Indicators => "indicator lights",
        };
        f.write_str(name)
    }
}

/// Device facade errors
///
/// Every facade call reports failures through this type; nothing is
/// swallowed inside a backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    /// Hardware absent or disconnected
    #[error("{device} unavailable: {reason}")]
    Unavailable { device: DeviceKind, reason: String },

    /// A blocking action did not complete within its expected bound
    #[error("{device} did not complete within {waited:?}")]
    Timeout { device: DeviceKind, waited: Duration },

    /// The IR sensor is already claimed in the other mode
    #[error("IR sensor on {port} is claimed in {current} mode by {holder}; {requester} wants {requested} mode")]
    ModeConflict {
        port: String,
        current: IrMode,
        holder: String,
        requested: IrMode,
        requester: String,
    },

    /// Speed, channel or other argument outside the device's range
    #[error("invalid argument for {device}: {reason}")]
    InvalidArgument { device: DeviceKind, reason: String },
}

impl DeviceError {
    pub fn unavailable(device: DeviceKind, reason: impl Into<String>) -> Self {
        DeviceError::Unavailable {
            device,
            reason: reason.into(),
        }
    }

    pub fn invalid(device: DeviceKind, reason: impl Into<String>) -> Self {
        DeviceError::InvalidArgument {
            device,
            reason: reason.into(),
        }
    }

    /// Device the error concerns, if it concerns a single one
    pub fn device(&self) -> Option<DeviceKind> {
        match self {
            DeviceError::Unavailable { device, .. }
            | DeviceError::Timeout { device, .. }
            | DeviceError::InvalidArgument { device, .. } => Some(*device),
            DeviceError::ModeConflict { .. } => Some(DeviceKind::Infrared),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DeviceError::Timeout { .. })
    }
}
