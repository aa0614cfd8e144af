// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::error::{DeviceError, DeviceKind, DeviceResult};

/// Operating mode of the infrared sensor
///
/// The sensor cannot decode the remote and measure proximity at the same
/// time; switching modes under a running reader yields garbage readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrMode {
    /// Remote buttons and beacon, per channel
    Remote,
    /// Distance to the nearest object, percent
    Proximity,
}

impl fmt::Display for IrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrMode::Remote => f.write_str("remote"),
            IrMode::Proximity => f.write_str("proximity"),
        }
    }
}

/// Buttons held on the remote for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteButtons {
    pub red_up: bool,
    pub red_down: bool,
    pub blue_up: bool,
    pub blue_down: bool,
}

impl RemoteButtons {
    pub const fn new(red_up: bool, red_down: bool, blue_up: bool, blue_down: bool) -> Self {
        Self {
            red_up,
            red_down,
            blue_up,
            blue_down,
        }
    }

    /// Both red buttons together, the remote's stop gesture
    pub fn is_stop_combo(&self) -> bool {
        self.red_up && self.red_down
    }
}

/// What the remote is sending on one channel at this instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteSignal {
    /// Nothing received (no button held, or remote out of range)
    #[default]
    None,
    /// Beacon mode toggled on at the remote
    Beacon,
    Buttons(RemoteButtons),
}

impl RemoteSignal {
    /// Decode an EV3 IR-REMOTE button code (0-11)
    pub fn from_code(code: i32) -> DeviceResult<Self> {
        let buttons = |red_up, red_down, blue_up, blue_down| {
            Ok(RemoteSignal::Buttons(RemoteButtons::new(red_up, red_down, blue_up, blue_down)))
        };
        match code {
            0 => Ok(RemoteSignal::None),
            1 => buttons(true, false, false, false),
            2 => buttons(false, true, false, false),
            3 => buttons(false, false, true, false),
            4 => buttons(false, false, false, true),
            5 => buttons(true, false, true, false),
            6 => buttons(true, false, false, true),
            7 => buttons(false, true, true, false),
            8 => buttons(false, true, false, true),
            9 => Ok(RemoteSignal::Beacon),
            10 => buttons(true, true, false, false),
            11 => buttons(false, false, true, true),
            other => Err(DeviceError::invalid(
                DeviceKind::Infrared,
                format!("unknown remote button code {}", other),
            )),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RemoteSignal::None)
    }
}

pub trait TouchSensor: Send + Sync {
    fn is_pressed(&self) -> DeviceResult<bool>;
}

pub trait ColorSensor: Send + Sync {
    /// Ambient light intensity, percent
    fn ambient_light_intensity(&self) -> DeviceResult<f32>;
}

pub trait InfraredSensor: Send + Sync {
    /// Port the sensor is plugged into, the key for mode claims
    fn port(&self) -> &str;

    /// Distance to the nearest object, percent (0 = touching, 100 = far)
    fn proximity(&self) -> DeviceResult<f32>;

    /// Remote state on `channel` (1-4)
    fn remote(&self, channel: u8) -> DeviceResult<RemoteSignal>;

    /// Whether the beacon is on for `channel`
    fn beacon(&self, channel: u8) -> DeviceResult<bool> {
        Ok(self.remote(channel)? == RemoteSignal::Beacon)
    }
}

/// Reject channels the remote cannot send on
pub fn check_channel(channel: u8) -> DeviceResult<()> {
    if (1..=4).contains(&channel) {
        Ok(())
    } else {
        Err(DeviceError::invalid(
            DeviceKind::Infrared,
            format!("channel {} outside 1..=4", channel),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_codes() {
        assert_eq!(RemoteSignal::from_code(0).unwrap(), RemoteSignal::None);
        assert_eq!(RemoteSignal::from_code(9).unwrap(), RemoteSignal::Beacon);
        assert_eq!(
            RemoteSignal::from_code(6).unwrap(),
            RemoteSignal::Buttons(RemoteButtons::new(true, false, false, true))
        );
        assert!(RemoteSignal::from_code(12).is_err());
    }

    #[test]
    fn test_stop_combo() {
        let RemoteSignal::Buttons(both_red) = RemoteSignal::from_code(10).unwrap() else {
            panic!("code 10 is a button pair");
        };
        assert!(both_red.is_stop_combo());

        let RemoteSignal::Buttons(both_blue) = RemoteSignal::from_code(11).unwrap() else {
            panic!("code 11 is a button pair");
        };
        assert!(!both_blue.is_stop_combo());
    }

    #[test]
    fn test_channel_range() {
        assert!(check_channel(1).is_ok());
        assert!(check_channel(4).is_ok());
        assert!(check_channel(0).is_err());
        assert!(check_channel(5).is_err());
    }
}
