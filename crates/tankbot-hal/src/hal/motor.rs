// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use crate::error::{DeviceError, DeviceKind, DeviceResult};

/// Motor speed in either relative or absolute units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Speed {
    /// Percentage of the motor's maximum speed, -100..=100
    Percent(f32),
    /// Absolute tacho speed
    DegreesPerSecond(f32),
}

impl Speed {
    pub const STOPPED: Speed = Speed::Percent(0.0);

    /// Convert to degrees per second for a motor whose top speed is `max_dps`
    ///
    /// # Errors
    /// `InvalidArgument` when the speed exceeds the motor's range.
    pub fn to_dps(self, max_dps: f32, device: DeviceKind) -> DeviceResult<f32> {
        match self {
            Speed::Percent(p) if (-100.0..=100.0).contains(&p) => Ok(p / 100.0 * max_dps),
            Speed::Percent(p) => Err(DeviceError::invalid(
                device,
                format!("speed {}% outside -100..=100", p),
            )),
            Speed::DegreesPerSecond(d) if d.abs() <= max_dps => Ok(d),
            Speed::DegreesPerSecond(d) => Err(DeviceError::invalid(
                device,
                format!("speed {} deg/s exceeds motor maximum {}", d, max_dps),
            )),
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Speed::Percent(v) | Speed::DegreesPerSecond(v) => v == 0.0,
        }
    }
}

/// What a motor does once commanded to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Braking {
    /// Actively resist motion
    Brake,
    /// Let the motor spin down freely
    Coast,
}

/// Whether an actuation call returns before the action finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Suspend the caller until the motion or audio is over
    Wait,
    /// Fire and forget
    NoWait,
}

/// The left/right drive pair of the tank
pub trait TankDrive: Send + Sync {
    /// Run both tracks until the next command (always non-blocking)
    fn run(&self, left: Speed, right: Speed) -> DeviceResult<()>;

    /// Run both tracks for `duration`, then stop with `braking`
    ///
    /// With `Completion::Wait` this returns once both tracks stopped, or
    /// `DeviceError::Timeout` if they had not stopped by the expected bound.
    fn run_for(
        &self,
        left: Speed,
        right: Speed,
        duration: Duration,
        braking: Braking,
        completion: Completion,
    ) -> DeviceResult<()>;

    /// Stop both tracks
    fn stop(&self, braking: Braking) -> DeviceResult<()>;

    /// Top tacho speed of the drive motors
    fn max_speed_dps(&self) -> f32;

    /// Check that both motors are connected
    fn probe(&self) -> DeviceResult<()>;
}

/// The single accessory (launcher) motor
pub trait AccessoryMotor: Send + Sync {
    /// Turn by `rotations` (negative = reverse) at `speed`, then stop with `braking`
    fn run_for_rotations(
        &self,
        speed: Speed,
        rotations: f32,
        braking: Braking,
        completion: Completion,
    ) -> DeviceResult<()>;

    fn stop(&self, braking: Braking) -> DeviceResult<()>;

    fn max_speed_dps(&self) -> f32;

    fn probe(&self) -> DeviceResult<()>;
}

/// Nominal time a rotation move takes, used to bound blocking waits
pub fn rotation_duration(rotations: f32, speed_dps: f32) -> Duration {
    if speed_dps == 0.0 {
        return Duration::ZERO;
    }
    let secs = (rotations.abs() * 360.0) / speed_dps.abs();
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
}
