// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Aggregate device facade handed to every behavior

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tankbot_config::SoundsConfig;
use tracing::{debug, error};

use crate::error::DeviceResult;
use crate::hal::{
    AccessoryMotor, ColorSensor, Completion, Indicators, InfraredSensor, Speaker, TankDrive,
    TouchSensor,
};
use crate::ir_mode::IrModeRegistry;

/// Named audio cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundClip {
    Up,
    Down,
    Object,
    Detected,
    ErrorAlarm,
}

impl fmt::Display for SoundClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SoundClip::Up => "Up",
            SoundClip::Down => "Down",
            SoundClip::Object => "Object",
            SoundClip::Detected => "Detected",
            SoundClip::ErrorAlarm => "Error alarm",
        };
        f.write_str(name)
    }
}

/// Clip to file mapping plus playback volume
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    up: PathBuf,
    down: PathBuf,
    object: PathBuf,
    detected: PathBuf,
    error_alarm: PathBuf,
    volume: u8,
}

impl SoundLibrary {
    pub fn from_config(config: &SoundsConfig) -> Self {
        Self {
            up: config.path_of(&config.up),
            down: config.path_of(&config.down),
            object: config.path_of(&config.object),
            detected: config.path_of(&config.detected),
            error_alarm: config.path_of(&config.error_alarm),
            volume: config.volume,
        }
    }

    pub fn path(&self, clip: SoundClip) -> &PathBuf {
        match clip {
            SoundClip::Up => &self.up,
            SoundClip::Down => &self.down,
            SoundClip::Object => &self.object,
            SoundClip::Detected => &self.detected,
            SoundClip::ErrorAlarm => &self.error_alarm,
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }
}

/// Every physical unit of the robot behind its trait
///
/// Cloning is cheap; all clones share the same device handles and IR mode
/// registry.
#[derive(Clone)]
pub struct Devices {
    pub drive: Arc<dyn TankDrive>,
    pub accessory: Arc<dyn AccessoryMotor>,
    pub touch: Arc<dyn TouchSensor>,
    pub color: Arc<dyn ColorSensor>,
    /// Sensor receiving the remote and beacon
    pub infrared: Arc<dyn InfraredSensor>,
    /// Sensor used for object proximity; may be the same unit as `infrared`
    pub proximity_infrared: Arc<dyn InfraredSensor>,
    pub speaker: Arc<dyn Speaker>,
    pub indicators: Arc<dyn Indicators>,
    pub sounds: SoundLibrary,
    pub ir_modes: Arc<IrModeRegistry>,
}

impl Devices {
    /// Play a named clip through the speaker
    pub fn play_sound(&self, clip: SoundClip, completion: Completion) -> DeviceResult<()> {
        debug!("Playing '{}' ({:?})", clip, completion);
        self.speaker
            .play_file(self.sounds.path(clip), self.sounds.volume(), completion)
    }

    /// Check that the actuators the program cannot run without are reachable
    ///
    /// # Errors
    /// The first `DeviceError::Unavailable` encountered.
    pub fn probe_required(&self) -> DeviceResult<()> {
        self.drive.probe().map_err(|e| {
            error!("Drive motors not reachable: {}", e);
            e
        })?;
        self.accessory.probe().map_err(|e| {
            error!("Accessory motor not reachable: {}", e);
            e
        })?;
        Ok(())
    }
}

impl fmt::Debug for Devices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Devices")
            .field("infrared_port", &self.infrared.port())
            .field("proximity_port", &self.proximity_infrared.port())
            .field("sounds", &self.sounds)
            .finish_non_exhaustive()
    }
}
