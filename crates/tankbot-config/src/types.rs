// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `tankbot.toml`. Every struct carries `#[serde(default)]` so a partial file
//! only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Seconds from a config value as a `Duration`
///
/// Negative and NaN values give zero, values too large for a `Duration`
/// saturate. Validation rejects both, so this only matters for configs
/// built in code.
pub fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TankConfig {
    pub ports: PortsConfig,
    pub remote: RemoteConfig,
    pub dance: DanceConfig,
    pub blast: BlastConfig,
    pub proximity_alert: ProximityAlertConfig,
    pub sounds: SoundsConfig,
    pub scheduler: SchedulerConfig,
    pub platform: PlatformConfig,
    pub logging: LoggingConfig,
}

/// Physical port identities of every device
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PortsConfig {
    pub left_drive: String,
    pub right_drive: String,
    pub accessory: String,
    pub touch: String,
    pub color: String,
    pub infrared: String,
    /// Sensor used by the proximity alert. Sharing the remote sensor's port is
    /// refused at scheduler start.
    pub proximity_infrared: String,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            left_drive: "outB".to_string(),
            right_drive: "outC".to_string(),
            accessory: "outA".to_string(),
            touch: "in1".to_string(),
            color: "in3".to_string(),
            infrared: "in4".to_string(),
            proximity_infrared: "in4".to_string(),
        }
    }
}

impl PortsConfig {
    /// Motor ports, for conflict detection
    pub fn motor_ports(&self) -> Vec<(&str, &str)> {
        vec![
            ("ports.left_drive", self.left_drive.as_str()),
            ("ports.right_drive", self.right_drive.as_str()),
            ("ports.accessory", self.accessory.as_str()),
        ]
    }

    /// Every configured port, for required-field checks
    pub fn all_ports(&self) -> Vec<(&str, &str)> {
        let mut ports = self.motor_ports();
        ports.extend([
            ("ports.touch", self.touch.as_str()),
            ("ports.color", self.color.as_str()),
            ("ports.infrared", self.infrared.as_str()),
            ("ports.proximity_infrared", self.proximity_infrared.as_str()),
        ]);
        ports
    }
}

/// Remote-beacon driving
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// IR beacon channel (1-4)
    pub channel: u8,
    /// Track speed at full remote input, in degrees per second
    pub top_speed_dps: f32,
    /// Seconds without any remote signal before the robot stops and exits (0 = never)
    pub signal_timeout_secs: f64,
    pub poll_interval_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            channel: 1,
            top_speed_dps: 1000.0,
            signal_timeout_secs: 60.0,
            poll_interval_ms: 10,
        }
    }
}

impl RemoteConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `None` when the timeout is disabled
    pub fn signal_timeout(&self) -> Option<Duration> {
        (self.signal_timeout_secs > 0.0).then(|| seconds(self.signal_timeout_secs))
    }
}

/// Random dance while the beacon button is held
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DanceConfig {
    /// Speeds are drawn uniformly from `[-max_speed_percent, max_speed_percent]`
    pub max_speed_percent: i32,
    pub step_secs: f64,
    pub poll_interval_ms: u64,
    /// Fixed RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for DanceConfig {
    fn default() -> Self {
        Self {
            max_speed_percent: 100,
            step_secs: 1.0,
            poll_interval_ms: 10,
            seed: None,
        }
    }
}

impl DanceConfig {
    pub fn step(&self) -> Duration {
        seconds(self.step_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Touch-triggered accessory motor action
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlastConfig {
    /// Ambient light (percent) below which the accessory retracts
    pub ambient_light_threshold: f32,
    pub rotations: f32,
    pub speed_percent: f32,
    pub poll_interval_ms: u64,
}

impl Default for BlastConfig {
    fn default() -> Self {
        Self {
            ambient_light_threshold: 5.0,
            rotations: 3.0,
            speed_percent: 100.0,
            poll_interval_ms: 10,
        }
    }
}

impl BlastConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Object detection with the IR sensor in proximity mode
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProximityAlertConfig {
    pub enabled: bool,
    pub threshold_percent: f32,
    pub lights_duration_secs: f64,
    pub lights_period_secs: f64,
    pub poll_interval_ms: u64,
}

impl Default for ProximityAlertConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_percent: 25.0,
            lights_duration_secs: 5.0,
            lights_period_secs: 0.5,
            poll_interval_ms: 10,
        }
    }
}

impl ProximityAlertConfig {
    pub fn lights_period(&self) -> Duration {
        seconds(self.lights_period_secs)
    }

    pub fn lights_duration(&self) -> Duration {
        seconds(self.lights_duration_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Sound clip file names, resolved against `directory`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SoundsConfig {
    pub directory: PathBuf,
    pub object: String,
    pub detected: String,
    pub error_alarm: String,
    pub up: String,
    pub down: String,
    /// Playback volume, percent
    pub volume: u8,
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/home/robot/sound"),
            object: "Object.wav".to_string(),
            detected: "Detected.wav".to_string(),
            error_alarm: "Error alarm.wav".to_string(),
            up: "Up.wav".to_string(),
            down: "Down.wav".to_string(),
            volume: 100,
        }
    }
}

impl SoundsConfig {
    /// Resolve a clip file name against the sound directory
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.directory.join(file_name)
    }
}

/// Behavior scheduler lifecycle
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How long background behaviors get to finish after shutdown is signalled
    pub shutdown_grace_ms: u64,
    /// Added to a blocking action's nominal duration before it counts as timed out
    pub device_timeout_slack_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_ms: 2000,
            device_timeout_slack_ms: 2000,
        }
    }
}

impl SchedulerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn device_timeout_slack(&self) -> Duration {
        Duration::from_millis(self.device_timeout_slack_ms)
    }
}

/// Device facade backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Simulated,
    Ev3dev,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simulated" | "sim" => Ok(Backend::Simulated),
            "ev3dev" => Ok(Backend::Ev3dev),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub backend: Backend,
    pub sysfs_root: PathBuf,
    /// Simulated backend only: multiplier applied to every blocking duration
    pub time_scale: f64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Simulated,
            sysfs_root: PathBuf::from("/sys/class"),
            time_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for crates without a debug flag (trace, debug, info, warn, error)
    pub level: String,
    pub file_logging: bool,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
        }
    }
}
