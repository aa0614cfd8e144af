// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Process exit status

use std::fmt;

use tankbot_behaviors::{SchedulerError, ShutdownReport};
use tankbot_config::ConfigError;
use tankbot_hal::DeviceError;

/// Exit status of the `tankbot` binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Remote stop, signal timeout or Ctrl-C
    Clean,
    /// A required actuator was missing at startup
    DeviceUnavailable,
    /// Invalid configuration file or IR mode conflict
    Configuration,
    /// The foreground behavior ended with an error
    ForegroundFailure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::DeviceUnavailable => 1,
            ExitStatus::Configuration => 2,
            ExitStatus::ForegroundFailure => 3,
        }
    }

    pub fn from_config_error(_err: &ConfigError) -> Self {
        ExitStatus::Configuration
    }

    /// Status for a device error raised while bringing the robot up
    pub fn from_startup_error(err: &DeviceError) -> Self {
        match err {
            DeviceError::Unavailable { .. } | DeviceError::Timeout { .. } => {
                ExitStatus::DeviceUnavailable
            }
            DeviceError::ModeConflict { .. } | DeviceError::InvalidArgument { .. } => {
                ExitStatus::Configuration
            }
        }
    }

    pub fn from_scheduler_error(err: &SchedulerError) -> Self {
        match err {
            SchedulerError::Configuration(_) => ExitStatus::Configuration,
            SchedulerError::Spawn { .. } => ExitStatus::ForegroundFailure,
        }
    }

    /// Only the foreground outcome decides; background trouble is logged
    pub fn from_report(report: &ShutdownReport) -> Self {
        match report.foreground {
            Ok(_) => ExitStatus::Clean,
            Err(_) => ExitStatus::ForegroundFailure,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExitStatus::Clean => "clean",
            ExitStatus::DeviceUnavailable => "device unavailable",
            ExitStatus::Configuration => "configuration error",
            ExitStatus::ForegroundFailure => "foreground failure",
        };
        write!(f, "{} ({})", text, self.code())
    }
}
