// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Robot bring-up and the single scheduler run

use std::sync::Arc;

use tankbot_behaviors::{
    background_behaviors, foreground_behavior, ActuatorLocks, BehaviorScheduler, ShutdownSignal,
};
use tankbot_config::TankConfig;
use tankbot_hal::{build_devices, Devices};
use tracing::{error, info, warn};

use crate::exit::ExitStatus;

/// A robot with its devices probed and behaviors registered
pub struct Robot {
    config: TankConfig,
    scheduler: BehaviorScheduler,
}

impl Robot {
    /// Open the configured backend and register every enabled behavior
    pub fn start(config: &TankConfig) -> Result<Self, ExitStatus> {
        let devices = build_devices(config).map_err(|e| {
            error!("[APP] Could not open devices: {}", e);
            ExitStatus::from_startup_error(&e)
        })?;
        Self::with_devices(devices, config)
    }

    /// Same as [`Robot::start`] over already opened devices
    pub fn with_devices(devices: Devices, config: &TankConfig) -> Result<Self, ExitStatus> {
        devices.probe_required().map_err(|e| {
            error!("[APP] Required actuator missing: {}", e);
            ExitStatus::from_startup_error(&e)
        })?;

        let mut scheduler =
            BehaviorScheduler::new(devices, Arc::new(ActuatorLocks::new()), &config.scheduler);
        for behavior in background_behaviors(config) {
            scheduler.add_background(behavior);
        }
        Ok(Self {
            config: config.clone(),
            scheduler,
        })
    }

    /// Triggering this ends the run as if the operator had stopped it
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.scheduler.shutdown_handle()
    }

    /// Block until the foreground behavior ends and everything has stopped
    pub fn run(self) -> ExitStatus {
        let report = match self.scheduler.run(foreground_behavior(&self.config)) {
            Ok(report) => report,
            Err(e) => {
                error!("[APP] {}", e);
                return ExitStatus::from_scheduler_error(&e);
            }
        };

        if !report.failed.is_empty() {
            warn!("[APP] Failed behaviors: {}", report.failed.join(", "));
        }
        if !report.detached.is_empty() {
            warn!("[APP] Behaviors still running at exit: {}", report.detached.join(", "));
        }
        info!(
            "[APP] Locks: {} acquired, {} released, {} busy",
            report.lock_stats.acquired, report.lock_stats.released, report.lock_stats.busy
        );

        let status = ExitStatus::from_report(&report);
        info!("[APP] Exit: {}", status);
        status
    }
}
