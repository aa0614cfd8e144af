// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # tankbot behaviors
//!
//! Concurrent control loops for the tracked robot and the machinery that
//! keeps them from trampling each other:
//! - `actuator_lock` - per-actuator exclusive ownership with FIFO waiters
//! - `behaviors` - Remote-Drive, Beacon-Dance, Touch-Blast, Proximity-Alert
//! - `scheduler` - thread lifecycle, IR mode checks, bounded shutdown
//!
//! ## Usage
//! ```no_run
//! use std::sync::Arc;
//! use tankbot_behaviors::{ActuatorLocks, BehaviorScheduler, RemoteDrive, TouchBlast};
//! use tankbot_config::TankConfig;
//!
//! let config = TankConfig::default();
//! let devices = tankbot_hal::build_devices(&config).unwrap();
//! let mut scheduler =
//!     BehaviorScheduler::new(devices, Arc::new(ActuatorLocks::new()), &config.scheduler);
//! scheduler.add_background(Box::new(TouchBlast::new(&config.blast)));
//! let foreground = RemoteDrive::new(&config.remote, config.scheduler.shutdown_grace());
//! let report = scheduler.run(Box::new(foreground)).unwrap();
//! assert!(report.held_at_exit.is_empty());
//! ```

pub mod actuator_lock;
pub mod behavior;
pub mod behaviors;
pub mod error;
pub mod scheduler;
pub mod shutdown;

pub use actuator_lock::{AcquireMode, ActuatorId, ActuatorLocks, LockGuard, LockStats, LockToken};
pub use behavior::{Behavior, BehaviorContext, BehaviorStatus, StatusBoard, StopReason};
pub use behaviors::{BeaconDance, BlastOutcome, ProximityAlert, RemoteDrive, RemoteDriveState, TouchBlast};
pub use error::{BehaviorError, LockError, SchedulerError};
pub use scheduler::{BehaviorScheduler, ShutdownReport};
pub use shutdown::ShutdownSignal;

use tankbot_config::TankConfig;

/// Background behaviors enabled by `config`, in start order
pub fn background_behaviors(config: &TankConfig) -> Vec<Box<dyn Behavior>> {
    let mut behaviors: Vec<Box<dyn Behavior>> = vec![
        Box::new(TouchBlast::new(&config.blast)),
        Box::new(BeaconDance::from_config(&config.dance, config.remote.channel)),
    ];
    if config.proximity_alert.enabled {
        behaviors.push(Box::new(ProximityAlert::new(&config.proximity_alert)));
    }
    behaviors
}

/// The foreground loop
pub fn foreground_behavior(config: &TankConfig) -> Box<dyn Behavior> {
    Box::new(RemoteDrive::new(
        &config.remote,
        config.scheduler.shutdown_grace(),
    ))
}
