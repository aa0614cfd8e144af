// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for locks, behaviors and the scheduler

use tankbot_hal::DeviceError;

use crate::actuator_lock::ActuatorId;

/// Actuator lock errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// Requested actuators are held (or queued for) by someone else
    #[error("actuators busy: {0:?}")]
    Busy(Vec<ActuatorId>),

    /// The token was already released; lock state was not touched
    #[error("lock token already released")]
    AlreadyReleased,

    /// The token was not issued by this lock table
    #[error("lock token not issued by this lock table")]
    UnknownToken,

    #[error("no actuators requested")]
    NothingRequested,
}

/// Failure inside one behavior loop
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BehaviorError {
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// The behavior loop panicked; carries the panic message
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Scheduler errors
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Behavior set cannot run together (IR sensor needed in two modes)
    #[error("configuration error: {0}")]
    Configuration(#[source] DeviceError),

    #[error("failed to spawn behavior '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
