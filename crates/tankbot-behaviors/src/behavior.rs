// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Behavior loop contract and shared context

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use parking_lot::Mutex;
use tankbot_hal::{Devices, IrMode};

use crate::actuator_lock::{AcquireMode, ActuatorId, ActuatorLocks, LockGuard};
use crate::error::{BehaviorError, LockError};
use crate::shutdown::ShutdownSignal;

/// Lifecycle state of one behavior loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorStatus {
    Idle,
    Running,
    Stopped,
    Failed,
}

/// Why a behavior loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stop gesture on the remote
    RemoteStop,
    /// No remote signal for longer than the configured timeout
    SignalTimeout,
    /// Program shutdown was requested
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::RemoteStop => f.write_str("remote stop command"),
            StopReason::SignalTimeout => f.write_str("remote signal timeout"),
            StopReason::Shutdown => f.write_str("shutdown requested"),
        }
    }
}

/// Everything a behavior may touch
#[derive(Debug, Clone)]
pub struct BehaviorContext {
    pub devices: Devices,
    pub locks: Arc<ActuatorLocks>,
    pub shutdown: ShutdownSignal,
}

impl BehaviorContext {
    pub fn new(devices: Devices, locks: Arc<ActuatorLocks>, shutdown: ShutdownSignal) -> Self {
        Self {
            devices,
            locks,
            shutdown,
        }
    }

    /// Wait for `actuators`, re-checking shutdown every `recheck`
    ///
    /// Returns `Ok(None)` if shutdown was requested before the grant.
    pub fn acquire_unless_shutdown(
        &self,
        actuators: &[ActuatorId],
        behavior: &str,
        recheck: Duration,
    ) -> Result<Option<LockGuard<'_>>, BehaviorError> {
        loop {
            if self.shutdown.is_triggered() {
                return Ok(None);
            }
            match self
                .locks
                .acquire(actuators, behavior, AcquireMode::Timeout(recheck))
            {
                Ok(guard) => return Ok(Some(guard)),
                Err(LockError::Busy(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// One concurrent control loop
///
/// `run` loops until the behavior decides to stop or shutdown is signalled,
/// checking the signal at the top of every iteration and after each
/// blocking call.
pub trait Behavior: Send {
    fn name(&self) -> &str;

    /// Actuators this behavior may request
    fn actuators(&self) -> &[ActuatorId];

    /// IR sensor mode this behavior needs, if any
    fn ir_mode(&self) -> Option<IrMode> {
        None
    }

    fn run(&mut self, ctx: &BehaviorContext) -> Result<StopReason, BehaviorError>;
}

/// Status of every registered behavior, shared with running threads
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<AHashMap<String, BehaviorStatus>>>,
}

impl StatusBoard {
    pub fn set(&self, name: &str, status: BehaviorStatus) {
        self.inner.lock().insert(name.to_string(), status);
    }

    pub fn get(&self, name: &str) -> Option<BehaviorStatus> {
        self.inner.lock().get(name).copied()
    }

    /// Snapshot sorted by name
    pub fn snapshot(&self) -> Vec<(String, BehaviorStatus)> {
        let mut all: Vec<_> = self
            .inner
            .lock()
            .iter()
            .map(|(name, status)| (name.clone(), *status))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}
