// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Behavior lifecycle management
//!
//! Background behaviors each get a named thread; the foreground behavior
//! runs on the caller's thread. When the foreground returns, shutdown is
//! signalled and background threads get a bounded grace period to finish.
//! Threads still running after the grace period are detached and reported.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tankbot_config::SchedulerConfig;
use tankbot_hal::{Devices, IrMode};
use tracing::{error, info, warn};

use crate::actuator_lock::{ActuatorId, ActuatorLocks, LockStats};
use crate::behavior::{Behavior, BehaviorContext, BehaviorStatus, StatusBoard, StopReason};
use crate::error::{BehaviorError, SchedulerError};
use crate::shutdown::ShutdownSignal;

/// What happened during a scheduler run
#[derive(Debug)]
pub struct ShutdownReport {
    /// How the foreground behavior ended
    pub foreground: Result<StopReason, BehaviorError>,
    /// Background behaviors that finished within the grace period
    pub stopped: Vec<String>,
    /// Background behaviors that returned an error or panicked
    pub failed: Vec<String>,
    /// Background behaviors still running when the grace period ran out
    pub detached: Vec<String>,
    pub lock_stats: LockStats,
    /// Actuators still held at exit; empty after a clean shutdown
    pub held_at_exit: Vec<ActuatorId>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.foreground.is_ok()
            && self.failed.is_empty()
            && self.detached.is_empty()
            && self.held_at_exit.is_empty()
    }
}

pub struct BehaviorScheduler {
    ctx: BehaviorContext,
    background: Vec<Box<dyn Behavior>>,
    config: SchedulerConfig,
    statuses: StatusBoard,
}

impl BehaviorScheduler {
    pub fn new(devices: Devices, locks: Arc<ActuatorLocks>, config: &SchedulerConfig) -> Self {
        Self {
            ctx: BehaviorContext::new(devices, locks, ShutdownSignal::new()),
            background: Vec::new(),
            config: config.clone(),
            statuses: StatusBoard::default(),
        }
    }

    pub fn add_background(&mut self, behavior: Box<dyn Behavior>) {
        self.statuses.set(behavior.name(), BehaviorStatus::Idle);
        self.background.push(behavior);
    }

    /// Signal used to stop every behavior; triggering it ends `run`
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.ctx.shutdown.clone()
    }

    /// Live status of every behavior
    pub fn status_board(&self) -> StatusBoard {
        self.statuses.clone()
    }

    /// Claim IR modes for every behavior, refusing conflicting sets
    fn claim_ir_modes(&self, foreground: &dyn Behavior) -> Result<(), SchedulerError> {
        let mut behaviors: Vec<&dyn Behavior> = vec![foreground];
        for behavior in &self.background {
            behaviors.push(behavior.as_ref());
        }
        let devices = &self.ctx.devices;

        for behavior in behaviors {
            let Some(mode) = behavior.ir_mode() else {
                continue;
            };
            let port = match mode {
                IrMode::Remote => devices.infrared.port(),
                IrMode::Proximity => devices.proximity_infrared.port(),
            };
            if let Err(e) = devices.ir_modes.claim(port, mode, behavior.name()) {
                error!("[SCHEDULER] {}", e);
                devices.ir_modes.clear();
                return Err(SchedulerError::Configuration(e));
            }
        }
        Ok(())
    }

    /// Run every behavior until the foreground behavior returns
    ///
    /// # Errors
    /// - `SchedulerError::Configuration` if the behaviors need one IR sensor
    ///   in two modes; nothing is started
    /// - `SchedulerError::Spawn` if a thread could not be started; already
    ///   started behaviors are stopped first
    pub fn run(mut self, mut foreground: Box<dyn Behavior>) -> Result<ShutdownReport, SchedulerError> {
        self.claim_ir_modes(foreground.as_ref())?;
        self.statuses.set(foreground.name(), BehaviorStatus::Idle);

        let mut handles: Vec<(String, JoinHandle<()>)> = Vec::new();
        let background = std::mem::take(&mut self.background);
        for mut behavior in background {
            let name = behavior.name().to_string();
            let ctx = self.ctx.clone();
            let statuses = self.statuses.clone();

            self.statuses.set(&name, BehaviorStatus::Running);
            let spawned = thread::Builder::new()
                .name(format!("tankbot-{}", name))
                .spawn(move || {
                    let status = match behavior.run(&ctx) {
                        Ok(_) => BehaviorStatus::Stopped,
                        Err(e) => {
                            error!("[SCHEDULER] Behavior '{}' failed: {}", behavior.name(), e);
                            BehaviorStatus::Failed
                        }
                    };
                    statuses.set(behavior.name(), status);
                });

            match spawned {
                Ok(handle) => {
                    info!("[SCHEDULER] Started '{}'", name);
                    handles.push((name, handle));
                }
                Err(source) => {
                    error!("[SCHEDULER] Could not start '{}': {}", name, source);
                    self.statuses.set(&name, BehaviorStatus::Failed);
                    self.ctx.shutdown.trigger();
                    self.join_all(handles);
                    self.ctx.devices.ir_modes.clear();
                    return Err(SchedulerError::Spawn { name, source });
                }
            }
        }

        let fg_name = foreground.name().to_string();
        info!("[SCHEDULER] Running '{}' in the foreground", fg_name);
        self.statuses.set(&fg_name, BehaviorStatus::Running);
        // A panicking foreground must still stop the background behaviors
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| foreground.run(&self.ctx)))
            .unwrap_or_else(|payload| Err(BehaviorError::Panicked(panic_message(payload.as_ref()))));
        match &outcome {
            Ok(reason) => {
                info!("[SCHEDULER] '{}' finished: {}", fg_name, reason);
                self.statuses.set(&fg_name, BehaviorStatus::Stopped);
            }
            Err(e) => {
                error!("[SCHEDULER] '{}' failed: {}", fg_name, e);
                self.statuses.set(&fg_name, BehaviorStatus::Failed);
            }
        }

        self.ctx.shutdown.trigger();
        let (stopped, failed, detached) = self.join_all(handles);
        self.ctx.devices.ir_modes.clear();

        let report = ShutdownReport {
            foreground: outcome,
            stopped,
            failed,
            detached,
            lock_stats: self.ctx.locks.stats(),
            held_at_exit: self.ctx.locks.held(),
        };
        if !report.held_at_exit.is_empty() {
            warn!("[SCHEDULER] Actuators still held at exit: {:?}", report.held_at_exit);
        }
        Ok(report)
    }

    /// Join background threads within the shared grace period
    ///
    /// Returns (stopped, failed, detached) behavior names.
    fn join_all(
        &self,
        handles: Vec<(String, JoinHandle<()>)>,
    ) -> (Vec<String>, Vec<String>, Vec<String>) {
        let grace = self.config.shutdown_grace();
        let deadline = Instant::now() + grace;
        let total = handles.len();

        // JoinHandle has no timed join; a helper thread per behavior does the
        // join and reports back over the channel
        let (tx, rx) = mpsc::channel();
        let mut pending: Vec<String> = Vec::with_capacity(total);
        for (name, handle) in handles {
            let tx = tx.clone();
            let joiner_name = name.clone();
            pending.push(name);
            thread::spawn(move || {
                let panicked = handle.join().is_err();
                let _ = tx.send((joiner_name, panicked));
            });
        }
        drop(tx);

        let mut stopped = Vec::new();
        let mut failed = Vec::new();
        while !pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((name, panicked)) => {
                    pending.retain(|n| *n != name);
                    let status = if panicked {
                        warn!("[SCHEDULER] '{}' panicked during shutdown", name);
                        self.statuses.set(&name, BehaviorStatus::Failed);
                        BehaviorStatus::Failed
                    } else {
                        self.statuses.get(&name).unwrap_or(BehaviorStatus::Stopped)
                    };
                    if status == BehaviorStatus::Failed {
                        failed.push(name);
                    } else {
                        info!("[SCHEDULER] '{}' stopped cleanly", name);
                        stopped.push(name);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    warn!(
                        "[SCHEDULER] {:?} did not stop within {:?}, proceeding with shutdown",
                        pending, grace
                    );
                    break;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    warn!("[SCHEDULER] Join threads disconnected unexpectedly");
                    break;
                }
            }
        }

        (stopped, failed, pending)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
