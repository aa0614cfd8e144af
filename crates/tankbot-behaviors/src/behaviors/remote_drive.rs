// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Remote-controlled tank driving
//!
//! Red buttons drive the left track, blue buttons the right track; up is
//! forward. Both red buttons together stop the program. Runs as the
//! foreground loop: when it returns, the program shuts down.

use std::time::{Duration, Instant};

use tankbot_config::RemoteConfig;
use tankbot_hal::{Braking, IrMode, RemoteButtons, RemoteSignal, Speed};
use tracing::{debug, error, info, trace, warn};

use crate::actuator_lock::{AcquireMode, ActuatorId};
use crate::behavior::{Behavior, BehaviorContext, StopReason};
use crate::error::{BehaviorError, LockError};

pub const NAME: &str = "remote-drive";

/// Position in the drive cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDriveState {
    Idle,
    ReadingBeacon,
    Driving,
    Terminated,
}

pub struct RemoteDrive {
    channel: u8,
    top_speed_dps: f32,
    poll_interval: Duration,
    signal_timeout: Option<Duration>,
    /// How long termination may wait for the drive pair
    stop_wait: Duration,
    state: RemoteDriveState,
    /// Last command left the tracks turning
    moving: bool,
}

impl RemoteDrive {
    pub fn new(config: &RemoteConfig, stop_wait: Duration) -> Self {
        Self {
            channel: config.channel,
            top_speed_dps: config.top_speed_dps,
            poll_interval: config.poll_interval(),
            signal_timeout: config.signal_timeout(),
            stop_wait,
            state: RemoteDriveState::Idle,
            moving: false,
        }
    }

    pub fn state(&self) -> RemoteDriveState {
        self.state
    }

    fn transition(&mut self, next: RemoteDriveState) {
        if self.state != next {
            trace!("[REMOTE-DRIVE] {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Track speeds for the held buttons
    pub fn track_speeds(buttons: &RemoteButtons, top_speed_dps: f32) -> (Speed, Speed) {
        let axis = |up: bool, down: bool| f32::from(i8::from(up) - i8::from(down));
        (
            Speed::DegreesPerSecond(axis(buttons.red_up, buttons.red_down) * top_speed_dps),
            Speed::DegreesPerSecond(axis(buttons.blue_up, buttons.blue_down) * top_speed_dps),
        )
    }

    /// Issue `left`/`right` if the drive pair is free this tick
    fn drive(&mut self, ctx: &BehaviorContext, left: Speed, right: Speed) {
        let guard = match ctx
            .locks
            .acquire(&ActuatorId::DRIVE_PAIR, NAME, AcquireMode::NonBlocking)
        {
            Ok(guard) => guard,
            Err(LockError::Busy(_)) => {
                trace!("[REMOTE-DRIVE] Drive pair busy, skipping tick");
                return;
            }
            Err(e) => {
                warn!("[REMOTE-DRIVE] Lock error: {}", e);
                return;
            }
        };

        guard.record(format!("run({:?}, {:?})", left, right));
        let commanded = !(left.is_zero() && right.is_zero());
        match ctx.devices.drive.run(left, right) {
            Ok(()) => self.moving = commanded,
            Err(e) => {
                // One track may have started before the failure
                self.moving |= commanded;
                warn!("[REMOTE-DRIVE] Drive command failed: {}", e);
            }
        }
    }

    /// Coast to a stop after the buttons are let go
    fn coast(&mut self, ctx: &BehaviorContext) {
        let Ok(guard) = ctx
            .locks
            .acquire(&ActuatorId::DRIVE_PAIR, NAME, AcquireMode::NonBlocking)
        else {
            return;
        };
        guard.record("stop(coast)");
        match ctx.devices.drive.stop(Braking::Coast) {
            Ok(()) => self.moving = false,
            Err(e) => warn!("[REMOTE-DRIVE] Stop failed: {}", e),
        }
    }

    /// Brake both tracks before handing control back
    fn stop_tracks(&mut self, ctx: &BehaviorContext) -> Result<(), BehaviorError> {
        // Background motion must end before the tracks can be claimed
        ctx.shutdown.trigger();

        let guard = ctx
            .locks
            .acquire(&ActuatorId::DRIVE_PAIR, NAME, AcquireMode::Timeout(self.stop_wait))
            .map_err(|e| {
                error!(
                    "[REMOTE-DRIVE] Drive pair not released within {:?}: {}",
                    self.stop_wait, e
                );
                e
            })?;
        guard.record("stop(brake)");
        ctx.devices.drive.stop(Braking::Brake)?;
        self.moving = false;
        Ok(())
    }

    fn poll(&mut self, ctx: &BehaviorContext) -> StopReason {
        let top_speed = self.top_speed_dps.min(ctx.devices.drive.max_speed_dps());
        let mut last_signal = Instant::now();
        let mut read_failures: u64 = 0;

        loop {
            if ctx.shutdown.is_triggered() {
                return StopReason::Shutdown;
            }

            self.transition(RemoteDriveState::ReadingBeacon);
            let signal = match ctx.devices.infrared.remote(self.channel) {
                Ok(signal) => {
                    read_failures = 0;
                    signal
                }
                Err(e) => {
                    read_failures += 1;
                    if read_failures == 1 {
                        warn!("[REMOTE-DRIVE] Remote read failed, treating as no signal: {}", e);
                    }
                    RemoteSignal::None
                }
            };

            match signal {
                RemoteSignal::None => {
                    if self.moving {
                        self.coast(ctx);
                    }
                    if let Some(timeout) = self.signal_timeout {
                        if last_signal.elapsed() > timeout {
                            warn!(
                                "[REMOTE-DRIVE] No remote signal for {:?}, stopping",
                                timeout
                            );
                            return StopReason::SignalTimeout;
                        }
                    }
                }
                RemoteSignal::Beacon => {
                    last_signal = Instant::now();
                }
                RemoteSignal::Buttons(buttons) => {
                    last_signal = Instant::now();
                    if buttons.is_stop_combo() {
                        info!("[REMOTE-DRIVE] Stop command received");
                        return StopReason::RemoteStop;
                    }
                    self.transition(RemoteDriveState::Driving);
                    let (left, right) = Self::track_speeds(&buttons, top_speed);
                    self.drive(ctx, left, right);
                }
            }

            if ctx.shutdown.sleep(self.poll_interval) {
                return StopReason::Shutdown;
            }
        }
    }
}

impl Behavior for RemoteDrive {
    fn name(&self) -> &str {
        NAME
    }

    fn actuators(&self) -> &[ActuatorId] {
        &ActuatorId::DRIVE_PAIR
    }

    fn ir_mode(&self) -> Option<IrMode> {
        Some(IrMode::Remote)
    }

    fn run(&mut self, ctx: &BehaviorContext) -> Result<StopReason, BehaviorError> {
        info!(
            "[REMOTE-DRIVE] Listening on channel {} (top speed {} deg/s)",
            self.channel, self.top_speed_dps
        );

        let reason = self.poll(ctx);
        debug!("[REMOTE-DRIVE] Terminating: {}", reason);

        let stopped = self.stop_tracks(ctx);
        self.transition(RemoteDriveState::Terminated);
        stopped?;

        info!("[REMOTE-DRIVE] Tracks stopped ({})", reason);
        Ok(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_mapping() {
        let top = 1000.0;
        let (l, r) = RemoteDrive::track_speeds(&RemoteButtons::new(true, false, false, true), top);
        assert_eq!(l, Speed::DegreesPerSecond(1000.0));
        assert_eq!(r, Speed::DegreesPerSecond(-1000.0));

        let (l, r) = RemoteDrive::track_speeds(&RemoteButtons::new(false, false, true, false), top);
        assert_eq!(l, Speed::DegreesPerSecond(0.0));
        assert_eq!(r, Speed::DegreesPerSecond(1000.0));

        let (l, r) = RemoteDrive::track_speeds(&RemoteButtons::new(false, true, false, true), top);
        assert_eq!(l, Speed::DegreesPerSecond(-1000.0));
        assert_eq!(r, Speed::DegreesPerSecond(-1000.0));
    }
}
