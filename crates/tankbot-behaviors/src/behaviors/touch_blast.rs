// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Touch-triggered accessory motor action
//!
//! On a press the ambient light picks the direction: in the dark the
//! accessory retracts with the "Up" cue, otherwise it extends with "Down".
//! The loop then waits for the sensor to be let go before polling again.

use std::time::Duration;

use tankbot_config::BlastConfig;
use tankbot_hal::{Braking, Completion, SoundClip, Speed};
use tracing::{debug, info, warn};

use crate::actuator_lock::ActuatorId;
use crate::behavior::{Behavior, BehaviorContext, StopReason};
use crate::error::BehaviorError;

pub const NAME: &str = "touch-blast";

const ACTUATORS: [ActuatorId; 1] = [ActuatorId::Accessory];

/// Result of one press
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlastOutcome {
    /// Accessory turned by this many rotations
    Fired { clip: SoundClip, rotations: f32 },
    /// Shutdown arrived before the accessory was free
    Cancelled,
}

pub struct TouchBlast {
    light_threshold: f32,
    rotations: f32,
    speed_percent: f32,
    poll_interval: Duration,
    /// Consecutive failed touch reads while idle
    read_failures: u64,
}

impl TouchBlast {
    pub fn new(config: &BlastConfig) -> Self {
        Self {
            light_threshold: config.ambient_light_threshold,
            rotations: config.rotations,
            speed_percent: config.speed_percent,
            poll_interval: config.poll_interval(),
            read_failures: 0,
        }
    }

    /// Cue and signed rotation count for an ambient light reading
    pub fn direction_for(&self, ambient_light: f32) -> (SoundClip, f32) {
        if ambient_light < self.light_threshold {
            (SoundClip::Up, -self.rotations)
        } else {
            (SoundClip::Down, self.rotations)
        }
    }

    /// Sound, rotate, then hold the accessory until the touch is released
    pub fn blast(&self, ctx: &BehaviorContext) -> Result<BlastOutcome, BehaviorError> {
        let Some(guard) = ctx.acquire_unless_shutdown(&ACTUATORS, NAME, self.poll_interval)? else {
            return Ok(BlastOutcome::Cancelled);
        };

        let light = match ctx.devices.color.ambient_light_intensity() {
            Ok(light) => light,
            Err(e) => {
                // No reading, no direction; blank the LEDs so the failure shows
                if let Err(clear_err) = ctx.devices.indicators.clear() {
                    debug!("[TOUCH-BLAST] Could not clear indicators: {}", clear_err);
                }
                return Err(e.into());
            }
        };

        let (clip, rotations) = self.direction_for(light);
        info!(
            "[TOUCH-BLAST] Ambient light {:.0}%, playing '{}' and turning {} rotations",
            light, clip, rotations
        );

        ctx.devices.play_sound(clip, Completion::Wait)?;

        guard.record(format!("run_for_rotations({}%, {}, brake)", self.speed_percent, rotations));
        ctx.devices.accessory.run_for_rotations(
            Speed::Percent(self.speed_percent),
            rotations,
            Braking::Brake,
            Completion::Wait,
        )?;

        self.wait_for_release(ctx);
        drop(guard);
        Ok(BlastOutcome::Fired { clip, rotations })
    }

    /// Poll until the touch sensor reports released, or shutdown
    fn wait_for_release(&self, ctx: &BehaviorContext) {
        loop {
            match ctx.devices.touch.is_pressed() {
                Ok(true) => {}
                Ok(false) => return,
                Err(e) => {
                    warn!("[TOUCH-BLAST] Touch read failed, treating as released: {}", e);
                    return;
                }
            }
            if ctx.shutdown.sleep(self.poll_interval) {
                return;
            }
        }
    }

    fn pressed(&mut self, ctx: &BehaviorContext) -> bool {
        match ctx.devices.touch.is_pressed() {
            Ok(pressed) => {
                self.read_failures = 0;
                pressed
            }
            Err(e) => {
                self.read_failures += 1;
                if self.read_failures == 1 {
                    warn!("[TOUCH-BLAST] Touch read failed, treating as not pressed: {}", e);
                }
                false
            }
        }
    }
}

impl Behavior for TouchBlast {
    fn name(&self) -> &str {
        NAME
    }

    fn actuators(&self) -> &[ActuatorId] {
        &ACTUATORS
    }

    fn run(&mut self, ctx: &BehaviorContext) -> Result<StopReason, BehaviorError> {
        info!(
            "[TOUCH-BLAST] Armed (dark below {}% ambient light)",
            self.light_threshold
        );

        loop {
            if ctx.shutdown.is_triggered() {
                break;
            }

            if self.pressed(ctx) {
                match self.blast(ctx) {
                    Ok(BlastOutcome::Fired { .. }) => {}
                    Ok(BlastOutcome::Cancelled) => break,
                    Err(e) => {
                        warn!("[TOUCH-BLAST] Action aborted: {}", e);
                        // Same press must not fire twice
                        self.wait_for_release(ctx);
                    }
                }
            }

            if ctx.shutdown.sleep(self.poll_interval) {
                break;
            }
        }

        debug!("[TOUCH-BLAST] Stopped");
        Ok(StopReason::Shutdown)
    }
}
