// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Random dance while the remote's beacon is on

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tankbot_config::DanceConfig;
use tankbot_hal::{Braking, Completion, IrMode, Speed};
use tracing::{debug, info, warn};

use crate::actuator_lock::ActuatorId;
use crate::behavior::{Behavior, BehaviorContext, StopReason};
use crate::error::BehaviorError;

pub const NAME: &str = "beacon-dance";

pub struct BeaconDance {
    channel: u8,
    max_speed_percent: i32,
    step: Duration,
    poll_interval: Duration,
    rng: StdRng,
    /// Consecutive failed beacon reads
    read_failures: u64,
    /// Consecutive failed dance steps
    step_failures: u64,
}

/// What one pass through `step` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Danced,
    /// The drive refused the move; back off before retrying
    Failed,
    /// Shutdown arrived while waiting for the tracks
    Cancelled,
}

impl BeaconDance {
    /// Dance driven by `rng`; pass a seeded one for reproducible moves
    pub fn new(config: &DanceConfig, channel: u8, rng: StdRng) -> Self {
        Self {
            channel,
            max_speed_percent: config.max_speed_percent.clamp(0, 100),
            step: config.step(),
            poll_interval: config.poll_interval(),
            rng,
            read_failures: 0,
            step_failures: 0,
        }
    }

    /// Seeded from `config.seed`, or from entropy when unset
    pub fn from_config(config: &DanceConfig, channel: u8) -> Self {
        let rng = match config.seed {
            Some(seed) => {
                debug!("[BEACON-DANCE] Using fixed seed {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        Self::new(config, channel, rng)
    }

    /// Next pair of track speeds, percent
    pub fn next_move(&mut self) -> (i32, i32) {
        let max = self.max_speed_percent;
        (self.rng.gen_range(-max..=max), self.rng.gen_range(-max..=max))
    }

    fn beacon_held(&mut self, ctx: &BehaviorContext) -> bool {
        match ctx.devices.infrared.beacon(self.channel) {
            Ok(held) => {
                self.read_failures = 0;
                held
            }
            Err(e) => {
                self.read_failures += 1;
                if self.read_failures == 1 {
                    warn!("[BEACON-DANCE] Beacon read failed, treating as released: {}", e);
                }
                false
            }
        }
    }

    /// One dance step under the drive-pair lock
    fn step(&mut self, ctx: &BehaviorContext) -> Result<Step, BehaviorError> {
        let Some(guard) =
            ctx.acquire_unless_shutdown(&ActuatorId::DRIVE_PAIR, NAME, self.poll_interval)?
        else {
            return Ok(Step::Cancelled);
        };

        let (left, right) = self.next_move();
        guard.record(format!("run_for({}%, {}%, {:?}, coast)", left, right, self.step));
        debug!("[BEACON-DANCE] {}% / {}%", left, right);

        let result = ctx.devices.drive.run_for(
            Speed::Percent(left as f32),
            Speed::Percent(right as f32),
            self.step,
            Braking::Coast,
            Completion::Wait,
        );
        drop(guard);

        match result {
            Ok(()) => {
                if self.step_failures > 0 {
                    info!(
                        "[BEACON-DANCE] Drive back after {} failed steps",
                        self.step_failures
                    );
                    self.step_failures = 0;
                }
                Ok(Step::Danced)
            }
            Err(e) => {
                self.step_failures += 1;
                if self.step_failures == 1 {
                    warn!("[BEACON-DANCE] Dance step aborted: {}", e);
                } else {
                    debug!("[BEACON-DANCE] Dance step aborted again: {}", e);
                }
                Ok(Step::Failed)
            }
        }
    }
}

impl Behavior for BeaconDance {
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
        info!("[BEACON-DANCE] Watching beacon on channel {}", self.channel);
        let mut dancing = false;

        loop {
            if ctx.shutdown.is_triggered() {
                break;
            }

            if self.beacon_held(ctx) {
                if !dancing {
                    info!("[BEACON-DANCE] Beacon on, dancing");
                    dancing = true;
                }
                match self.step(ctx)? {
                    // Re-check the beacon right after the step
                    Step::Danced => continue,
                    Step::Failed => {
                        if ctx.shutdown.sleep(self.poll_interval) {
                            break;
                        }
                        continue;
                    }
                    Step::Cancelled => break,
                }
            }

            if dancing {
                info!("[BEACON-DANCE] Beacon off, idle");
                dancing = false;
            }
            if ctx.shutdown.sleep(self.poll_interval) {
                break;
            }
        }

        debug!("[BEACON-DANCE] Stopped");
        Ok(StopReason::Shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DanceConfig {
        DanceConfig {
            seed: Some(7),
            ..DanceConfig::default()
        }
    }

    #[test]
    fn test_moves_within_range() {
        let mut dance = BeaconDance::from_config(&config(), 1);
        for _ in 0..1000 {
            let (l, r) = dance.next_move();
            assert!((-100..=100).contains(&l));
            assert!((-100..=100).contains(&r));
        }
    }

    #[test]
    fn test_seed_reproducible() {
        let mut a = BeaconDance::from_config(&config(), 1);
        let mut b = BeaconDance::from_config(&config(), 1);
        let moves_a: Vec<_> = (0..20).map(|_| a.next_move()).collect();
        let moves_b: Vec<_> = (0..20).map(|_| b.next_move()).collect();
        assert_eq!(moves_a, moves_b);
    }

    #[test]
    fn test_narrow_range() {
        let mut config = config();
        config.max_speed_percent = 10;
        let mut dance = BeaconDance::from_config(&config, 1);
        for _ in 0..200 {
            let (l, r) = dance.next_move();
            assert!(l.abs() <= 10 && r.abs() <= 10);
        }
    }
}
