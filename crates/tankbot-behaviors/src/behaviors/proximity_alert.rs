// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Flash and sound an alarm when something comes close
//!
//! Needs an IR sensor in proximity mode, so it cannot share the sensor that
//! receives the remote.

use std::time::Duration;

use tankbot_config::ProximityAlertConfig;
use tankbot_hal::{Completion, IndicatorPattern, IrMode, LedColor, SoundClip};
use tracing::{debug, info, warn};

use crate::actuator_lock::ActuatorId;
use crate::behavior::{Behavior, BehaviorContext, StopReason};
use crate::error::BehaviorError;

pub const NAME: &str = "proximity-alert";

const ALARM: [SoundClip; 3] = [SoundClip::Object, SoundClip::Detected, SoundClip::ErrorAlarm];

pub struct ProximityAlert {
    threshold_percent: f32,
    lights: IndicatorPattern,
    poll_interval: Duration,
    alerting: bool,
}

impl ProximityAlert {
    pub fn new(config: &ProximityAlertConfig) -> Self {
        Self {
            threshold_percent: config.threshold_percent,
            lights: IndicatorPattern::PoliceLights {
                first: LedColor::Orange,
                second: LedColor::Red,
                period: config.lights_period(),
                duration: config.lights_duration(),
            },
            poll_interval: config.poll_interval(),
            alerting: false,
        }
    }

    fn alarm(&mut self, ctx: &BehaviorContext, proximity: f32) {
        info!("[PROXIMITY-ALERT] Object at {:.0}%", proximity);
        self.alerting = true;

        if let Err(e) = ctx.devices.indicators.set_pattern(self.lights) {
            warn!("[PROXIMITY-ALERT] Lights failed: {}", e);
        }
        for clip in ALARM {
            if ctx.shutdown.is_triggered() {
                return;
            }
            if let Err(e) = ctx.devices.play_sound(clip, Completion::Wait) {
                warn!("[PROXIMITY-ALERT] Could not play '{}': {}", clip, e);
                return;
            }
        }
    }

    fn all_clear(&mut self, ctx: &BehaviorContext) {
        if !self.alerting {
            return;
        }
        self.alerting = false;
        if let Err(e) = ctx.devices.indicators.clear() {
            warn!("[PROXIMITY-ALERT] Could not clear lights: {}", e);
        }
    }
}

impl Behavior for ProximityAlert {
    fn name(&self) -> &str {
        NAME
    }

    fn actuators(&self) -> &[ActuatorId] {
        &[]
    }

    fn ir_mode(&self) -> Option<IrMode> {
        Some(IrMode::Proximity)
    }

    fn run(&mut self, ctx: &BehaviorContext) -> Result<StopReason, BehaviorError> {
        info!(
            "[PROXIMITY-ALERT] Watching {} (alert below {}%)",
            ctx.devices.proximity_infrared.port(),
            self.threshold_percent
        );

        loop {
            if ctx.shutdown.is_triggered() {
                break;
            }

            match ctx.devices.proximity_infrared.proximity() {
                Ok(p) if p < self.threshold_percent => self.alarm(ctx, p),
                Ok(_) => self.all_clear(ctx),
                Err(e) => {
                    warn!("[PROXIMITY-ALERT] Proximity read failed: {}", e);
                    // Force the visual fallback even if no alert was showing
                    self.alerting = true;
                    self.all_clear(ctx);
                }
            }

            if ctx.shutdown.sleep(self.poll_interval) {
                break;
            }
        }

        self.all_clear(ctx);
        debug!("[PROXIMITY-ALERT] Stopped");
        Ok(StopReason::Shutdown)
    }
}
