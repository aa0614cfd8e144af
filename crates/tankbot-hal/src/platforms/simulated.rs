// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Simulated robot
///
/// An in-memory stand-in for the whole robot. Sensors are scripted through
/// setters, every actuator and output call is appended to a call log, and
/// faults can be injected per device. Blocking actions sleep for their nominal
/// duration multiplied by the configured time scale.
///
/// The simulator also tracks how many blocking motions overlap on each
/// actuator, which exposes any caller that drives a motor without holding
/// its lock.
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ahash::AHashMap;
use parking_lot::{Condvar, Mutex};
use tankbot_config::TankConfig;
use tracing::{debug, trace};

use crate::devices::{Devices, SoundLibrary};
use crate::error::{DeviceError, DeviceKind, DeviceResult};
use crate::hal::motor::rotation_duration;
use crate::hal::sensor::check_channel;
use crate::hal::*;
use crate::ir_mode::IrModeRegistry;

/// EV3 large motor top speed
pub const LARGE_MOTOR_MAX_DPS: f32 = 1050.0;
/// EV3 medium motor top speed
pub const MEDIUM_MOTOR_MAX_DPS: f32 = 1560.0;

/// One recorded actuator or output call
#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
    DriveRun {
        left: Speed,
        right: Speed,
    },
    DriveFor {
        left: Speed,
        right: Speed,
        duration: Duration,
        braking: Braking,
    },
    DriveStop {
        braking: Braking,
    },
    AccessoryRotate {
        speed: Speed,
        rotations: f32,
        braking: Braking,
    },
    AccessoryStop {
        braking: Braking,
    },
    Sound {
        path: PathBuf,
        volume: u8,
    },
    Indicators(IndicatorPattern),
    IndicatorsCleared,
}

impl SimCall {
    /// Device the call was addressed to
    pub fn device(&self) -> DeviceKind {
        match self {
            SimCall::DriveRun { .. } | SimCall::DriveFor { .. } | SimCall::DriveStop { .. } => {
                DeviceKind::TankDrive
            }
            SimCall::AccessoryRotate { .. } | SimCall::AccessoryStop { .. } => {
                DeviceKind::Accessory
            }
            SimCall::Sound { .. } => DeviceKind::Speaker,
            SimCall::Indicators(_) | SimCall::IndicatorsCleared => DeviceKind::Indicators,
        }
    }
}

/// A call log entry with the time it was issued
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub at: Instant,
    pub call: SimCall,
}

/// Failure to inject into the next call on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Unavailable,
    /// The blocking action runs its nominal time, then reports a timeout
    Timeout,
}

#[derive(Debug, Default, Clone, Copy)]
struct IrState {
    proximity: f32,
    remote: [RemoteSignal; 4],
}

#[derive(Debug, Default, Clone, Copy)]
struct MotionTracker {
    in_flight: u32,
    max_in_flight: u32,
}

#[derive(Debug)]
struct SimInner {
    touch_pressed: bool,
    ambient_light: f32,
    ir: AHashMap<String, IrState>,
    events: Vec<SimEvent>,
    faults: AHashMap<DeviceKind, VecDeque<FaultKind>>,
    disconnected: Vec<DeviceKind>,
    motions: AHashMap<DeviceKind, MotionTracker>,
}

#[derive(Debug)]
struct SimState {
    inner: Mutex<SimInner>,
    changed: Condvar,
    time_scale: f64,
    timeout_slack: Duration,
    sound_length: Duration,
    remote_port: String,
    proximity_port: String,
}

impl SimState {
    fn scaled(&self, nominal: Duration) -> Duration {
        Duration::try_from_secs_f64(nominal.as_secs_f64() * self.time_scale.max(0.0))
            .unwrap_or(Duration::MAX)
    }

    /// Apply disconnects and injected faults before a call goes through
    fn check_fault(&self, device: DeviceKind) -> Option<FaultKind> {
        let mut inner = self.inner.lock();
        if inner.disconnected.contains(&device) {
            return Some(FaultKind::Unavailable);
        }
        inner.faults.get_mut(&device).and_then(|q| q.pop_front())
    }

    fn guard(&self, device: DeviceKind) -> DeviceResult<()> {
        match self.check_fault(device) {
            Some(FaultKind::Unavailable) => Err(DeviceError::unavailable(device, "simulated fault")),
            // Non-blocking calls have no bound to overrun
            Some(FaultKind::Timeout) | None => Ok(()),
        }
    }

    fn record(&self, call: SimCall) {
        trace!("[SIM] {:?}", call);
        let mut inner = self.inner.lock();
        inner.events.push(SimEvent {
            at: Instant::now(),
            call,
        });
        self.changed.notify_all();
    }

    /// Run a blocking action on `device` for `nominal`, tracking overlap
    fn blocking_motion(
        &self,
        device: DeviceKind,
        nominal: Duration,
        fault: Option<FaultKind>,
    ) -> DeviceResult<()> {
        {
            let mut inner = self.inner.lock();
            let tracker = inner.motions.entry(device).or_default();
            tracker.in_flight += 1;
            tracker.max_in_flight = tracker.max_in_flight.max(tracker.in_flight);
        }

        thread::sleep(self.scaled(nominal));

        {
            let mut inner = self.inner.lock();
            if let Some(tracker) = inner.motions.get_mut(&device) {
                tracker.in_flight = tracker.in_flight.saturating_sub(1);
            }
        }

        match fault {
            Some(FaultKind::Timeout) => Err(DeviceError::Timeout {
                device,
                waited: nominal + self.timeout_slack,
            }),
            _ => Ok(()),
        }
    }

    fn ir_state(&self, port: &str) -> IrState {
        self.inner.lock().ir.get(port).copied().unwrap_or_default()
    }
}

/// Handle to a simulated robot; clones share state
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    state: Arc<SimState>,
}

impl SimulatedRobot {
    pub fn new(config: &TankConfig) -> Self {
        let mut ir = AHashMap::new();
        let idle_ir = IrState {
            proximity: 100.0,
            remote: [RemoteSignal::None; 4],
        };
        ir.insert(config.ports.infrared.clone(), idle_ir);
        ir.insert(config.ports.proximity_infrared.clone(), idle_ir);

        debug!(
            "[SIM] Simulated robot created (time scale {})",
            config.platform.time_scale
        );

        Self {
            state: Arc::new(SimState {
                inner: Mutex::new(SimInner {
                    touch_pressed: false,
                    ambient_light: 50.0,
                    ir,
                    events: Vec::new(),
                    faults: AHashMap::new(),
                    disconnected: Vec::new(),
                    motions: AHashMap::new(),
                }),
                changed: Condvar::new(),
                time_scale: config.platform.time_scale,
                timeout_slack: config.scheduler.device_timeout_slack(),
                sound_length: Duration::from_millis(300),
                remote_port: config.ports.infrared.clone(),
                proximity_port: config.ports.proximity_infrared.clone(),
            }),
        }
    }

    /// Facade over this robot, with a fresh IR mode registry
    pub fn devices(&self, config: &TankConfig) -> Devices {
        let remote: Arc<dyn InfraredSensor> = Arc::new(SimInfrared {
            state: Arc::clone(&self.state),
            port: self.state.remote_port.clone(),
        });
        let proximity: Arc<dyn InfraredSensor> = if self.state.proximity_port == self.state.remote_port {
            Arc::clone(&remote)
        } else {
            Arc::new(SimInfrared {
                state: Arc::clone(&self.state),
                port: self.state.proximity_port.clone(),
            })
        };

        Devices {
            drive: Arc::new(SimDrive {
                state: Arc::clone(&self.state),
            }),
            accessory: Arc::new(SimAccessory {
                state: Arc::clone(&self.state),
            }),
            touch: Arc::new(SimTouch {
                state: Arc::clone(&self.state),
            }),
            color: Arc::new(SimColor {
                state: Arc::clone(&self.state),
            }),
            infrared: remote,
            proximity_infrared: proximity,
            speaker: Arc::new(SimSpeaker {
                state: Arc::clone(&self.state),
            }),
            indicators: Arc::new(SimIndicators {
                state: Arc::clone(&self.state),
            }),
            sounds: SoundLibrary::from_config(&config.sounds),
            ir_modes: Arc::new(IrModeRegistry::new()),
        }
    }

    // ------------------------------------------------------------------
    // Sensor scripting
    // ------------------------------------------------------------------

    pub fn set_touch(&self, pressed: bool) {
        self.state.inner.lock().touch_pressed = pressed;
    }

    pub fn set_ambient_light(&self, percent: f32) {
        self.state.inner.lock().ambient_light = percent;
    }

    /// Remote state on `channel` of the remote-receiving sensor
    pub fn set_remote(&self, channel: u8, signal: RemoteSignal) {
        let idx = usize::from(channel.clamp(1, 4) - 1);
        let port = self.state.remote_port.clone();
        self.state.inner.lock().ir.entry(port).or_default().remote[idx] = signal;
    }

    pub fn set_beacon(&self, channel: u8, held: bool) {
        let signal = if held {
            RemoteSignal::Beacon
        } else {
            RemoteSignal::None
        };
        self.set_remote(channel, signal);
    }

    /// Proximity reading of the proximity sensor
    pub fn set_proximity(&self, percent: f32) {
        let port = self.state.proximity_port.clone();
        self.state.inner.lock().ir.entry(port).or_default().proximity = percent;
    }

    // ------------------------------------------------------------------
    // Fault injection
    // ------------------------------------------------------------------

    /// Make the next call on `device` fail with `fault`
    pub fn fail_next(&self, device: DeviceKind, fault: FaultKind) {
        self.state
            .inner
            .lock()
            .faults
            .entry(device)
            .or_default()
            .push_back(fault);
    }

    pub fn disconnect(&self, device: DeviceKind) {
        let mut inner = self.state.inner.lock();
        if !inner.disconnected.contains(&device) {
            inner.disconnected.push(device);
        }
    }

    pub fn reconnect(&self, device: DeviceKind) {
        self.state.inner.lock().disconnected.retain(|d| *d != device);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn calls(&self) -> Vec<SimCall> {
        self.state
            .inner
            .lock()
            .events
            .iter()
            .map(|e| e.call.clone())
            .collect()
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.state.inner.lock().events.clone()
    }

    pub fn calls_for(&self, device: DeviceKind) -> Vec<SimCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.device() == device)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.inner.lock().events.clear();
    }

    /// Highest number of blocking motions ever overlapping on `device`
    pub fn max_concurrent_motions(&self, device: DeviceKind) -> u32 {
        self.state
            .inner
            .lock()
            .motions
            .get(&device)
            .map(|t| t.max_in_flight)
            .unwrap_or(0)
    }

    /// Block until a recorded call satisfies `predicate`, or `timeout` passes
    pub fn wait_for_call<F>(&self, predicate: F, timeout: Duration) -> bool
    where
        F: Fn(&SimCall) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut inner = self.state.inner.lock();
        loop {
            if inner.events.iter().any(|e| predicate(&e.call)) {
                return true;
            }
            if self.state.changed.wait_until(&mut inner, deadline).timed_out() {
                return inner.events.iter().any(|e| predicate(&e.call));
            }
        }
    }
}

// ----------------------------------------------------------------------
// Device handles
// ----------------------------------------------------------------------

struct SimDrive {
    state: Arc<SimState>,
}

impl TankDrive for SimDrive {
    fn run(&self, left: Speed, right: Speed) -> DeviceResult<()> {
        self.state.guard(DeviceKind::TankDrive)?;
        left.to_dps(LARGE_MOTOR_MAX_DPS, DeviceKind::TankDrive)?;
        right.to_dps(LARGE_MOTOR_MAX_DPS, DeviceKind::TankDrive)?;
        self.state.record(SimCall::DriveRun { left, right });
        Ok(())
    }

    fn run_for(
        &self,
        left: Speed,
        right: Speed,
        duration: Duration,
        braking: Braking,
        completion: Completion,
    ) -> DeviceResult<()> {
        let fault = self.state.check_fault(DeviceKind::TankDrive);
        if fault == Some(FaultKind::Unavailable) {
            return Err(DeviceError::unavailable(DeviceKind::TankDrive, "simulated fault"));
        }
        left.to_dps(LARGE_MOTOR_MAX_DPS, DeviceKind::TankDrive)?;
        right.to_dps(LARGE_MOTOR_MAX_DPS, DeviceKind::TankDrive)?;
        self.state.record(SimCall::DriveFor {
            left,
            right,
            duration,
            braking,
        });
        match completion {
            Completion::Wait => self
                .state
                .blocking_motion(DeviceKind::TankDrive, duration, fault),
            Completion::NoWait => Ok(()),
        }
    }

    fn stop(&self, braking: Braking) -> DeviceResult<()> {
        self.state.guard(DeviceKind::TankDrive)?;
        self.state.record(SimCall::DriveStop { braking });
        Ok(())
    }

    fn max_speed_dps(&self) -> f32 {
        LARGE_MOTOR_MAX_DPS
    }

    fn probe(&self) -> DeviceResult<()> {
        self.state.guard(DeviceKind::TankDrive)
    }
}

struct SimAccessory {
    state: Arc<SimState>,
}

impl AccessoryMotor for SimAccessory {
    fn run_for_rotations(
        &self,
        speed: Speed,
        rotations: f32,
        braking: Braking,
        completion: Completion,
    ) -> DeviceResult<()> {
        let fault = self.state.check_fault(DeviceKind::Accessory);
        if fault == Some(FaultKind::Unavailable) {
            return Err(DeviceError::unavailable(DeviceKind::Accessory, "simulated fault"));
        }
        let dps = speed.to_dps(MEDIUM_MOTOR_MAX_DPS, DeviceKind::Accessory)?;
        self.state.record(SimCall::AccessoryRotate {
            speed,
            rotations,
            braking,
        });
        match completion {
            Completion::Wait => self.state.blocking_motion(
                DeviceKind::Accessory,
                rotation_duration(rotations, dps),
                fault,
            ),
            Completion::NoWait => Ok(()),
        }
    }

    fn stop(&self, braking: Braking) -> DeviceResult<()> {
        self.state.guard(DeviceKind::Accessory)?;
        self.state.record(SimCall::AccessoryStop { braking });
        Ok(())
    }

    fn max_speed_dps(&self) -> f32 {
        MEDIUM_MOTOR_MAX_DPS
    }

    fn probe(&self) -> DeviceResult<()> {
        self.state.guard(DeviceKind::Accessory)
    }
}

struct SimTouch {
    state: Arc<SimState>,
}

impl TouchSensor for SimTouch {
    fn is_pressed(&self) -> DeviceResult<bool> {
        self.state.guard(DeviceKind::Touch)?;
        Ok(self.state.inner.lock().touch_pressed)
    }
}

struct SimColor {
    state: Arc<SimState>,
}

impl ColorSensor for SimColor {
    fn ambient_light_intensity(&self) -> DeviceResult<f32> {
        self.state.guard(DeviceKind::Color)?;
        Ok(self.state.inner.lock().ambient_light)
    }
}

struct SimInfrared {
    state: Arc<SimState>,
    port: String,
}

impl InfraredSensor for SimInfrared {
    fn port(&self) -> &str {
        &self.port
    }

    fn proximity(&self) -> DeviceResult<f32> {
        self.state.guard(DeviceKind::Infrared)?;
        Ok(self.state.ir_state(&self.port).proximity)
    }

    fn remote(&self, channel: u8) -> DeviceResult<RemoteSignal> {
        check_channel(channel)?;
        self.state.guard(DeviceKind::Infrared)?;
        Ok(self.state.ir_state(&self.port).remote[usize::from(channel - 1)])
    }
}

struct SimSpeaker {
    state: Arc<SimState>,
}

impl Speaker for SimSpeaker {
    fn play_file(&self, path: &Path, volume: u8, completion: Completion) -> DeviceResult<()> {
        let fault = self.state.check_fault(DeviceKind::Speaker);
        if fault == Some(FaultKind::Unavailable) {
            return Err(DeviceError::unavailable(DeviceKind::Speaker, "simulated fault"));
        }
        if volume > 100 {
            return Err(DeviceError::invalid(
                DeviceKind::Speaker,
                format!("volume {}% above 100", volume),
            ));
        }
        self.state.record(SimCall::Sound {
            path: path.to_path_buf(),
            volume,
        });
        match completion {
            Completion::Wait => {
                thread::sleep(self.state.scaled(self.state.sound_length));
                match fault {
                    Some(FaultKind::Timeout) => Err(DeviceError::Timeout {
                        device: DeviceKind::Speaker,
                        waited: self.state.sound_length + self.state.timeout_slack,
                    }),
                    _ => Ok(()),
                }
            }
            Completion::NoWait => Ok(()),
        }
    }
}

struct SimIndicators {
    state: Arc<SimState>,
}

impl Indicators for SimIndicators {
    fn set_pattern(&self, pattern: IndicatorPattern) -> DeviceResult<()> {
        self.state.guard(DeviceKind::Indicators)?;
        self.state.record(SimCall::Indicators(pattern));
        Ok(())
    }

    fn clear(&self) -> DeviceResult<()> {
        self.state.guard(DeviceKind::Indicators)?;
        self.state.record(SimCall::IndicatorsCleared);
        Ok(())
    }
}
