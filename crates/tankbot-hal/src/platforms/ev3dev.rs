// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// ev3dev platform
///
/// Drives a LEGO EV3 brick running ev3dev Linux through its sysfs driver
/// classes:
/// - `tacho-motor/motorN` for the drive and accessory motors
/// - `lego-sensor/sensorN` for touch, color and infrared sensors
/// - `leds/led{0,1}:{red,green}:brick-status` for the status lights
///
/// Sound goes through `aplay`, volume through `amixer`.
///
/// Devices are located by matching their `address` attribute against the
/// configured port name (e.g. `ev3-ports:outB` for port `outB`).
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tankbot_config::TankConfig;
use tracing::{debug, info, warn};

use crate::devices::{Devices, SoundLibrary};
use crate::error::{DeviceError, DeviceKind, DeviceResult};
use crate::hal::motor::rotation_duration;
use crate::hal::sensor::check_channel;
use crate::hal::*;
use crate::ir_mode::IrModeRegistry;

const STATE_POLL: Duration = Duration::from_millis(10);

/// One device directory under a sysfs class
#[derive(Debug, Clone)]
struct SysfsDevice {
    path: PathBuf,
    kind: DeviceKind,
}

impl SysfsDevice {
    /// Locate the device of `class` whose address ends with `port`
    fn find(sysfs_root: &Path, class: &str, port: &str, kind: DeviceKind) -> DeviceResult<Self> {
        let class_dir = sysfs_root.join(class);
        let entries = fs::read_dir(&class_dir).map_err(|e| {
            DeviceError::unavailable(kind, format!("{}: {}", class_dir.display(), e))
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(address) = fs::read_to_string(path.join("address")) else {
                continue;
            };
            if address.trim().ends_with(port) {
                debug!("[EV3DEV] {} on {} at {}", kind, port, path.display());
                return Ok(Self { path, kind });
            }
        }

        Err(DeviceError::unavailable(
            kind,
            format!("nothing connected to {}", port),
        ))
    }

    fn read(&self, attr: &str) -> DeviceResult<String> {
        fs::read_to_string(self.path.join(attr))
            .map(|s| s.trim().to_string())
            .map_err(|e| DeviceError::unavailable(self.kind, format!("read {}: {}", attr, e)))
    }

    fn read_int(&self, attr: &str) -> DeviceResult<i32> {
        let raw = self.read(attr)?;
        raw.parse().map_err(|_| {
            DeviceError::unavailable(self.kind, format!("{} is not a number: '{}'", attr, raw))
        })
    }

    fn write(&self, attr: &str, value: impl ToString) -> DeviceResult<()> {
        fs::write(self.path.join(attr), value.to_string())
            .map_err(|e| DeviceError::unavailable(self.kind, format!("write {}: {}", attr, e)))
    }
}

fn stop_action(braking: Braking) -> &'static str {
    match braking {
        Braking::Brake => "brake",
        Braking::Coast => "coast",
    }
}

/// A single tacho motor
#[derive(Debug)]
struct TachoMotor {
    dev: SysfsDevice,
    max_speed: f32,
}

impl TachoMotor {
    fn open(sysfs_root: &Path, port: &str, kind: DeviceKind) -> DeviceResult<Self> {
        let dev = SysfsDevice::find(sysfs_root, "tacho-motor", port, kind)?;
        let max_speed = dev.read_int("max_speed")? as f32;
        Ok(Self { dev, max_speed })
    }

    fn run_forever(&self, speed: Speed) -> DeviceResult<()> {
        let dps = speed.to_dps(self.max_speed, self.dev.kind)?;
        self.dev.write("speed_sp", dps.round() as i32)?;
        self.dev.write("command", "run-forever")
    }

    fn run_timed(&self, speed: Speed, duration: Duration, braking: Braking) -> DeviceResult<()> {
        let dps = speed.to_dps(self.max_speed, self.dev.kind)?;
        self.dev.write("stop_action", stop_action(braking))?;
        self.dev.write("speed_sp", dps.round() as i32)?;
        self.dev.write("time_sp", duration.as_millis())?;
        self.dev.write("command", "run-timed")
    }

    /// Returns the speed used, for the completion bound
    fn run_rotations(&self, speed: Speed, rotations: f32, braking: Braking) -> DeviceResult<f32> {
        let dps = speed.to_dps(self.max_speed, self.dev.kind)?;
        // Direction comes from the position; speed_sp magnitude only
        self.dev.write("stop_action", stop_action(braking))?;
        self.dev.write("speed_sp", dps.abs().round() as i32)?;
        self.dev
            .write("position_sp", (rotations * 360.0).round() as i32)?;
        self.dev.write("command", "run-to-rel-pos")?;
        Ok(dps)
    }

    fn stop(&self, braking: Braking) -> DeviceResult<()> {
        self.dev.write("stop_action", stop_action(braking))?;
        self.dev.write("command", "stop")
    }

    fn is_running(&self) -> DeviceResult<bool> {
        let state = self.dev.read("state")?;
        Ok(state.split_whitespace().any(|flag| flag == "running"))
    }

    /// Poll `state` until the motor stops or `bound` passes
    fn wait_idle(&self, started: Instant, bound: Duration) -> DeviceResult<()> {
        // The driver needs a moment before `running` shows up
        thread::sleep(STATE_POLL);
        while self.is_running()? {
            if started.elapsed() > bound {
                return Err(DeviceError::Timeout {
                    device: self.dev.kind,
                    waited: bound,
                });
            }
            thread::sleep(STATE_POLL);
        }
        Ok(())
    }
}

struct Ev3devDrive {
    left: TachoMotor,
    right: TachoMotor,
    slack: Duration,
}

impl Ev3devDrive {
    /// Stop the left track after the right one refused a command
    fn halt_left(&self, err: DeviceError) -> DeviceError {
        if let Err(stop_err) = self.left.stop(Braking::Coast) {
            warn!("[EV3DEV] Left track did not stop after right track failed: {}", stop_err);
        }
        err
    }
}

impl TankDrive for Ev3devDrive {
    fn run(&self, left: Speed, right: Speed) -> DeviceResult<()> {
        self.left.run_forever(left)?;
        self.right
            .run_forever(right)
            .map_err(|e| self.halt_left(e))
    }

    fn run_for(
        &self,
        left: Speed,
        right: Speed,
        duration: Duration,
        braking: Braking,
        completion: Completion,
    ) -> DeviceResult<()> {
        let started = Instant::now();
        self.left.run_timed(left, duration, braking)?;
        self.right
            .run_timed(right, duration, braking)
            .map_err(|e| self.halt_left(e))?;

        if completion == Completion::Wait {
            let bound = duration + self.slack;
            self.left.wait_idle(started, bound)?;
            self.right.wait_idle(started, bound)?;
        }
        Ok(())
    }

    fn stop(&self, braking: Braking) -> DeviceResult<()> {
        // Stop the right track even if the left one failed
        let left = self.left.stop(braking);
        let right = self.right.stop(braking);
        left.and(right)
    }

    fn max_speed_dps(&self) -> f32 {
        self.left.max_speed.min(self.right.max_speed)
    }

    fn probe(&self) -> DeviceResult<()> {
        self.left.dev.read("driver_name")?;
        self.right.dev.read("driver_name")?;
        Ok(())
    }
}

struct Ev3devAccessory {
    motor: TachoMotor,
    slack: Duration,
}

impl AccessoryMotor for Ev3devAccessory {
    fn run_for_rotations(
        &self,
        speed: Speed,
        rotations: f32,
        braking: Braking,
        completion: Completion,
    ) -> DeviceResult<()> {
        let started = Instant::now();
        let dps = self.motor.run_rotations(speed, rotations, braking)?;
        if completion == Completion::Wait {
            let bound = rotation_duration(rotations, dps) + self.slack;
            self.motor.wait_idle(started, bound)?;
        }
        Ok(())
    }

    fn stop(&self, braking: Braking) -> DeviceResult<()> {
        self.motor.stop(braking)
    }

    fn max_speed_dps(&self) -> f32 {
        self.motor.max_speed
    }

    fn probe(&self) -> DeviceResult<()> {
        self.motor.dev.read("driver_name").map(|_| ())
    }
}

/// A lego-sensor with lazily switched mode
#[derive(Debug)]
struct LegoSensor {
    dev: SysfsDevice,
    mode: Mutex<Option<String>>,
}

impl LegoSensor {
    fn open(sysfs_root: &Path, port: &str, kind: DeviceKind) -> DeviceResult<Self> {
        Ok(Self {
            dev: SysfsDevice::find(sysfs_root, "lego-sensor", port, kind)?,
            mode: Mutex::new(None),
        })
    }

    /// Read `value{index}` in `mode`, switching modes first if needed
    fn read_value(&self, mode: &str, index: usize) -> DeviceResult<i32> {
        let mut current = self.mode.lock();
        if current.as_deref() != Some(mode) {
            self.dev.write("mode", mode)?;
            *current = Some(mode.to_string());
        }
        self.dev.read_int(&format!("value{}", index))
    }
}

struct Ev3devTouch(LegoSensor);

impl TouchSensor for Ev3devTouch {
    fn is_pressed(&self) -> DeviceResult<bool> {
        Ok(self.0.read_value("TOUCH", 0)? != 0)
    }
}

struct Ev3devColor(LegoSensor);

impl ColorSensor for Ev3devColor {
    fn ambient_light_intensity(&self) -> DeviceResult<f32> {
        Ok(self.0.read_value("COL-AMBIENT", 0)? as f32)
    }
}

struct Ev3devInfrared {
    sensor: LegoSensor,
    port: String,
}

impl InfraredSensor for Ev3devInfrared {
    fn port(&self) -> &str {
        &self.port
    }

    fn proximity(&self) -> DeviceResult<f32> {
        Ok(self.sensor.read_value("IR-PROX", 0)? as f32)
    }

    fn remote(&self, channel: u8) -> DeviceResult<RemoteSignal> {
        check_channel(channel)?;
        let code = self
            .sensor
            .read_value("IR-REMOTE", usize::from(channel - 1))?;
        RemoteSignal::from_code(code)
    }
}

/// Playing time assumed when a clip's header cannot be read
const UNKNOWN_CLIP_LENGTH: Duration = Duration::from_secs(10);
const WAV_HEADER_LEN: u64 = 44;

struct Ev3devSpeaker {
    slack: Duration,
}

/// Playing time of a PCM WAV file from its size and header byte rate
fn clip_length(path: &Path) -> Option<Duration> {
    let mut header = [0u8; WAV_HEADER_LEN as usize];
    let mut file = fs::File::open(path).ok()?;
    file.read_exact(&mut header).ok()?;
    if &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
        return None;
    }
    let byte_rate = u32::from_le_bytes([header[28], header[29], header[30], header[31]]);
    if byte_rate == 0 {
        return None;
    }
    let data_len = file.metadata().ok()?.len().saturating_sub(WAV_HEADER_LEN);
    Duration::try_from_secs_f64(data_len as f64 / f64::from(byte_rate)).ok()
}

/// Wait for `child` until `bound` passes, then kill it
fn wait_child(mut child: Child, bound: Duration, path: &Path) -> DeviceResult<()> {
    let started = Instant::now();
    loop {
        let status = child.try_wait().map_err(|e| {
            DeviceError::unavailable(DeviceKind::Speaker, format!("aplay: {}", e))
        })?;
        if let Some(status) = status {
            if !status.success() {
                return Err(DeviceError::unavailable(
                    DeviceKind::Speaker,
                    format!("aplay exited with {} for {}", status, path.display()),
                ));
            }
            return Ok(());
        }
        if started.elapsed() > bound {
            if let Err(e) = child.kill() {
                warn!("[EV3DEV] Could not kill aplay: {}", e);
            }
            let _ = child.wait();
            return Err(DeviceError::Timeout {
                device: DeviceKind::Speaker,
                waited: bound,
            });
        }
        thread::sleep(STATE_POLL);
    }
}

impl Speaker for Ev3devSpeaker {
    fn play_file(&self, path: &Path, volume: u8, completion: Completion) -> DeviceResult<()> {
        let volume = volume.min(100);
        let status = Command::new("amixer")
            .args(["-q", "set", "Playback", &format!("{}%", volume)])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = status {
            warn!("[EV3DEV] Could not set volume: {}", e);
        }

        let mut child = Command::new("aplay")
            .arg("-q")
            .arg(path)
            .spawn()
            .map_err(|e| DeviceError::unavailable(DeviceKind::Speaker, format!("aplay: {}", e)))?;

        match completion {
            Completion::Wait => {
                let length = clip_length(path).unwrap_or(UNKNOWN_CLIP_LENGTH);
                wait_child(child, length.saturating_add(self.slack), path)
            }
            Completion::NoWait => {
                // Reap in the background so no zombie is left behind
                thread::spawn(move || {
                    let _ = child.wait();
                });
                Ok(())
            }
        }
    }
}

/// The two bicolor brick LEDs
struct Ev3devLeds {
    root: PathBuf,
    /// Bumped on every new pattern; animations stop when it moves on
    generation: Arc<AtomicU64>,
}

impl Ev3devLeds {
    fn new(sysfs_root: &Path) -> Self {
        Self {
            root: sysfs_root.join("leds"),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn write_group(root: &Path, group: LedGroup, color: LedColor) -> DeviceResult<()> {
        let index = match group {
            LedGroup::Left => 0,
            LedGroup::Right => 1,
        };
        let (red, green) = color.mix();
        for (channel, level) in [("red", red), ("green", green)] {
            let dir = root.join(format!("led{}:{}:brick-status", index, channel));
            let max: f32 = fs::read_to_string(dir.join("max_brightness"))
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(255.0);
            fs::write(dir.join("brightness"), ((level * max).round() as i32).to_string())
                .map_err(|e| {
                    DeviceError::unavailable(DeviceKind::Indicators, format!("{}: {}", dir.display(), e))
                })?;
        }
        Ok(())
    }

    fn write_both(root: &Path, color: LedColor) -> DeviceResult<()> {
        Self::write_group(root, LedGroup::Left, color)?;
        Self::write_group(root, LedGroup::Right, color)
    }
}

impl Indicators for Ev3devLeds {
    fn set_pattern(&self, pattern: IndicatorPattern) -> DeviceResult<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        match pattern {
            IndicatorPattern::Solid(color) => Self::write_both(&self.root, color),
            IndicatorPattern::Group(group, color) => Self::write_group(&self.root, group, color),
            IndicatorPattern::PoliceLights {
                first,
                second,
                period,
                duration,
            } => {
                let root = self.root.clone();
                let current = Arc::clone(&self.generation);
                thread::Builder::new()
                    .name("tankbot-leds".to_string())
                    .spawn(move || {
                        let started = Instant::now();
                        let mut swapped = false;
                        while started.elapsed() < duration
                            && current.load(Ordering::SeqCst) == generation
                        {
                            let (l, r) = if swapped { (second, first) } else { (first, second) };
                            if let Err(e) = Self::write_group(&root, LedGroup::Left, l)
                                .and_then(|_| Self::write_group(&root, LedGroup::Right, r))
                            {
                                warn!("[EV3DEV] LED animation stopped: {}", e);
                                return;
                            }
                            swapped = !swapped;
                            thread::sleep(period);
                        }
                        if current.load(Ordering::SeqCst) == generation {
                            let _ = Self::write_both(&root, LedColor::Black);
                        }
                    })
                    .map(|_| ())
                    .map_err(|e| {
                        DeviceError::unavailable(DeviceKind::Indicators, format!("spawn: {}", e))
                    })
            }
        }
    }

    fn clear(&self) -> DeviceResult<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        Self::write_both(&self.root, LedColor::Black)
    }
}

/// Open every device of the robot from sysfs
///
/// # Errors
/// `DeviceError::Unavailable` for the first device that cannot be found.
pub fn open(config: &TankConfig) -> DeviceResult<Devices> {
    let root = config.platform.sysfs_root.as_path();
    let ports = &config.ports;
    let slack = config.scheduler.device_timeout_slack();

    info!("[EV3DEV] Opening devices under {}", root.display());

    let drive = Ev3devDrive {
        left: TachoMotor::open(root, &ports.left_drive, DeviceKind::TankDrive)?,
        right: TachoMotor::open(root, &ports.right_drive, DeviceKind::TankDrive)?,
        slack,
    };
    let accessory = Ev3devAccessory {
        motor: TachoMotor::open(root, &ports.accessory, DeviceKind::Accessory)?,
        slack,
    };

    let infrared: Arc<dyn InfraredSensor> = Arc::new(Ev3devInfrared {
        sensor: LegoSensor::open(root, &ports.infrared, DeviceKind::Infrared)?,
        port: ports.infrared.clone(),
    });
    let proximity_infrared: Arc<dyn InfraredSensor> = if ports.proximity_infrared == ports.infrared {
        Arc::clone(&infrared)
    } else {
        Arc::new(Ev3devInfrared {
            sensor: LegoSensor::open(root, &ports.proximity_infrared, DeviceKind::Infrared)?,
            port: ports.proximity_infrared.clone(),
        })
    };

    Ok(Devices {
        drive: Arc::new(drive),
        accessory: Arc::new(accessory),
        touch: Arc::new(Ev3devTouch(LegoSensor::open(root, &ports.touch, DeviceKind::Touch)?)),
        color: Arc::new(Ev3devColor(LegoSensor::open(root, &ports.color, DeviceKind::Color)?)),
        infrared,
        proximity_infrared,
        speaker: Arc::new(Ev3devSpeaker { slack }),
        indicators: Arc::new(Ev3devLeds::new(root)),
        sounds: SoundLibrary::from_config(&config.sounds),
        ir_modes: Arc::new(IrModeRegistry::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Build a fake sysfs tree with one device per class entry
    fn fake_device(root: &Path, class: &str, name: &str, port: &str, attrs: &[(&str, &str)]) -> PathBuf {
        let dir = root.join(class).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("address"), format!("ev3-ports:{}\n", port)).unwrap();
        for (attr, value) in attrs {
            fs::write(dir.join(attr), value).unwrap();
        }
        dir
    }

    #[test]
    fn test_motor_lookup_and_commands() {
        let tmp = TempDir::new().unwrap();
        let dir = fake_device(
            tmp.path(),
            "tacho-motor",
            "motor0",
            "outA",
            &[("max_speed", "1560\n"), ("state", "\n")],
        );

        let motor = TachoMotor::open(tmp.path(), "outA", DeviceKind::Accessory).unwrap();
        assert_eq!(motor.max_speed, 1560.0);

        motor
            .run_rotations(Speed::Percent(-50.0), -3.0, Braking::Brake)
            .unwrap();
        assert_eq!(fs::read_to_string(dir.join("speed_sp")).unwrap(), "780");
        assert_eq!(fs::read_to_string(dir.join("position_sp")).unwrap(), "-1080");
        assert_eq!(fs::read_to_string(dir.join("stop_action")).unwrap(), "brake");
        assert_eq!(fs::read_to_string(dir.join("command")).unwrap(), "run-to-rel-pos");

        // Idle state returns at once
        motor
            .wait_idle(Instant::now(), Duration::from_secs(1))
            .unwrap();
    }

    #[test]
    fn test_running_motor_times_out() {
        let tmp = TempDir::new().unwrap();
        fake_device(
            tmp.path(),
            "tacho-motor",
            "motor1",
            "outB",
            &[("max_speed", "1050"), ("state", "running ramping")],
        );
        let motor = TachoMotor::open(tmp.path(), "outB", DeviceKind::TankDrive).unwrap();
        let err = motor
            .wait_idle(Instant::now(), Duration::from_millis(30))
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_left_track_stops_when_right_track_fails() {
        let tmp = TempDir::new().unwrap();
        let attrs = [("max_speed", "1050"), ("state", "")];
        let left_dir = fake_device(tmp.path(), "tacho-motor", "motor1", "outB", &attrs);
        let right_dir = fake_device(tmp.path(), "tacho-motor", "motor2", "outC", &attrs);
        let drive = Ev3devDrive {
            left: TachoMotor::open(tmp.path(), "outB", DeviceKind::TankDrive).unwrap(),
            right: TachoMotor::open(tmp.path(), "outC", DeviceKind::TankDrive).unwrap(),
            slack: Duration::from_millis(50),
        };

        // Unplugged after opening
        fs::remove_dir_all(&right_dir).unwrap();

        let err = drive
            .run(Speed::Percent(50.0), Speed::Percent(50.0))
            .unwrap_err();
        assert!(matches!(err, DeviceError::Unavailable { .. }));
        assert_eq!(fs::read_to_string(left_dir.join("command")).unwrap(), "stop");
        assert_eq!(fs::read_to_string(left_dir.join("stop_action")).unwrap(), "coast");

        fs::write(left_dir.join("command"), "").unwrap();
        let err = drive
            .run_for(
                Speed::Percent(50.0),
                Speed::Percent(50.0),
                Duration::from_millis(100),
                Braking::Brake,
                Completion::NoWait,
            )
            .unwrap_err();
        assert!(matches!(err, DeviceError::Unavailable { .. }));
        assert_eq!(fs::read_to_string(left_dir.join("command")).unwrap(), "stop");
    }

    #[test]
    fn test_clip_length_from_wav_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clip.wav");
        let mut bytes = vec![0u8; WAV_HEADER_LEN as usize];
        bytes[0..4].copy_from_slice(b"RIFF");
        bytes[8..12].copy_from_slice(b"WAVE");
        bytes[28..32].copy_from_slice(&8000u32.to_le_bytes());
        bytes.extend(std::iter::repeat(0u8).take(4000));
        fs::write(&path, &bytes).unwrap();
        assert_eq!(clip_length(&path), Some(Duration::from_millis(500)));

        let junk = tmp.path().join("junk.wav");
        fs::write(&junk, b"not a wav").unwrap();
        assert_eq!(clip_length(&junk), None);
        assert_eq!(clip_length(&tmp.path().join("missing.wav")), None);
    }

    #[test]
    fn test_stuck_player_is_killed() {
        let child = Command::new("sleep").arg("5").spawn().unwrap();
        let started = Instant::now();
        let err = wait_child(child, Duration::from_millis(50), Path::new("stuck.wav")).unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(2));

        let child = Command::new("true").spawn().unwrap();
        wait_child(child, Duration::from_secs(2), Path::new("ok.wav")).unwrap();

        let child = Command::new("false").spawn().unwrap();
        let err = wait_child(child, Duration::from_secs(2), Path::new("bad.wav")).unwrap_err();
        assert!(matches!(err, DeviceError::Unavailable { .. }));
    }

    #[test]
    fn test_missing_port_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("tacho-motor")).unwrap();
        let err = TachoMotor::open(tmp.path(), "outD", DeviceKind::TankDrive).unwrap_err();
        assert!(matches!(err, DeviceError::Unavailable { .. }));
    }

    #[test]
    fn test_remote_reads_channel_value() {
        let tmp = TempDir::new().unwrap();
        let dir = fake_device(
            tmp.path(),
            "lego-sensor",
            "sensor2",
            "in4",
            &[("value0", "0"), ("value1", "10")],
        );
        let ir = Ev3devInfrared {
            sensor: LegoSensor::open(tmp.path(), "in4", DeviceKind::Infrared).unwrap(),
            port: "in4".to_string(),
        };

        assert_eq!(ir.remote(1).unwrap(), RemoteSignal::None);
        let RemoteSignal::Buttons(buttons) = ir.remote(2).unwrap() else {
            panic!("expected buttons");
        };
        assert!(buttons.is_stop_combo());
        assert_eq!(fs::read_to_string(dir.join("mode")).unwrap(), "IR-REMOTE");
    }

    #[test]
    fn test_led_solid_color() {
        let tmp = TempDir::new().unwrap();
        for led in ["led0:red", "led0:green", "led1:red", "led1:green"] {
            let dir = tmp.path().join("leds").join(format!("{}:brick-status", led));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("max_brightness"), "255").unwrap();
        }

        let leds = Ev3devLeds::new(tmp.path());
        leds.set_pattern(IndicatorPattern::Solid(LedColor::Red)).unwrap();
        let read = |name: &str| {
            fs::read_to_string(tmp.path().join("leds").join(name).join("brightness")).unwrap()
        };
        assert_eq!(read("led0:red:brick-status"), "255");
        assert_eq!(read("led1:green:brick-status"), "0");

        leds.clear().unwrap();
        assert_eq!(read("led0:red:brick-status"), "0");
    }
}
