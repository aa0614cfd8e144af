//! Scheduler lifecycle: startup checks, grace period, shutdown report

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::*;
use tankbot_behaviors::{
    background_behaviors, foreground_behavior, ActuatorId, ActuatorLocks, Behavior, BehaviorContext,
    BehaviorError, BehaviorScheduler, BehaviorStatus, SchedulerError, StopReason,
};
use tankbot_hal::platforms::{SimCall, SimulatedRobot};
use tankbot_hal::{DeviceError, RemoteButtons, RemoteSignal};

/// Ignores shutdown for far longer than any grace period
struct Stubborn;

impl Behavior for Stubborn {
    fn name(&self) -> &str {
        "stubborn"
    }

    fn actuators(&self) -> &[ActuatorId] {
        &[]
    }

    fn run(&mut self, _ctx: &BehaviorContext) -> Result<StopReason, BehaviorError> {
        thread::sleep(Duration::from_secs(3));
        Ok(StopReason::Shutdown)
    }
}

struct Panicky;

impl Behavior for Panicky {
    fn name(&self) -> &str {
        "panicky"
    }

    fn actuators(&self) -> &[ActuatorId] {
        &[]
    }

    fn run(&mut self, _ctx: &BehaviorContext) -> Result<StopReason, BehaviorError> {
        panic!("behavior bug");
    }
}

fn scheduler_for(config: &tankbot_config::TankConfig) -> (SimulatedRobot, BehaviorScheduler) {
    let robot = SimulatedRobot::new(config);
    let scheduler = BehaviorScheduler::new(
        robot.devices(config),
        Arc::new(ActuatorLocks::new()),
        &config.scheduler,
    );
    (robot, scheduler)
}

#[test]
fn test_ir_mode_conflict_refused_before_start() {
    let mut config = fast_config();
    config.proximity_alert.enabled = true;
    assert_eq!(config.ports.proximity_infrared, config.ports.infrared);

    let (robot, mut scheduler) = scheduler_for(&config);
    for behavior in background_behaviors(&config) {
        scheduler.add_background(behavior);
    }
    let board = scheduler.status_board();

    let err = scheduler.run(foreground_behavior(&config)).unwrap_err();
    match err {
        SchedulerError::Configuration(DeviceError::ModeConflict { port, .. }) => {
            assert_eq!(port, config.ports.infrared)
        }
        other => panic!("expected IR mode conflict, got {other:?}"),
    }

    assert!(robot.calls().is_empty());
    assert!(board
        .snapshot()
        .iter()
        .all(|(_, status)| *status == BehaviorStatus::Idle));
}

#[test]
fn test_separate_proximity_sensor_allowed() {
    let mut config = fast_config();
    config.proximity_alert.enabled = true;
    config.ports.proximity_infrared = "in2".to_string();
    config.remote.signal_timeout_secs = 0.1;

    let (robot, mut scheduler) = scheduler_for(&config);
    for behavior in background_behaviors(&config) {
        scheduler.add_background(behavior);
    }
    robot.set_proximity(10.0);

    let report = scheduler.run(foreground_behavior(&config)).unwrap();
    assert_eq!(report.foreground, Ok(StopReason::SignalTimeout));
    assert!(report.stopped.contains(&"proximity-alert".to_string()));
    assert!(report.is_clean());
    assert!(robot
        .calls()
        .iter()
        .any(|c| matches!(c, SimCall::Indicators(_))));
}

#[test]
fn test_clean_shutdown_on_remote_stop() {
    let config = fast_config();
    let channel = config.remote.channel;
    let (robot, mut scheduler) = scheduler_for(&config);
    for behavior in background_behaviors(&config) {
        scheduler.add_background(behavior);
    }

    // Dance a little, then send the stop gesture
    robot.set_beacon(channel, true);
    let remote = robot.clone();
    let operator = thread::spawn(move || {
        assert!(remote.wait_for_call(|c| matches!(c, SimCall::DriveFor { .. }), EVENTUALLY));
        remote.set_remote(
            channel,
            RemoteSignal::Buttons(RemoteButtons::new(true, true, false, false)),
        );
    });

    let board = scheduler.status_board();
    let report = scheduler.run(foreground_behavior(&config)).unwrap();
    operator.join().unwrap();

    assert_eq!(report.foreground, Ok(StopReason::RemoteStop));
    let mut stopped = report.stopped.clone();
    stopped.sort();
    assert_eq!(stopped, vec!["beacon-dance", "touch-blast"]);
    assert!(report.failed.is_empty());
    assert!(report.detached.is_empty());
    assert!(report.held_at_exit.is_empty());
    assert_eq!(report.lock_stats.acquired, report.lock_stats.released);
    assert!(report.is_clean());
    assert_eq!(board.get("remote-drive"), Some(BehaviorStatus::Stopped));
    assert_eq!(board.get("beacon-dance"), Some(BehaviorStatus::Stopped));

    // Nothing moves after the report
    let settled = robot.calls().len();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(robot.calls().len(), settled);
    assert!(robot.max_concurrent_motions(tankbot_hal::DeviceKind::TankDrive) <= 1);
}

#[test]
fn test_shutdown_handle_stops_run() {
    let config = fast_config();
    let (_robot, mut scheduler) = scheduler_for(&config);
    for behavior in background_behaviors(&config) {
        scheduler.add_background(behavior);
    }

    let shutdown = scheduler.shutdown_handle();
    let trigger = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        shutdown.trigger();
    });

    let report = scheduler.run(foreground_behavior(&config)).unwrap();
    trigger.join().unwrap();
    assert_eq!(report.foreground, Ok(StopReason::Shutdown));
    assert!(report.is_clean());
}

#[test]
fn test_unresponsive_behavior_detached_after_grace() {
    let mut config = fast_config();
    config.scheduler.shutdown_grace_ms = 50;
    config.remote.signal_timeout_secs = 0.05;

    let (_robot, mut scheduler) = scheduler_for(&config);
    scheduler.add_background(Box::new(Stubborn));

    let start = Instant::now();
    let report = scheduler.run(foreground_behavior(&config)).unwrap();

    assert_eq!(report.detached, vec!["stubborn".to_string()]);
    assert!(!report.is_clean());
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_panicking_behavior_reported_failed() {
    let mut config = fast_config();
    config.remote.signal_timeout_secs = 0.05;

    let (_robot, mut scheduler) = scheduler_for(&config);
    scheduler.add_background(Box::new(Panicky));
    let board = scheduler.status_board();

    let report = scheduler.run(foreground_behavior(&config)).unwrap();
    // Foreground unaffected
    assert_eq!(report.foreground, Ok(StopReason::SignalTimeout));
    assert_eq!(report.failed, vec!["panicky".to_string()]);
    assert_eq!(board.get("panicky"), Some(BehaviorStatus::Failed));
}

#[test]
fn test_panicking_foreground_still_stops_background() {
    let config = fast_config();
    let (_robot, mut scheduler) = scheduler_for(&config);
    for behavior in background_behaviors(&config) {
        scheduler.add_background(behavior);
    }
    let shutdown = scheduler.shutdown_handle();
    let board = scheduler.status_board();

    let start = Instant::now();
    let report = scheduler.run(Box::new(Panicky)).unwrap();
    assert_eq!(
        report.foreground,
        Err(BehaviorError::Panicked("behavior bug".to_string()))
    );
    assert!(shutdown.is_triggered());
    let mut stopped = report.stopped.clone();
    stopped.sort();
    assert_eq!(stopped, vec!["beacon-dance", "touch-blast"]);
    assert!(report.detached.is_empty());
    assert!(report.held_at_exit.is_empty());
    assert!(!report.is_clean());
    assert_eq!(board.get("panicky"), Some(BehaviorStatus::Failed));
    assert!(start.elapsed() < Duration::from_secs(2));
}
