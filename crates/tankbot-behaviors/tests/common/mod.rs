//! Common test utilities and helpers

#![allow(dead_code)]

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tankbot_behaviors::{ActuatorLocks, Behavior, BehaviorContext, BehaviorError, ShutdownSignal, StopReason};
use tankbot_config::TankConfig;
use tankbot_hal::platforms::{SimCall, SimulatedRobot};

/// Generous bound for "eventually" checks
pub const EVENTUALLY: Duration = Duration::from_secs(5);

/// Defaults with simulated motion 100x faster and quick polling
pub fn fast_config() -> TankConfig {
    let mut config = TankConfig::default();
    config.platform.time_scale = 0.01;
    config.remote.poll_interval_ms = 2;
    config.dance.poll_interval_ms = 2;
    config.dance.seed = Some(42);
    config.blast.poll_interval_ms = 2;
    config.proximity_alert.poll_interval_ms = 2;
    config.scheduler.shutdown_grace_ms = 2000;
    config
}

/// Simulated robot plus a behavior context over it
pub fn setup(config: &TankConfig) -> (SimulatedRobot, BehaviorContext) {
    let robot = SimulatedRobot::new(config);
    let ctx = BehaviorContext::new(
        robot.devices(config),
        Arc::new(ActuatorLocks::new()),
        ShutdownSignal::new(),
    );
    (robot, ctx)
}

/// Run `behavior` on its own thread
pub fn spawn_behavior<B>(mut behavior: B, ctx: &BehaviorContext) -> JoinHandle<Result<StopReason, BehaviorError>>
where
    B: Behavior + 'static,
{
    let ctx = ctx.clone();
    thread::spawn(move || behavior.run(&ctx))
}

/// Number of recorded calls matching `predicate`
pub fn count_calls<F>(robot: &SimulatedRobot, predicate: F) -> usize
where
    F: Fn(&SimCall) -> bool,
{
    robot.calls().iter().filter(|c| predicate(*c)).count()
}

/// Poll `condition` until true or `EVENTUALLY` passes
pub fn eventually<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = std::time::Instant::now() + EVENTUALLY;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
