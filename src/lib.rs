// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # tankbot
//!
//! Concurrent behavior control for a tracked EV3 robot: remote driving in
//! the foreground, a beacon dance and a touch-triggered launcher in the
//! background, all sharing the motors through per-actuator locks.
//!
//! ## Crates
//!
//! - **tankbot-config**: `tankbot.toml` loading, environment overrides, validation
//! - **tankbot-observability**: tracing setup and per-crate debug flags
//! - **tankbot-hal**: device facade with simulated and ev3dev backends
//! - **tankbot-behaviors**: actuator locks, behavior loops, scheduler
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tankbot::{ExitStatus, Robot};
//! use tankbot::config::TankConfig;
//!
//! let config = TankConfig::default();
//! let status = match Robot::start(&config) {
//!     Ok(robot) => robot.run(),
//!     Err(status) => status,
//! };
//! std::process::exit(status.code());
//! ```

pub mod app;
pub mod exit;

pub use app::Robot;
pub use exit::ExitStatus;

pub use tankbot_behaviors as behaviors;
pub use tankbot_config as config;
pub use tankbot_hal as hal;
pub use tankbot_observability as observability;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
