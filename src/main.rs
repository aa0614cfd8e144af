// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! `tankbot` - run the tracked robot until the operator stops it
//!
//! Takes no arguments besides debug flags (`--debug-<crate>`); everything
//! else comes from `tankbot.toml` or `TANKBOT_*` environment variables.

use anyhow::Context;
use tracing::{info, warn};

use tankbot::config::{load_config_or_default, TankConfig};
use tankbot::observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingOptions};
use tankbot::{ExitStatus, Robot, VERSION};

fn main() {
    if std::env::args().any(|a| a == "--help" || a == "-h") {
        println!("tankbot {}\n\n{}", VERSION, debug_flags_help());
        return;
    }

    let config = match load_config_or_default(None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tankbot: {}", e);
            std::process::exit(ExitStatus::from_config_error(&e).code());
        }
    };

    let status = match run(&config) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("tankbot: {:#}", e);
            ExitStatus::Configuration
        }
    };
    std::process::exit(status.code());
}

/// Everything between a loaded config and the exit status
///
/// The logging guard lives here so file logs are flushed before exit.
fn run(config: &TankConfig) -> anyhow::Result<ExitStatus> {
    let debug_flags = parse_debug_flags();
    let options = LoggingOptions {
        default_level: config.logging.level.clone(),
        file_logging: config.logging.file_logging,
        log_dir: config.logging.log_dir.clone(),
        ..LoggingOptions::default()
    };
    let _logging = init_logging(&debug_flags, &options).context("Failed to initialize logging")?;

    info!("[APP] tankbot {} starting ({:?} backend)", VERSION, config.platform.backend);

    let robot = match Robot::start(config) {
        Ok(robot) => robot,
        Err(status) => return Ok(status),
    };

    let shutdown = robot.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("[APP] Interrupt received, stopping...");
        shutdown.trigger();
    }) {
        warn!("[APP] Ctrl-C handler not installed: {}", e);
    }

    Ok(robot.run())
}
