// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # tankbot-observability
//!
//! Logging setup shared by every tankbot binary, with per-crate debug flag
//! support (`--debug-tankbot-hal`, `--debug-all`, `TANKBOT_DEBUG`).
//!
//! ## Features
//! - `file-logging`: JSON log files with daily rotation in a per-run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known tankbot crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "tankbot",
    "tankbot-config",
    "tankbot-hal",
    "tankbot-behaviors",
];
