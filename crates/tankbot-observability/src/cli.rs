// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags
//!
//! `--debug-tankbot-hal`, `--debug-all` and `TANKBOT_DEBUG` are the only
//! inputs the robot binary reads from its environment besides configuration.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

const FLAG_PREFIX: &str = "--debug-";
const DEBUG_ENV: &str = "TANKBOT_DEBUG";

/// Crates whose logs are raised to `debug`
///
/// ```rust
/// use tankbot_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-tankbot-hal".to_string()]);
/// assert!(flags.is_enabled("tankbot-hal"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Collect `--debug-<crate>` arguments; `--debug-all` selects every known crate
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if let Some(name) = arg.strip_prefix(FLAG_PREFIX) {
                flags.enable(name);
            }
        }
        flags
    }

    /// Add crates named by a `TANKBOT_DEBUG` value (`all` or a comma list)
    pub fn extend_from_env_value(&mut self, value: &str) {
        for name in value.split(',') {
            self.enable(name);
        }
    }

    fn enable(&mut self, name: &str) {
        match name.trim() {
            "" => {}
            "all" => self
                .crates
                .extend(KNOWN_CRATES.iter().map(|c| c.to_string())),
            name => {
                self.crates.insert(name.to_string());
            }
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.crates.is_empty()
    }

    /// `EnvFilter` directives, e.g. `"tankbot_hal=debug,info"`
    ///
    /// Tracing targets carry module paths, so `-` becomes `_`.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        self.crates
            .iter()
            .map(|name| format!("{}=debug", name.replace('-', "_")))
            .chain(std::iter::once(default_level.to_lowercase()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Flags from the process arguments plus `TANKBOT_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args().skip(1));
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.extend_from_env_value(&value);
    }
    flags
}

/// Usage text for `--help`
pub fn debug_flags_help() -> String {
    let mut help = String::from("Options:\n");
    help.push_str("  --debug-all             debug logs for every tankbot crate\n");
    help.push_str("  --debug-<crate>         debug logs for one crate\n\n");
    help.push_str(&format!("Crates: {}\n\n", KNOWN_CRATES.join(", ")));
    help.push_str(&format!(
        "{}=<crate>[,<crate>] or {}=all does the same from the environment.\n",
        DEBUG_ENV, DEBUG_ENV
    ));
    help.push_str("Everything else is read from tankbot.toml (TANKBOT_CONFIG_PATH).\n");
    help
}
