// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output is always on. With the `file-logging` feature a JSON log
//! file is also written to a timestamped run folder, and old runs are pruned.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Where and how much to log
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Level for everything without a debug flag
    pub default_level: String,
    /// Ignored unless built with `file-logging`
    pub file_logging: bool,
    pub log_dir: PathBuf,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

/// Keeps file writers alive; logs are flushed when this is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder of the file log, when file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Initialize the global tracing subscriber
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags for filtering
/// * `options` - Default level and file output settings
///
/// # Errors
/// Fails if the log folder cannot be created or a global subscriber is already set.
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(&options.default_level);
    let env_filter = || {
        EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter: {}", filter))
    };

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter()?);
    layers.push(console_layer.boxed());

    #[cfg(feature = "file-logging")]
    let (file_guards, log_dir) = if options.file_logging {
        let (layer, guard, run_folder) = file_layer(options, env_filter()?)?;
        layers.push(layer);
        (vec![guard], Some(run_folder))
    } else {
        (Vec::new(), None)
    };

    #[cfg(not(feature = "file-logging"))]
    let log_dir = {
        if options.file_logging {
            eprintln!("Warning: file logging requested but tankbot was built without the `file-logging` feature");
        }
        None
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir,
    })
}

#[cfg(feature = "file-logging")]
type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[cfg(feature = "file-logging")]
fn file_layer(
    options: &LoggingOptions,
    env_filter: EnvFilter,
) -> Result<(BoxedLayer, tracing_appender::non_blocking::WorkerGuard, PathBuf)> {
    use chrono::Utc;
    use tracing_appender::rolling;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let run_folder = options.log_dir.join(format!("run_{}", timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_logs(&options.log_dir, options.retention_days, options.retention_runs)?;

    let appender = rolling::daily(&run_folder, "tankbot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .json()
        .with_filter(env_filter)
        .boxed();

    Ok((layer, guard, run_folder))
}

/// Remove run folders older than `retention_days`, then keep only the newest `retention_runs`
#[cfg(feature = "file-logging")]
fn cleanup_old_logs(base_log_dir: &Path, retention_days: u64, retention_runs: usize) -> Result<()> {
    use chrono::{NaiveDateTime, Utc};

    if !base_log_dir.exists() {
        return Ok(());
    }

    let cutoff = Utc::now().naive_utc() - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("run_"))
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y%m%d_%H%M%S").ok());
        if let Some(stamp) = stamp {
            runs.push((path, stamp));
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, stamp)| *stamp);

    let (expired, kept): (Vec<_>, Vec<_>) = runs.into_iter().partition(|(_, stamp)| *stamp < cutoff);
    let excess = kept.len().saturating_sub(retention_runs);

    for (path, _) in expired.iter().chain(kept.iter().take(excess)) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!("Warning: Failed to remove old log directory {}: {}", path.display(), e);
        }
    }

    Ok(())
}

/// Initialize console logging with default options
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingOptions::default())
}
