// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Two tiers are applied in order:
//! 1. TOML file (or built-in defaults when no file exists)
//! 2. Environment variables (runtime overrides)

use crate::{validate_config, Backend, ConfigError, ConfigResult, TankConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "tankbot.toml";

/// Find the tankbot configuration file
///
/// Search order:
/// 1. `TANKBOT_CONFIG_PATH` environment variable
/// 2. Current working directory: `./tankbot.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("TANKBOT_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by TANKBOT_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet TANKBOT_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
///
/// # Errors
///
/// Returns error if the file is not found, contains invalid TOML, or fails validation
pub fn load_config(config_path: Option<&Path>) -> ConfigResult<TankConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: TankConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration, falling back to built-in defaults when no file is found
///
/// An explicitly given path that does not exist is still an error; only the
/// search fallback is optional.
pub fn load_config_or_default(config_path: Option<&Path>) -> ConfigResult<TankConfig> {
    if config_path.is_some() {
        return load_config(config_path);
    }

    match find_config_file() {
        Ok(path) => load_config(Some(&path)),
        Err(ConfigError::FileNotFound(_)) if env::var("TANKBOT_CONFIG_PATH").is_err() => {
            let mut config = TankConfig::default();
            apply_environment_overrides(&mut config);
            validate_config(&config)?;
            Ok(config)
        }
        Err(e) => Err(e),
    }
}

fn env_flag(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower == "true" || lower == "1" || lower == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `TANKBOT_REMOTE_CHANNEL` -> `remote.channel`
/// - `TANKBOT_TOP_SPEED` -> `remote.top_speed_dps`
/// - `TANKBOT_SIGNAL_TIMEOUT` -> `remote.signal_timeout_secs`
/// - `TANKBOT_AMBIENT_THRESHOLD` -> `blast.ambient_light_threshold`
/// - `TANKBOT_DANCE_SEED` -> `dance.seed`
/// - `TANKBOT_PROXIMITY_ALERT` -> `proximity_alert.enabled`
/// - `TANKBOT_BACKEND` -> `platform.backend`
/// - `TANKBOT_SYSFS_ROOT` -> `platform.sysfs_root`
/// - `TANKBOT_LOG_LEVEL` -> `logging.level`
///
/// Unparseable values are ignored and the file value is kept.
pub fn apply_environment_overrides(config: &mut TankConfig) {
    if let Ok(value) = env::var("TANKBOT_REMOTE_CHANNEL") {
        if let Ok(channel) = value.parse::<u8>() {
            config.remote.channel = channel;
        }
    }
    if let Ok(value) = env::var("TANKBOT_TOP_SPEED") {
        if let Ok(speed) = value.parse::<f32>() {
            config.remote.top_speed_dps = speed;
        }
    }
    if let Ok(value) = env::var("TANKBOT_SIGNAL_TIMEOUT") {
        if let Ok(secs) = value.parse::<f64>() {
            config.remote.signal_timeout_secs = secs;
        }
    }
    if let Ok(value) = env::var("TANKBOT_AMBIENT_THRESHOLD") {
        if let Ok(threshold) = value.parse::<f32>() {
            config.blast.ambient_light_threshold = threshold;
        }
    }
    if let Ok(value) = env::var("TANKBOT_DANCE_SEED") {
        if let Ok(seed) = value.parse::<u64>() {
            config.dance.seed = Some(seed);
        }
    }
    if let Ok(value) = env::var("TANKBOT_PROXIMITY_ALERT") {
        config.proximity_alert.enabled = env_flag(&value);
    }
    if let Ok(value) = env::var("TANKBOT_BACKEND") {
        if let Ok(backend) = value.parse::<Backend>() {
            config.platform.backend = backend;
        }
    }
    if let Ok(value) = env::var("TANKBOT_SYSFS_ROOT") {
        config.platform.sysfs_root = PathBuf::from(value);
    }
    if let Ok(value) = env::var("TANKBOT_LOG_LEVEL") {
        config.logging.level = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var("TANKBOT_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("TANKBOT_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_an_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("TANKBOT_CONFIG_PATH", "/definitely/not/here/tankbot.toml");
        let result = load_config_or_default(None);
        env::remove_var("TANKBOT_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_partial_config_keeps_defaults() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tankbot.toml");

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[remote]").unwrap();
        writeln!(file, "channel = 3").unwrap();
        writeln!(file, "[blast]").unwrap();
        writeln!(file, "ambient_light_threshold = 15.0").unwrap();

        let config = load_config(Some(&config_path)).unwrap();

        assert_eq!(config.remote.channel, 3);
        assert_eq!(config.blast.ambient_light_threshold, 15.0);
        assert_eq!(config.remote.top_speed_dps, 1000.0);
        assert_eq!(config.ports.accessory, "outA");
        assert_eq!(config.blast.rotations, 3.0);
    }

    #[test]
    fn test_invalid_toml_reports_parse_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tankbot.toml");
        fs::write(&config_path, "[remote\nchannel = ").unwrap();

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tankbot.toml");
        fs::write(&config_path, "[remote]\nchannel = 9\n").unwrap();

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = TankConfig::default();

        env::set_var("TANKBOT_REMOTE_CHANNEL", "2");
        env::set_var("TANKBOT_TOP_SPEED", "750");
        env::set_var("TANKBOT_DANCE_SEED", "42");
        env::set_var("TANKBOT_BACKEND", "ev3dev");
        env::set_var("TANKBOT_PROXIMITY_ALERT", "yes");

        apply_environment_overrides(&mut config);

        env::remove_var("TANKBOT_REMOTE_CHANNEL");
        env::remove_var("TANKBOT_TOP_SPEED");
        env::remove_var("TANKBOT_DANCE_SEED");
        env::remove_var("TANKBOT_BACKEND");
        env::remove_var("TANKBOT_PROXIMITY_ALERT");

        assert_eq!(config.remote.channel, 2);
        assert_eq!(config.remote.top_speed_dps, 750.0);
        assert_eq!(config.dance.seed, Some(42));
        assert_eq!(config.platform.backend, Backend::Ev3dev);
        assert!(config.proximity_alert.enabled);
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = TankConfig::default();

        env::set_var("TANKBOT_REMOTE_CHANNEL", "left");
        apply_environment_overrides(&mut config);
        env::remove_var("TANKBOT_REMOTE_CHANNEL");

        assert_eq!(config.remote.channel, 1);
    }

    #[test]
    fn test_environment_wins_over_file() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tankbot.toml");
        fs::write(&config_path, "[remote]\nchannel = 3\ntop_speed_dps = 500.0\n").unwrap();

        env::set_var("TANKBOT_REMOTE_CHANNEL", "4");
        let config = load_config(Some(&config_path)).unwrap();
        env::remove_var("TANKBOT_REMOTE_CHANNEL");

        assert_eq!(config.remote.channel, 4);
        assert_eq!(config.remote.top_speed_dps, 500.0);
    }
}
