// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that values are within their physical ranges and that ports do not
//! conflict. All problems are collected and reported together.

use std::time::Duration;

use crate::{ConfigError, ConfigResult, TankConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    PortConflict { port1: String, port2: String, port: String },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PortConflict { port1, port2, port } => {
                write!(f, "Port conflict: {} and {} both use port {}", port1, port2, port)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &TankConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_ports(config, &mut errors);
    validate_remote(config, &mut errors);
    validate_behaviors(config, &mut errors);
    validate_timing(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

/// Seconds must be finite, representable as a `Duration`, and positive
/// (or non-negative when `zero_ok`)
fn check_seconds(
    field: &str,
    value: f64,
    zero_ok: bool,
    errors: &mut Vec<ConfigValidationError>,
) {
    let reason = if !value.is_finite() {
        Some(format!("{} is not a finite number of seconds", value))
    } else if value < 0.0 || (value == 0.0 && !zero_ok) {
        Some(if zero_ok {
            "must be 0 or positive".to_string()
        } else {
            "must be greater than 0".to_string()
        })
    } else if Duration::try_from_secs_f64(value).is_err() {
        Some(format!("{} seconds is out of range", value))
    } else {
        None
    };

    if let Some(reason) = reason {
        errors.push(ConfigValidationError::InvalidValue {
            field: field.to_string(),
            reason,
        });
    }
}

fn validate_ports(config: &TankConfig, errors: &mut Vec<ConfigValidationError>) {
    for (field, port) in config.ports.all_ports() {
        if port.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }

    let motors = config.ports.motor_ports();
    for (i, (name1, port1)) in motors.iter().enumerate() {
        for (name2, port2) in motors.iter().skip(i + 1) {
            if !port1.is_empty() && port1 == port2 {
                errors.push(ConfigValidationError::PortConflict {
                    port1: name1.to_string(),
                    port2: name2.to_string(),
                    port: port1.to_string(),
                });
            }
        }
    }
}

fn validate_remote(config: &TankConfig, errors: &mut Vec<ConfigValidationError>) {
    if !(1..=4).contains(&config.remote.channel) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "remote.channel".to_string(),
            reason: format!("{} is not a beacon channel (1-4)", config.remote.channel),
        });
    }
    if !(config.remote.top_speed_dps > 0.0 && config.remote.top_speed_dps.is_finite()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "remote.top_speed_dps".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    // 0 disables the timeout
    check_seconds("remote.signal_timeout_secs", config.remote.signal_timeout_secs, true, errors);
}

fn validate_behaviors(config: &TankConfig, errors: &mut Vec<ConfigValidationError>) {
    if !(1..=100).contains(&config.dance.max_speed_percent) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "dance.max_speed_percent".to_string(),
            reason: "must be between 1 and 100".to_string(),
        });
    }
    check_seconds("dance.step_secs", config.dance.step_secs, false, errors);
    if !(0.0..=100.0).contains(&config.blast.ambient_light_threshold) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "blast.ambient_light_threshold".to_string(),
            reason: "must be between 0 and 100 percent".to_string(),
        });
    }
    if !(config.blast.rotations > 0.0 && config.blast.rotations.is_finite()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "blast.rotations".to_string(),
            reason: "must be greater than 0 (direction comes from the light reading)".to_string(),
        });
    }
    if !(config.blast.speed_percent > 0.0 && config.blast.speed_percent <= 100.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "blast.speed_percent".to_string(),
            reason: "must be in (0, 100]".to_string(),
        });
    }
    if !(0.0..=100.0).contains(&config.proximity_alert.threshold_percent) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "proximity_alert.threshold_percent".to_string(),
            reason: "must be between 0 and 100 percent".to_string(),
        });
    }
    check_seconds(
        "proximity_alert.lights_period_secs",
        config.proximity_alert.lights_period_secs,
        false,
        errors,
    );
    check_seconds(
        "proximity_alert.lights_duration_secs",
        config.proximity_alert.lights_duration_secs,
        true,
        errors,
    );
    if config.sounds.volume > 100 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "sounds.volume".to_string(),
            reason: "must be between 0 and 100".to_string(),
        });
    }
}

fn validate_timing(config: &TankConfig, errors: &mut Vec<ConfigValidationError>) {
    let intervals = [
        ("remote.poll_interval_ms", config.remote.poll_interval_ms),
        ("dance.poll_interval_ms", config.dance.poll_interval_ms),
        ("blast.poll_interval_ms", config.blast.poll_interval_ms),
        ("proximity_alert.poll_interval_ms", config.proximity_alert.poll_interval_ms),
    ];
    for (field, value) in intervals {
        if value == 0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: "must be at least 1 ms".to_string(),
            });
        }
    }
    if !(config.platform.time_scale >= 0.0 && config.platform.time_scale.is_finite()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "platform.time_scale".to_string(),
            reason: "must be a finite, non-negative factor".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_message(config: &TankConfig) -> String {
        match validate_config(config) {
            Err(ConfigError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TankConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_channel() {
        let mut config = TankConfig::default();
        config.remote.channel = 0;

        let msg = validation_message(&config);
        assert!(msg.contains("remote.channel"));
        assert!(msg.contains("1-4"));
    }

    #[test]
    fn test_motor_port_conflict() {
        let mut config = TankConfig::default();
        config.ports.accessory = "outB".to_string();

        let msg = validation_message(&config);
        assert!(msg.contains("Port conflict"));
        assert!(msg.contains("ports.left_drive"));
        assert!(msg.contains("outB"));
    }

    #[test]
    fn test_missing_port() {
        let mut config = TankConfig::default();
        config.ports.touch = "  ".to_string();

        let msg = validation_message(&config);
        assert!(msg.contains("ports.touch"));
    }

    #[test]
    fn test_all_errors_are_reported_together() {
        let mut config = TankConfig::default();
        config.dance.max_speed_percent = 250;
        config.blast.poll_interval_ms = 0;
        config.blast.ambient_light_threshold = -1.0;

        let msg = validation_message(&config);
        assert!(msg.contains("dance.max_speed_percent"));
        assert!(msg.contains("blast.poll_interval_ms"));
        assert!(msg.contains("blast.ambient_light_threshold"));
    }

    #[test]
    fn test_non_finite_seconds_rejected() {
        let mut config = TankConfig::default();
        config.remote.signal_timeout_secs = f64::INFINITY;
        config.dance.step_secs = f64::INFINITY;
        config.proximity_alert.lights_duration_secs = f64::NAN;
        config.proximity_alert.lights_period_secs = 1e300;

        let msg = validation_message(&config);
        assert!(msg.contains("remote.signal_timeout_secs"));
        assert!(msg.contains("dance.step_secs"));
        assert!(msg.contains("proximity_alert.lights_duration_secs"));
        assert!(msg.contains("proximity_alert.lights_period_secs"));
    }

    #[test]
    fn test_non_finite_factors_rejected() {
        let mut config = TankConfig::default();
        config.blast.rotations = f32::INFINITY;
        config.remote.top_speed_dps = f32::NAN;
        config.platform.time_scale = f64::INFINITY;

        let msg = validation_message(&config);
        assert!(msg.contains("blast.rotations"));
        assert!(msg.contains("remote.top_speed_dps"));
        assert!(msg.contains("platform.time_scale"));
    }

    #[test]
    fn test_unvalidated_seconds_do_not_panic() {
        let mut config = TankConfig::default();
        config.remote.signal_timeout_secs = f64::INFINITY;
        config.dance.step_secs = f64::NAN;
        config.proximity_alert.lights_duration_secs = -1.0;

        assert_eq!(config.remote.signal_timeout(), Some(Duration::MAX));
        assert_eq!(config.dance.step(), Duration::ZERO);
        assert_eq!(config.proximity_alert.lights_duration(), Duration::ZERO);
    }

    #[test]
    fn test_timeout_zero_disables() {
        let mut config = TankConfig::default();
        config.remote.signal_timeout_secs = 0.0;

        assert!(validate_config(&config).is_ok());
        assert!(config.remote.signal_timeout().is_none());
    }
}
