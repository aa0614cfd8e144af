// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # tankbot Configuration System
//!
//! Type-safe configuration for the tracked robot with support for:
//! - TOML file parsing (`tankbot.toml`)
//! - Environment variable overrides
//! - Built-in defaults when no file is present
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tankbot_config::load_config_or_default;
//!
//! let config = load_config_or_default(None).expect("Failed to load config");
//!
//! println!("Remote channel: {}", config.remote.channel);
//! println!("Top speed: {} deg/s", config.remote.top_speed_dps);
//! ```
//!
//! Port identities and beacon channel are configuration constants: the
//! program itself takes no runtime arguments.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_environment_overrides, find_config_file, load_config, load_config_or_default};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
