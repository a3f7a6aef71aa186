// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.
//!
//! Figment guarantees the shape; this module checks the ranges. Timeouts
//! must be finite and non-zero so queues cannot grow without bound, and the
//! pool must admit at least one reader.

use thiserror::Error;

use crate::model::MurmurConfig;

/// A single invalid configuration value.
#[derive(Debug, Error)]
#[error("invalid config: {field}: {message}")]
pub struct ConfigError {
    /// Dotted path of the offending field, e.g. `storage.pool_capacity`.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration, collecting every violation.
pub fn validate_config(config: &MurmurConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.pool_capacity == 0 {
        errors.push(ConfigError::new(
            "storage.pool_capacity",
            "must be at least 1",
        ));
    }
    if config.storage.write_timeout_ms == 0 {
        errors.push(ConfigError::new(
            "storage.write_timeout_ms",
            "must be non-zero; unbounded waits grow the write queue without limit",
        ));
    }
    if config.storage.lease_timeout_ms == 0 {
        errors.push(ConfigError::new(
            "storage.lease_timeout_ms",
            "must be non-zero; unbounded waits grow the read queue without limit",
        ));
    }
    if config.storage.retry_max_attempts == 0 {
        errors.push(ConfigError::new(
            "storage.retry_max_attempts",
            "must be at least 1",
        ));
    }
    if config.storage.database_file.is_empty() {
        errors.push(ConfigError::new("storage.database_file", "must not be empty"));
    }
    if config.storage.database_file.contains(std::path::MAIN_SEPARATOR) {
        errors.push(ConfigError::new(
            "storage.database_file",
            "must be a bare file name, not a path",
        ));
    }

    let level = config.service.log_level.as_str();
    if !["trace", "debug", "info", "warn", "error"].contains(&level) {
        errors.push(ConfigError::new(
            "service.log_level",
            format!("unknown level '{level}'"),
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Render validation errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("error: {error}");
    }
}
