// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Murmur configuration system.

use std::path::PathBuf;

use murmur_config::model::MurmurConfig;
use murmur_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_murmur_config() {
    let toml = r#"
[service]
log_level = "debug"

[server]
host = "127.0.0.1"
port = 9090

[storage]
data_dir = "/var/lib/murmur"
database_file = "listening.db"
pool_capacity = 8
busy_timeout_ms = 2000
write_timeout_ms = 1500
lease_timeout_ms = 1500
retry_max_attempts = 5
retry_backoff_ms = 10
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/murmur"));
    assert_eq!(config.storage.database_file, "listening.db");
    assert_eq!(config.storage.pool_capacity, 8);
    assert_eq!(config.storage.write_timeout_ms, 1500);
    assert_eq!(config.storage.retry_max_attempts, 5);
    assert_eq!(
        config.storage.database_path(),
        PathBuf::from("/var/lib/murmur/listening.db")
    );
}

/// Unknown field in [storage] produces an error via deny_unknown_fields.
#[test]
fn unknown_field_in_storage_produces_error() {
    let toml = r#"
[storage]
pool_capcity = 8
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("pool_capcity"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    assert_eq!(config.storage.database_file, "murmur.db");
    assert_eq!(config.storage.pool_capacity, 4);
}

/// Dot-notation overrides land on the right nested field.
/// MURMUR_STORAGE_POOL_CAPACITY must map to storage.pool_capacity,
/// not storage.pool.capacity.
#[test]
fn env_style_override_maps_to_nested_field() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let toml_content = r#"
[storage]
pool_capacity = 2
"#;

    let config: MurmurConfig = Figment::new()
        .merge(Serialized::defaults(MurmurConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("storage.pool_capacity", 16))
        .extract()
        .expect("should merge env override");

    assert_eq!(config.storage.pool_capacity, 16);
}

/// The PORT environment variable overrides server.port.
#[test]
#[serial_test::serial]
fn port_env_var_overrides_server_port() {
    // SAFETY: serialized test, no other thread reads the environment here.
    unsafe { std::env::set_var("PORT", "12345") };
    let config = murmur_config::load_config().expect("config should load");
    unsafe { std::env::remove_var("PORT") };

    assert_eq!(config.server.port, 12345);
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: MurmurConfig = Figment::new()
        .merge(Serialized::defaults(MurmurConfig::default()))
        .merge(Toml::file("/nonexistent/path/murmur.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.server.port, 8000);
}

/// Validation failures surface through load_and_validate_str.
#[test]
fn invalid_values_fail_validation() {
    let toml = r#"
[storage]
pool_capacity = 0
write_timeout_ms = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.field == "storage.pool_capacity"));
    assert!(errors.iter().any(|e| e.field == "storage.write_timeout_ms"));
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[telemetry]
enabled = true
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown section");
    assert!(format!("{err}").contains("telemetry") || format!("{err}").contains("unknown"));
}
