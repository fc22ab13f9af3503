// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Keywarden configuration system.

use keywarden_config::diagnostic::ConfigError;
use keywarden_config::{load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[vault]
kdf_memory_cost = 65536
kdf_iterations = 4
kdf_parallelism = 2
max_field_bytes = 4096

[rotation]
progress_interval = 50
demo_mode = true
feed_capacity = 64
retained_jobs = 4

[storage]
database_path = "/tmp/keywarden.db"
wal_mode = false

[server]
host = "0.0.0.0"
port = 8443

[logging]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.vault.kdf_iterations, 4);
    assert_eq!(config.vault.kdf_parallelism, 2);
    assert_eq!(config.vault.max_field_bytes, 4096);
    assert_eq!(config.rotation.progress_interval, 50);
    assert!(config.rotation.demo_mode);
    assert_eq!(config.rotation.feed_capacity, 64);
    assert_eq!(config.rotation.retained_jobs, 4);
    assert_eq!(config.storage.database_path, "/tmp/keywarden.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8443);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.vault.kdf_memory_cost, 65536);
    assert_eq!(config.vault.max_field_bytes, 2000);
    assert_eq!(config.rotation.progress_interval, 100);
    assert!(!config.rotation.demo_mode);
    assert_eq!(config.rotation.retained_jobs, 16);
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let toml = "[rotation]\ndemo_mod = true\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "demo_mod");
            assert_eq!(suggestion.as_deref(), Some("demo_mode"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let toml = "[server]\nport = \"not a number\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))));
}

#[test]
fn validation_runs_after_parsing() {
    let toml = "[vault]\nkdf_memory_cost = 8\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { key, .. } if *key == "vault.kdf_memory_cost")));
}

#[test]
fn key_in_wrong_section_is_located() {
    let toml = "[vault]\nkdf_iterations = 3\ndemo_mode = true\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    match &errors[0] {
        ConfigError::UnknownKey {
            suggestion, span, ..
        } => {
            assert_eq!(suggestion.as_deref(), Some("rotation.demo_mode"));
            let span = span.expect("inline source is searchable");
            assert_eq!(&toml[span.offset()..span.offset() + span.len()], "demo_mode");
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}
