// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::KeywardenConfig;

/// Smallest accepted per-field bound; a wrapped key alone needs ~90 bytes.
const MIN_FIELD_BYTES: usize = 128;

/// Largest accepted `vault.kdf_memory_cost`, in KiB (1 GiB).
pub const MAX_KDF_MEMORY_COST: u32 = 1024 * 1024;
/// Largest accepted `vault.kdf_iterations`.
pub const MAX_KDF_ITERATIONS: u32 = 64;
/// Largest accepted `vault.kdf_parallelism`.
pub const MAX_KDF_PARALLELISM: u32 = 64;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first one.
pub fn validate_config(config: &KeywardenConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail =
        |key: &'static str, message: String| errors.push(ConfigError::Validation { key, message });

    if config.vault.kdf_memory_cost < 32768 {
        fail(
            "vault.kdf_memory_cost",
            format!("must be at least 32768 (32 MiB), got {}", config.vault.kdf_memory_cost),
        );
    }

    if config.vault.kdf_memory_cost > MAX_KDF_MEMORY_COST {
        fail(
            "vault.kdf_memory_cost",
            format!(
                "must be at most {MAX_KDF_MEMORY_COST} (1 GiB), got {}",
                config.vault.kdf_memory_cost
            ),
        );
    }

    if config.vault.kdf_iterations < 2 {
        fail(
            "vault.kdf_iterations",
            format!("must be at least 2, got {}", config.vault.kdf_iterations),
        );
    } else if config.vault.kdf_iterations > MAX_KDF_ITERATIONS {
        fail(
            "vault.kdf_iterations",
            format!(
                "must be at most {MAX_KDF_ITERATIONS}, got {}",
                config.vault.kdf_iterations
            ),
        );
    }

    if config.vault.kdf_parallelism < 1 {
        fail(
            "vault.kdf_parallelism",
            format!("must be at least 1, got {}", config.vault.kdf_parallelism),
        );
    } else if config.vault.kdf_parallelism > MAX_KDF_PARALLELISM {
        fail(
            "vault.kdf_parallelism",
            format!(
                "must be at most {MAX_KDF_PARALLELISM}, got {}",
                config.vault.kdf_parallelism
            ),
        );
    }

    if config.vault.max_field_bytes < MIN_FIELD_BYTES {
        fail(
            "vault.max_field_bytes",
            format!("must be at least {MIN_FIELD_BYTES}, got {}", config.vault.max_field_bytes),
        );
    }

    if config.rotation.progress_interval == 0 {
        fail("rotation.progress_interval", "must be at least 1".to_string());
    }

    if config.rotation.feed_capacity == 0 {
        fail("rotation.feed_capacity", "must be at least 1".to_string());
    }

    if config.rotation.retained_jobs == 0 {
        fail("rotation.retained_jobs", "must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path", "must not be empty".to_string());
    }

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host", "must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        fail(
            "server.host",
            format!("`{host}` is not a valid IP address or hostname"),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { key, .. } if key.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&KeywardenConfig::default()).is_ok());
    }

    #[test]
    fn weak_kdf_parameters_fail_validation() {
        let mut config = KeywardenConfig::default();
        config.vault.kdf_memory_cost = 1024;
        config.vault.kdf_iterations = 1;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_message(&errors, "kdf_memory_cost"));
        assert!(has_message(&errors, "kdf_iterations"));
    }

    #[test]
    fn runaway_kdf_parameters_fail_validation() {
        let mut config = KeywardenConfig::default();
        config.vault.kdf_memory_cost = MAX_KDF_MEMORY_COST + 1;
        config.vault.kdf_iterations = 1000;
        config.vault.kdf_parallelism = 1000;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(has_message(&errors, "at most"));
    }

    #[test]
    fn zero_progress_interval_fails_validation() {
        let mut config = KeywardenConfig::default();
        config.rotation.progress_interval = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "progress_interval"));
    }

    #[test]
    fn tiny_field_bound_fails_validation() {
        let mut config = KeywardenConfig::default();
        config.vault.max_field_bytes = 64;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "max_field_bytes"));
    }

    #[test]
    fn bad_host_fails_validation() {
        let mut config = KeywardenConfig::default();
        config.server.host = "local host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "server.host"));
    }
}
