// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keywarden.toml` > `~/.config/keywarden/keywarden.toml`
//! > `/etc/keywarden/keywarden.toml` with environment variable overrides via
//! the `KEYWARDEN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeywardenConfig;

/// Config file name looked up in every layer.
pub const CONFIG_FILE_NAME: &str = "keywarden.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keywarden/keywarden.toml`
/// 3. `~/.config/keywarden/keywarden.toml`
/// 4. `./keywarden.toml`
/// 5. `KEYWARDEN_*` environment variables
pub fn load_config() -> Result<KeywardenConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<KeywardenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeywardenConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeywardenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeywardenConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeywardenConfig::default()))
        .merge(Toml::file(Path::new("/etc/keywarden").join(CONFIG_FILE_NAME)))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keywarden").join(CONFIG_FILE_NAME))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that
/// `KEYWARDEN_VAULT_KDF_MEMORY_COST` maps to `vault.kdf_memory_cost`,
/// not `vault.kdf.memory.cost`.
fn env_provider() -> Env {
    Env::prefixed("KEYWARDEN_")
        .ignore(&["master_pass", "new_master_pass"])
        .map(|key| {
            let mapped = key
                .as_str()
                .replacen("vault_", "vault.", 1)
                .replacen("rotation_", "rotation.", 1)
                .replacen("storage_", "storage.", 1)
                .replacen("server_", "server.", 1)
                .replacen("logging_", "logging.", 1);
            mapped.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("KEYWARDEN_VAULT_MAX_FIELD_BYTES", "4096");
            jail.set_env("KEYWARDEN_ROTATION_DEMO_MODE", "true");
            jail.set_env("KEYWARDEN_SERVER_PORT", "8080");
            let config = load_config()?;
            assert_eq!(config.vault.max_field_bytes, 4096);
            assert!(config.rotation.demo_mode);
            assert_eq!(config.server.port, 8080);
            Ok(())
        });
    }

    #[test]
    fn passphrase_env_vars_are_not_config_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("KEYWARDEN_MASTER_PASS", "alpha");
            let config = load_config()?;
            assert_eq!(config.logging.level, "info");
            Ok(())
        });
    }

    #[test]
    fn local_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                "[rotation]\nprogress_interval = 25\n",
            )?;
            let config = load_config()?;
            assert_eq!(config.rotation.progress_interval, 25);
            assert_eq!(config.vault.kdf_iterations, 3);
            Ok(())
        });
    }
}
