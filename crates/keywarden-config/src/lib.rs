// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Keywarden.
//!
//! TOML parsing with strict validation (`deny_unknown_fields`), XDG file
//! hierarchy lookup, `KEYWARDEN_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! ```no_run
//! let config = keywarden_config::load_and_validate().expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError, TomlSources};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{KeywardenConfig, RotationConfig, VaultConfig};

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<KeywardenConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &layer_sources())),
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<KeywardenConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &TomlSources::inline(toml_content),
        )),
    }
}

/// The files of every config layer, for error spans.
fn layer_sources() -> TomlSources {
    let mut paths = vec![std::path::PathBuf::from(loader::CONFIG_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("keywarden").join(loader::CONFIG_FILE_NAME));
    }
    paths.push(std::path::Path::new("/etc/keywarden").join(loader::CONFIG_FILE_NAME));
    TomlSources::read(paths)
}
