// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config errors as miette diagnostics.
//!
//! Figment extraction errors are turned into [`ConfigError`]s pointing at
//! the offending line of whichever `keywarden.toml` layer produced them.
//! Misspelled keys get a Jaro-Winkler suggestion, and a key placed in the
//! wrong section (`demo_mode` under `[vault]`) is pointed at its real home.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity a candidate key needs before it is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Every section and the keys it accepts.
pub const KNOWN_KEYS: &[(&str, &[&str])] = &[
    (
        "vault",
        &[
            "kdf_memory_cost",
            "kdf_iterations",
            "kdf_parallelism",
            "max_field_bytes",
        ],
    ),
    (
        "rotation",
        &["progress_interval", "demo_mode", "feed_capacity", "retained_jobs"],
    ),
    ("storage", &["database_path", "wal_mode"]),
    ("server", &["host", "port"]),
    ("logging", &["level"]),
];

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(code(keywarden::config::unknown_key), help("{help}"))]
    UnknownKey {
        key: String,
        /// Closest valid key, possibly in another section (`server.port`).
        suggestion: Option<String>,
        help: String,
        #[label("not a keywarden setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(keywarden::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(code(keywarden::config::missing_key))]
    MissingKey { key: String },

    /// A value parsed but is out of the accepted range.
    #[error("`{key}`: {message}")]
    #[diagnostic(code(keywarden::config::validation))]
    Validation { key: &'static str, message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(keywarden::config::other))]
    Other(String),
}

/// The raw TOML text of each config layer, kept for error spans.
#[derive(Debug, Default)]
pub struct TomlSources {
    files: Vec<(String, String)>,
}

impl TomlSources {
    /// A single in-memory document.
    pub fn inline(content: &str) -> Self {
        Self {
            files: vec![("<inline>".to_string(), content.to_string())],
        }
    }

    /// Read whichever of `paths` exist. Unreadable files are skipped.
    pub fn read<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        let files = paths
            .into_iter()
            .filter_map(|path| {
                let path = path.as_ref();
                let content = std::fs::read_to_string(path).ok()?;
                let name = std::fs::canonicalize(path)
                    .unwrap_or_else(|_| path.to_path_buf())
                    .display()
                    .to_string();
                Some((name, content))
            })
            .collect();
        Self { files }
    }

    /// Source text and span of `key` inside `[section]`.
    fn locate(
        &self,
        origin: Option<&str>,
        section: Option<&str>,
        key: &str,
    ) -> Option<(NamedSource<String>, SourceSpan)> {
        let (name, content) = match origin {
            Some(origin) => self.files.iter().find(|(name, _)| name == origin)?,
            None if self.files.len() == 1 => &self.files[0],
            None => return None,
        };
        let offset = key_offset(content, section, key)?;
        Some((
            NamedSource::new(name, content.clone()),
            SourceSpan::new(offset.into(), key.len()),
        ))
    }
}

/// Byte offset of `key = ...` within `[section]` (or the root table).
///
/// Tracks table headers line by line, so a same-named key in another
/// section is never matched.
pub fn key_offset(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header.split(']').next().map(str::trim);
        } else if current == section {
            let is_key = trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if is_key {
                return Some(offset + (line.len() - trimmed.len()));
            }
        }
        offset += line.len();
    }
    None
}

/// Closest known key to `unknown`, preferring the section it appeared in.
///
/// Returns a bare key for a same-section match and `section.key` when the
/// key belongs somewhere else.
pub fn suggest_key(section: Option<&str>, unknown: &str) -> Option<String> {
    let local = KNOWN_KEYS
        .iter()
        .find(|(name, _)| Some(*name) == section)
        .map(|(_, keys)| *keys)
        .unwrap_or_default();

    let best_local = local
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0));
    if let Some((_, key)) = best_local {
        return Some(key.to_string());
    }

    KNOWN_KEYS
        .iter()
        .filter(|(name, _)| Some(*name) != section)
        .find_map(|(name, keys)| keys.contains(&unknown).then(|| format!("{name}.{unknown}")))
}

fn unknown_key_help(suggestion: Option<&str>, expected: &[&str]) -> String {
    let valid = expected.join(", ");
    match suggestion {
        Some(s) if s.contains('.') => format!("`{s}` is set in another section; valid here: {valid}"),
        Some(s) => format!("did you mean `{s}`? valid here: {valid}"),
        None => format!("valid here: {valid}"),
    }
}

/// Convert a `figment::Error` (which may hold several) into diagnostics.
pub fn figment_to_config_errors(err: figment::Error, sources: &TomlSources) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let section = error.path.first().map(String::as_str);
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let suggestion = suggest_key(section, key);
                    let origin = error.metadata.as_ref().and_then(|m| match &m.source {
                        Some(figment::Source::File(path)) => Some(path.display().to_string()),
                        _ => None,
                    });
                    let located = sources.locate(origin.as_deref(), section, key);
                    let (src, span) = located.map_or((None, None), |(s, sp)| (Some(s), Some(sp)));
                    ConfigError::UnknownKey {
                        key: key.clone(),
                        help: unknown_key_help(suggestion.as_deref(), expected),
                        suggestion,
                        span,
                        src,
                    }
                }
                Kind::MissingField(key) => ConfigError::MissingKey {
                    key: key.to_string(),
                },
                Kind::InvalidType(found, expected) => ConfigError::InvalidType {
                    key: error.path.join("."),
                    found: found.to_string(),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Print each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typo_in_section_is_suggested() {
        assert_eq!(
            suggest_key(Some("rotation"), "progress_intervall").as_deref(),
            Some("progress_interval")
        );
    }

    #[test]
    fn key_in_wrong_section_points_home() {
        assert_eq!(
            suggest_key(Some("vault"), "demo_mode").as_deref(),
            Some("rotation.demo_mode")
        );
    }

    #[test]
    fn unrelated_key_has_no_suggestion() {
        assert_eq!(suggest_key(Some("vault"), "zzzzzz"), None);
    }

    #[test]
    fn offset_respects_sections() {
        let content = "[server]\nport = 1\n[storage]\nwal_mode = true\n[rotation]\nport = 2\n";
        let o = key_offset(content, Some("rotation"), "port").unwrap();
        assert_eq!(&content[o..o + 8], "port = 2");
    }

    #[test]
    fn offset_skips_longer_keys() {
        let content = "[rotation]\ndemo_mode_extra = 1\ndemo_mode = true\n";
        let o = key_offset(content, Some("rotation"), "demo_mode").unwrap();
        assert_eq!(&content[o..o + 16], "demo_mode = true");
    }

    #[test]
    fn known_keys_match_the_model() {
        let defaults = toml::Value::try_from(crate::KeywardenConfig::default()).unwrap();
        let table = defaults.as_table().unwrap();
        assert_eq!(table.len(), KNOWN_KEYS.len());
        for (section, keys) in KNOWN_KEYS {
            let fields = table[*section].as_table().unwrap();
            let mut actual: Vec<&str> = fields.keys().map(String::as_str).collect();
            let mut expected = keys.to_vec();
            actual.sort_unstable();
            expected.sort_unstable();
            assert_eq!(actual, expected, "[{section}]");
        }
    }
}
