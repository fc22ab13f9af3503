// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Keywarden.

use thiserror::Error;

/// The error type used across every Keywarden crate.
#[derive(Debug, Error)]
pub enum KeywardenError {
    /// Configuration errors (invalid TOML, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The system randomness source failed. Never retried with a weaker source.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Unwrapping a data key or opening a ciphertext failed.
    ///
    /// Deliberately carries no detail: a wrong passphrase and corrupted data
    /// must be indistinguishable to the caller.
    #[error("decryption failed -- wrong passphrase or corrupted data")]
    Decryption,

    /// A protected field would exceed the configured column bound.
    #[error("{field} is {size} bytes, exceeding the {max} byte limit")]
    PayloadTooLarge {
        field: &'static str,
        size: usize,
        max: usize,
    },

    /// A historical record was written under a different master passphrase.
    #[error("passphrase mismatch for record `{record}`")]
    PassphraseMismatch { record: String },

    /// The record uses the legacy cipher format, readable only while rotating.
    #[error("record uses the legacy cipher format -- rotate the master passphrase to upgrade it")]
    LegacyFormat,

    /// A rotation could not start (nothing to rotate, bad request).
    #[error("rotation setup failed: {0}")]
    RotationSetup(String),

    /// Another rotation job is still running.
    #[error("a master passphrase rotation is already running")]
    RotationInProgress,

    /// The supplied master passphrase does not match its stored hash.
    #[error("master passphrase does not match")]
    InvalidPassphrase,

    /// A looked-up entity does not exist.
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    /// Payload (de)serialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeywardenError {
    /// Whether the failure concerns a single record and may be isolated by
    /// a batch job instead of aborting it.
    ///
    /// Everything raised while rotating one record is record-scoped, a row
    /// deleted mid-job (`NotFound`) included. Only a broken randomness
    /// source and job-level setup errors stop the batch.
    pub fn is_record_scoped(&self) -> bool {
        !matches!(
            self,
            KeywardenError::KeyGeneration(_)
                | KeywardenError::Config(_)
                | KeywardenError::RotationSetup(_)
                | KeywardenError::RotationInProgress
                | KeywardenError::InvalidPassphrase
        )
    }
}
