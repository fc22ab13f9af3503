// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted secret model shared by the vault, storage, and rotation crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Primary key of a secret-bearing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cipher scheme a stored record was written with.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CipherFormat {
    /// Envelope format: AEAD ciphertext plus a passphrase-wrapped data key.
    #[default]
    Current,
    /// Pre-envelope format: unauthenticated ciphertext plus its IV.
    Legacy,
}

/// One protected secret: `ciphertext` and `wrapped_key` always travel together.
///
/// For [`CipherFormat::Legacy`] records `wrapped_key` holds the IV instead.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub ciphertext: Vec<u8>,
    pub wrapped_key: Vec<u8>,
    #[serde(default)]
    pub format: CipherFormat,
}

impl SecretRecord {
    /// A record in the current envelope format.
    pub fn new(ciphertext: Vec<u8>, wrapped_key: Vec<u8>) -> Self {
        Self {
            ciphertext,
            wrapped_key,
            format: CipherFormat::Current,
        }
    }

    /// A record in the legacy format (`iv` is stored in the key column).
    pub fn legacy(ciphertext: Vec<u8>, iv: Vec<u8>) -> Self {
        Self {
            ciphertext,
            wrapped_key: iv,
            format: CipherFormat::Legacy,
        }
    }
}

impl std::fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretRecord")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("wrapped_key_len", &self.wrapped_key.len())
            .field("format", &self.format)
            .finish()
    }
}

/// Which secret-bearing store a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Live account passwords.
    Accounts,
    /// Account snapshots kept for history.
    AccountHistory,
    /// Vault containers attached to authorization tokens.
    TokenVaults,
}

/// A record as fetched for rotation.
#[derive(Debug, Clone)]
pub struct StoredSecret {
    pub id: RecordId,
    /// Human-readable label used in error reports (account name, token action).
    pub name: String,
    pub record: SecretRecord,
    /// Hash of the master passphrase active when the row was written.
    /// Only historical snapshots carry one.
    pub passphrase_hash: Option<String>,
}
