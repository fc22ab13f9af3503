// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Every function takes `&Database` and runs on the
//! single writer thread.

pub mod accounts;
pub mod history;
pub mod meta;
pub mod tokens;

use keywarden_core::{CipherFormat, SecretRecord};
use rusqlite::types::Type;

/// Read `(ciphertext, wrapped_key, cipher_format)` starting at column `idx`.
pub(crate) fn record_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<SecretRecord> {
    let format: String = row.get(idx + 2)?;
    let format = format
        .parse::<CipherFormat>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx + 2, Type::Text, Box::new(e)))?;
    Ok(SecretRecord {
        ciphertext: row.get(idx)?,
        wrapped_key: row.get(idx + 1)?,
        format,
    })
}

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
