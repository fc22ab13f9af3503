// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key/value vault metadata.

use keywarden_core::KeywardenError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

/// Key under which the current master passphrase hash is stored.
pub const MASTER_PASS_HASH: &str = "master_pass_hash";

pub async fn get_meta(db: &Database, key: &str) -> Result<Option<String>, KeywardenError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            match conn.query_row(
                "SELECT value FROM vault_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            ) {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_meta(db: &Database, key: &str, value: &str) -> Result<(), KeywardenError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO vault_meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
