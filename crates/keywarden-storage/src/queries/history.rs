// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account history snapshot queries.

use keywarden_core::{KeywardenError, RecordId, SecretRecord};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::AccountHistoryEntry;
use crate::queries::record_at;

/// All history snapshots in id order.
pub async fn list_history(db: &Database) -> Result<Vec<AccountHistoryEntry>, KeywardenError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, account_id, name, login, pass, pass_key, cipher_format,
                        master_pass_hash, created_at
                 FROM account_history ORDER BY id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(AccountHistoryEntry {
                    id: RecordId(row.get(0)?),
                    account_id: RecordId(row.get(1)?),
                    name: row.get(2)?,
                    login: row.get(3)?,
                    record: record_at(row, 4)?,
                    master_pass_hash: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// Replace a snapshot's secret and its passphrase stamp in one statement.
pub async fn update_history_secret(
    db: &Database,
    id: RecordId,
    record: &SecretRecord,
    master_pass_hash: &str,
) -> Result<(), KeywardenError> {
    let record = record.clone();
    let hash = master_pass_hash.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE account_history
                 SET pass = ?1, pass_key = ?2, cipher_format = ?3, master_pass_hash = ?4
                 WHERE id = ?5",
                params![
                    record.ciphertext,
                    record.wrapped_key,
                    record.format.to_string(),
                    hash,
                    id.0,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(KeywardenError::NotFound {
            kind: "history entry",
            id: id.to_string(),
        });
    }
    Ok(())
}
