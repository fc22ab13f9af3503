// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account CRUD operations.

use keywarden_core::{KeywardenError, RecordId, SecretRecord};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::Account;
use crate::queries::{now, record_at};

const SELECT_ACCOUNT: &str = "SELECT id, name, login, pass, pass_key, cipher_format, created_at, updated_at
     FROM accounts";

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: RecordId(row.get(0)?),
        name: row.get(1)?,
        login: row.get(2)?,
        record: record_at(row, 3)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert a new account and return its id.
pub async fn insert_account(
    db: &Database,
    name: &str,
    login: &str,
    record: &SecretRecord,
) -> Result<RecordId, KeywardenError> {
    let name = name.to_string();
    let login = login.to_string();
    let record = record.clone();
    let ts = now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO accounts (name, login, pass, pass_key, cipher_format, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    name,
                    login,
                    record.ciphertext,
                    record.wrapped_key,
                    record.format.to_string(),
                    ts,
                ],
            )?;
            Ok(RecordId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// Get an account by id.
pub async fn get_account(db: &Database, id: RecordId) -> Result<Option<Account>, KeywardenError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_ACCOUNT} WHERE id = ?1"))?;
            match stmt.query_row(params![id.0], account_from_row) {
                Ok(account) => Ok(Some(account)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// All accounts in id order.
pub async fn list_accounts(db: &Database) -> Result<Vec<Account>, KeywardenError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_ACCOUNT} ORDER BY id"))?;
            let rows = stmt.query_map([], account_from_row)?;
            let mut accounts = Vec::new();
            for row in rows {
                accounts.push(row?);
            }
            Ok(accounts)
        })
        .await
        .map_err(map_tr_err)
}

/// Replace an account's ciphertext and wrapped key in one statement.
pub async fn update_account_secret(
    db: &Database,
    id: RecordId,
    record: &SecretRecord,
) -> Result<(), KeywardenError> {
    let record = record.clone();
    let ts = now();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE accounts SET pass = ?1, pass_key = ?2, cipher_format = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    record.ciphertext,
                    record.wrapped_key,
                    record.format.to_string(),
                    ts,
                    id.0,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(KeywardenError::NotFound {
            kind: "account",
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Copy an account's current row into `account_history`, stamped with the
/// hash of the master passphrase it is protected under.
pub async fn snapshot_account(
    db: &Database,
    id: RecordId,
    master_pass_hash: &str,
) -> Result<RecordId, KeywardenError> {
    let hash = master_pass_hash.to_string();
    let ts = now();
    let inserted = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO account_history
                    (account_id, name, login, pass, pass_key, cipher_format, master_pass_hash, created_at)
                 SELECT id, name, login, pass, pass_key, cipher_format, ?1, ?2
                 FROM accounts WHERE id = ?3",
                params![hash, ts, id.0],
            )?;
            Ok((changed > 0).then(|| RecordId(conn.last_insert_rowid())))
        })
        .await
        .map_err(map_tr_err)?;
    inserted.ok_or_else(|| KeywardenError::NotFound {
        kind: "account",
        id: id.to_string(),
    })
}
