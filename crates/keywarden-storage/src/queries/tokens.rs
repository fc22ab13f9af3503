// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization token queries.

use keywarden_core::{KeywardenError, RecordId, SecretRecord};
use keywarden_token::{ActionKind, AuthTokenModel};
use keywarden_vault::VaultContainer;
use rusqlite::params;
use rusqlite::types::Type;

use crate::database::{map_tr_err, Database};

const SELECT_TOKEN: &str = "SELECT id, user_id, action, token, vault_payload, vault_key, hash, created_at
     FROM auth_tokens";

fn token_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuthTokenModel> {
    let action: String = row.get(2)?;
    let action = action
        .parse::<ActionKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let payload: Option<Vec<u8>> = row.get(4)?;
    let key: Option<Vec<u8>> = row.get(5)?;
    let vault = match (payload, key) {
        (Some(payload), Some(key)) => Some(VaultContainer::from_parts(payload, key)),
        _ => None,
    };
    Ok(AuthTokenModel {
        id: Some(RecordId(row.get(0)?)),
        user_id: row.get(1)?,
        action,
        token: row.get(3)?,
        vault,
        hash: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn vault_columns(token: &AuthTokenModel) -> (Option<Vec<u8>>, Option<Vec<u8>>) {
    match &token.vault {
        Some(vault) => (
            Some(vault.payload_ciphertext().to_vec()),
            Some(vault.wrapped_key().to_vec()),
        ),
        None => (None, None),
    }
}

/// The token issued to `user_id` for `action`, if any.
pub async fn find_token(
    db: &Database,
    user_id: i64,
    action: &str,
) -> Result<Option<AuthTokenModel>, KeywardenError> {
    let action = action.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_TOKEN} WHERE user_id = ?1 AND action = ?2"))?;
            match stmt.query_row(params![user_id, action], token_from_row) {
                Ok(token) => Ok(Some(token)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a token and return its id.
pub async fn insert_token(db: &Database, token: &AuthTokenModel) -> Result<RecordId, KeywardenError> {
    let (payload, key) = vault_columns(token);
    let user_id = token.user_id;
    let action = token.action.to_string();
    let value = token.token.clone();
    let hash = token.hash.clone();
    let created_at = token.created_at.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO auth_tokens (user_id, action, token, vault_payload, vault_key, hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![user_id, action, value, payload, key, hash, created_at],
            )?;
            Ok(RecordId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// Replace token value, vault and hash of one row in a single statement.
pub async fn replace_token(
    db: &Database,
    id: RecordId,
    token: &AuthTokenModel,
) -> Result<(), KeywardenError> {
    let (payload, key) = vault_columns(token);
    let value = token.token.clone();
    let hash = token.hash.clone();
    let created_at = token.created_at.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE auth_tokens
                 SET token = ?1, vault_payload = ?2, vault_key = ?3, hash = ?4, created_at = ?5
                 WHERE id = ?6",
                params![value, payload, key, hash, created_at, id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(KeywardenError::NotFound {
            kind: "token",
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Tokens carrying a vault container, in id order.
pub async fn list_vault_tokens(db: &Database) -> Result<Vec<AuthTokenModel>, KeywardenError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_TOKEN} WHERE vault_payload IS NOT NULL AND vault_key IS NOT NULL ORDER BY id"
            ))?;
            let rows = stmt.query_map([], token_from_row)?;
            let mut tokens = Vec::new();
            for row in rows {
                tokens.push(row?);
            }
            Ok(tokens)
        })
        .await
        .map_err(map_tr_err)
}

/// Replace only the vault columns of a token, as rotation does.
pub async fn update_token_vault(
    db: &Database,
    id: RecordId,
    record: &SecretRecord,
) -> Result<(), KeywardenError> {
    let record = record.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE auth_tokens SET vault_payload = ?1, vault_key = ?2
                 WHERE id = ?3 AND vault_payload IS NOT NULL",
                params![record.ciphertext, record.wrapped_key, id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(KeywardenError::NotFound {
            kind: "token vault",
            id: id.to_string(),
        });
    }
    Ok(())
}
