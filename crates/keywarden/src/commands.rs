// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `init`, `protect` and `reveal` against the local vault database.

use keywarden_config::model::KeywardenConfig;
use keywarden_config::VaultConfig;
use keywarden_core::{KeywardenError, RecordId};
use keywarden_storage::queries::{accounts, meta};
use keywarden_storage::Database;
use keywarden_vault::{hash_secret, verify_secret, RecordCodec};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

pub async fn open_database(config: &KeywardenConfig) -> Result<Database, KeywardenError> {
    Database::open_with(&config.storage).await
}

/// Check `passphrase` against the stored master hash and return that hash.
pub async fn verify_master(
    db: &Database,
    passphrase: &SecretString,
) -> Result<String, KeywardenError> {
    let hash = meta::get_meta(db, meta::MASTER_PASS_HASH)
        .await?
        .ok_or_else(|| {
            KeywardenError::Config("vault is not initialized; run `keywarden init`".to_string())
        })?;
    let candidate = passphrase.clone();
    let check = hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_secret(&candidate, &check))
        .await
        .map_err(|e| KeywardenError::Internal(format!("passphrase check panicked: {e}")))?;
    if !ok {
        return Err(KeywardenError::InvalidPassphrase);
    }
    Ok(hash)
}

/// Store the hash of the first master passphrase. Refuses to overwrite one.
pub async fn init_vault(
    db: &Database,
    vault: &VaultConfig,
    passphrase: &SecretString,
) -> Result<(), KeywardenError> {
    if meta::get_meta(db, meta::MASTER_PASS_HASH).await?.is_some() {
        return Err(KeywardenError::Config(
            "vault is already initialized; use `keywarden rotate` to change the passphrase"
                .to_string(),
        ));
    }
    let hash = hash_secret(passphrase, vault)?;
    meta::set_meta(db, meta::MASTER_PASS_HASH, &hash).await?;
    info!("master passphrase hash stored");
    Ok(())
}

/// Protect `secret` for account `name`.
///
/// An existing account of that name is snapshotted into history first and
/// then overwritten in place.
pub async fn protect_account(
    db: &Database,
    vault: &VaultConfig,
    passphrase: &SecretString,
    name: &str,
    login: &str,
    secret: &SecretString,
) -> Result<RecordId, KeywardenError> {
    let hash = verify_master(db, passphrase).await?;
    let record = RecordCodec::new(vault.clone()).protect(secret.expose_secret(), passphrase)?;

    let existing = accounts::list_accounts(db)
        .await?
        .into_iter()
        .find(|a| a.name == name);
    match existing {
        Some(account) => {
            accounts::snapshot_account(db, account.id, &hash).await?;
            accounts::update_account_secret(db, account.id, &record).await?;
            info!(record_id = %account.id, "account secret replaced");
            Ok(account.id)
        }
        None => {
            let id = accounts::insert_account(db, name, login, &record).await?;
            info!(record_id = %id, "account stored");
            Ok(id)
        }
    }
}

pub async fn reveal_account(
    db: &Database,
    vault: &VaultConfig,
    passphrase: &SecretString,
    id: RecordId,
) -> Result<SecretString, KeywardenError> {
    verify_master(db, passphrase).await?;
    let account = accounts::get_account(db, id)
        .await?
        .ok_or_else(|| KeywardenError::NotFound {
            kind: "account",
            id: id.to_string(),
        })?;
    RecordCodec::new(vault.clone()).reveal(&account.record, passphrase)
}
