// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite stores.

use std::sync::Arc;

use keywarden_config::VaultConfig;
use keywarden_core::{
    CipherFormat, KeywardenError, PassphraseHashStore, RecordId, SecretRecord, SecretStore,
    StoreKind,
};
use keywarden_storage::queries::{accounts, history};
use keywarden_storage::{
    AccountSecrets, Database, HistorySecrets, SqliteHashStore, SqliteTokenStore, TokenVaultSecrets,
};
use keywarden_token::{ActionKind, TokenRequest, TokenSecureData, TokenService};
use keywarden_vault::legacy::legacy_encrypt;
use keywarden_vault::RecordCodec;
use secrecy::{ExposeSecret, SecretString};

fn fast_config() -> VaultConfig {
    VaultConfig {
        kdf_memory_cost: 1024,
        kdf_iterations: 1,
        kdf_parallelism: 1,
        ..VaultConfig::default()
    }
}

fn pass(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

#[tokio::test]
async fn account_secret_roundtrips_through_sqlite() {
    let db = Database::open_in_memory().await.unwrap();
    let codec = RecordCodec::new(fast_config());
    let record = codec.protect("S3cr3t!", &pass("alpha")).unwrap();

    let id = accounts::insert_account(&db, "mail", "me@example.com", &record)
        .await
        .unwrap();
    let account = accounts::get_account(&db, id).await.unwrap().unwrap();

    assert_eq!(account.name, "mail");
    assert_eq!(account.record, record);
    assert_eq!(
        codec.reveal(&account.record, &pass("alpha")).unwrap().expose_secret(),
        "S3cr3t!"
    );
}

#[tokio::test]
async fn legacy_format_is_preserved_in_rows() {
    let db = Database::open_in_memory().await.unwrap();
    let (ct, iv) = legacy_encrypt(b"old", &pass("alpha")).unwrap();
    let id = accounts::insert_account(&db, "old", "", &SecretRecord::legacy(ct, iv.to_vec()))
        .await
        .unwrap();

    let account = accounts::get_account(&db, id).await.unwrap().unwrap();
    assert_eq!(account.record.format, CipherFormat::Legacy);
}

#[tokio::test]
async fn updating_a_missing_account_is_not_found() {
    let db = Database::open_in_memory().await.unwrap();
    let record = SecretRecord::new(vec![1], vec![2]);
    let err = accounts::update_account_secret(&db, RecordId(42), &record)
        .await
        .unwrap_err();
    assert!(matches!(err, KeywardenError::NotFound { kind: "account", .. }));
}

#[tokio::test]
async fn snapshots_carry_the_passphrase_stamp() {
    let db = Database::open_in_memory().await.unwrap();
    let record = SecretRecord::new(vec![1, 2, 3], vec![4, 5, 6]);
    let id = accounts::insert_account(&db, "bank", "", &record).await.unwrap();

    let snap = accounts::snapshot_account(&db, id, "hash-alpha").await.unwrap();
    let entries = history::list_history(&db).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, snap);
    assert_eq!(entries[0].account_id, id);
    assert_eq!(entries[0].master_pass_hash, "hash-alpha");
    assert_eq!(entries[0].record, record);

    let store = HistorySecrets::new(db.clone());
    let replacement = SecretRecord::new(vec![9], vec![8]);
    store.update_secret(snap, &replacement, "hash-beta").await.unwrap();

    let fetched = store.fetch_secrets().await.unwrap();
    assert_eq!(fetched[0].record, replacement);
    assert_eq!(fetched[0].passphrase_hash.as_deref(), Some("hash-beta"));
}

#[tokio::test]
async fn account_store_updates_both_columns() {
    let db = Database::open_in_memory().await.unwrap();
    let id = accounts::insert_account(&db, "a", "", &SecretRecord::new(vec![1], vec![1]))
        .await
        .unwrap();

    let store = AccountSecrets::new(db.clone());
    assert_eq!(store.kind(), StoreKind::Accounts);
    let replacement = SecretRecord::new(vec![7, 7], vec![8, 8]);
    store.update_secret(id, &replacement, "ignored").await.unwrap();

    let fetched = store.fetch_secrets().await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].record, replacement);
    assert!(fetched[0].passphrase_hash.is_none());
}

#[tokio::test]
async fn hash_store_upserts() {
    let db = Database::open_in_memory().await.unwrap();
    let store = SqliteHashStore::new(db);
    assert!(store.current_hash().await.unwrap().is_none());

    store.set_current_hash("first").await.unwrap();
    store.set_current_hash("second").await.unwrap();
    assert_eq!(store.current_hash().await.unwrap().as_deref(), Some("second"));
}

#[tokio::test]
async fn token_service_issues_then_refreshes_in_place() {
    let db = Database::open_in_memory().await.unwrap();
    let service = TokenService::new(Arc::new(SqliteTokenStore::new(db.clone())), fast_config());
    let request = TokenRequest {
        user_id: 1,
        action: ActionKind::AccountViewPass,
        login_key: pass("login"),
    };

    let first = service.issue(&request, &pass("alpha")).await.unwrap();
    let second = service.issue(&request, &pass("alpha")).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_ne!(first.token, second.token);

    let vaults = TokenVaultSecrets::new(db).fetch_secrets().await.unwrap();
    assert_eq!(vaults.len(), 1);
    let stored = keywarden_vault::VaultContainer::from_record(vaults[0].record.clone()).unwrap();
    let secure: TokenSecureData = stored.open(&pass("alpha")).unwrap();
    assert_eq!(secure.token, second.token);
    assert_eq!(Some(secure.login_key_hash), second.hash);
}

#[tokio::test]
async fn unsecured_tokens_are_not_rotation_candidates() {
    let db = Database::open_in_memory().await.unwrap();
    let service = TokenService::new(Arc::new(SqliteTokenStore::new(db.clone())), fast_config());
    let request = TokenRequest {
        user_id: 1,
        action: ActionKind::ConfigBackupRun,
        login_key: pass("login"),
    };
    let token = service.issue(&request, &pass("alpha")).await.unwrap();
    assert!(token.vault.is_none());

    let vaults = TokenVaultSecrets::new(db).fetch_secrets().await.unwrap();
    assert!(vaults.is_empty());
}
