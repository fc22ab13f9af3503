// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementations of the core persistence seams.

use async_trait::async_trait;
use keywarden_core::{
    KeywardenError, PassphraseHashStore, RecordId, SecretRecord, SecretStore, StoreKind,
    StoredSecret,
};
use keywarden_token::{AuthTokenModel, TokenStore};

use crate::database::Database;
use crate::queries;

/// Live account passwords.
#[derive(Debug, Clone)]
pub struct AccountSecrets {
    db: Database,
}

impl AccountSecrets {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SecretStore for AccountSecrets {
    fn kind(&self) -> StoreKind {
        StoreKind::Accounts
    }

    async fn fetch_secrets(&self) -> Result<Vec<StoredSecret>, KeywardenError> {
        let accounts = queries::accounts::list_accounts(&self.db).await?;
        Ok(accounts
            .into_iter()
            .map(|a| StoredSecret {
                id: a.id,
                name: a.name,
                record: a.record,
                passphrase_hash: None,
            })
            .collect())
    }

    async fn update_secret(
        &self,
        id: RecordId,
        record: &SecretRecord,
        _passphrase_hash: &str,
    ) -> Result<(), KeywardenError> {
        queries::accounts::update_account_secret(&self.db, id, record).await
    }
}

/// Account history snapshots.
#[derive(Debug, Clone)]
pub struct HistorySecrets {
    db: Database,
}

impl HistorySecrets {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SecretStore for HistorySecrets {
    fn kind(&self) -> StoreKind {
        StoreKind::AccountHistory
    }

    async fn fetch_secrets(&self) -> Result<Vec<StoredSecret>, KeywardenError> {
        let entries = queries::history::list_history(&self.db).await?;
        Ok(entries
            .into_iter()
            .map(|e| StoredSecret {
                id: e.id,
                name: e.name,
                record: e.record,
                passphrase_hash: Some(e.master_pass_hash),
            })
            .collect())
    }

    async fn update_secret(
        &self,
        id: RecordId,
        record: &SecretRecord,
        passphrase_hash: &str,
    ) -> Result<(), KeywardenError> {
        queries::history::update_history_secret(&self.db, id, record, passphrase_hash).await
    }
}

/// Vault containers attached to authorization tokens.
#[derive(Debug, Clone)]
pub struct TokenVaultSecrets {
    db: Database,
}

impl TokenVaultSecrets {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SecretStore for TokenVaultSecrets {
    fn kind(&self) -> StoreKind {
        StoreKind::TokenVaults
    }

    async fn fetch_secrets(&self) -> Result<Vec<StoredSecret>, KeywardenError> {
        let tokens = queries::tokens::list_vault_tokens(&self.db).await?;
        Ok(tokens
            .into_iter()
            .filter_map(|t| {
                let id = t.id?;
                let vault = t.vault?;
                Some(StoredSecret {
                    id,
                    name: format!("{} token of user {}", t.action, t.user_id),
                    record: vault.to_record(),
                    passphrase_hash: None,
                })
            })
            .collect())
    }

    async fn update_secret(
        &self,
        id: RecordId,
        record: &SecretRecord,
        _passphrase_hash: &str,
    ) -> Result<(), KeywardenError> {
        queries::tokens::update_token_vault(&self.db, id, record).await
    }
}

/// Master passphrase hash kept in `vault_meta`.
#[derive(Debug, Clone)]
pub struct SqliteHashStore {
    db: Database,
}

impl SqliteHashStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PassphraseHashStore for SqliteHashStore {
    async fn current_hash(&self) -> Result<Option<String>, KeywardenError> {
        queries::meta::get_meta(&self.db, queries::meta::MASTER_PASS_HASH).await
    }

    async fn set_current_hash(&self, hash: &str) -> Result<(), KeywardenError> {
        queries::meta::set_meta(&self.db, queries::meta::MASTER_PASS_HASH, hash).await
    }
}

/// Authorization tokens in `auth_tokens`.
#[derive(Debug, Clone)]
pub struct SqliteTokenStore {
    db: Database,
}

impl SqliteTokenStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn find_token(
        &self,
        user_id: i64,
        action: &str,
    ) -> Result<Option<AuthTokenModel>, KeywardenError> {
        queries::tokens::find_token(&self.db, user_id, action).await
    }

    async fn insert_token(&self, token: &AuthTokenModel) -> Result<RecordId, KeywardenError> {
        queries::tokens::insert_token(&self.db, token).await
    }

    async fn replace_token(
        &self,
        id: RecordId,
        token: &AuthTokenModel,
    ) -> Result<(), KeywardenError> {
        queries::tokens::replace_token(&self.db, id, token).await
    }
}
