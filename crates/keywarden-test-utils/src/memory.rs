// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory persistence seams.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use keywarden_core::{
    KeywardenError, PassphraseHashStore, RecordId, SecretRecord, SecretStore, StoreKind,
    StoredSecret,
};
use keywarden_token::{AuthTokenModel, TokenStore};
use tokio::sync::Mutex;

#[derive(Default)]
struct SecretRows {
    next_id: i64,
    rows: BTreeMap<RecordId, StoredSecret>,
    failing_updates: HashSet<RecordId>,
    update_count: usize,
}

/// A [`SecretStore`] over an ordered map, with update-failure injection.
pub struct MemorySecretStore {
    kind: StoreKind,
    inner: Mutex<SecretRows>,
}

impl MemorySecretStore {
    pub fn new(kind: StoreKind) -> Self {
        Self {
            kind,
            inner: Mutex::new(SecretRows::default()),
        }
    }

    /// Insert a row and return its id (ids start at 1).
    pub async fn insert(
        &self,
        name: &str,
        record: SecretRecord,
        passphrase_hash: Option<String>,
    ) -> RecordId {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = RecordId(inner.next_id);
        inner.rows.insert(
            id,
            StoredSecret {
                id,
                name: name.to_string(),
                record,
                passphrase_hash,
            },
        );
        id
    }

    pub async fn get(&self, id: RecordId) -> Option<StoredSecret> {
        self.inner.lock().await.rows.get(&id).cloned()
    }

    /// Mutate a stored record in place (e.g. to corrupt it).
    pub async fn modify(&self, id: RecordId, f: impl FnOnce(&mut SecretRecord)) {
        if let Some(row) = self.inner.lock().await.rows.get_mut(&id) {
            f(&mut row.record);
        }
    }

    /// Delete a row, as another writer would.
    pub async fn remove(&self, id: RecordId) -> Option<StoredSecret> {
        self.inner.lock().await.rows.remove(&id)
    }

    /// Make every future update of `id` fail with a storage error.
    pub async fn fail_updates_for(&self, id: RecordId) {
        self.inner.lock().await.failing_updates.insert(id);
    }

    /// Stop injecting update failures.
    pub async fn clear_failures(&self) {
        self.inner.lock().await.failing_updates.clear();
    }

    /// How many successful updates were applied.
    pub async fn update_count(&self) -> usize {
        self.inner.lock().await.update_count
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    async fn fetch_secrets(&self) -> Result<Vec<StoredSecret>, KeywardenError> {
        Ok(self.inner.lock().await.rows.values().cloned().collect())
    }

    async fn update_secret(
        &self,
        id: RecordId,
        record: &SecretRecord,
        passphrase_hash: &str,
    ) -> Result<(), KeywardenError> {
        let mut inner = self.inner.lock().await;
        if inner.failing_updates.contains(&id) {
            return Err(KeywardenError::Storage {
                source: format!("injected failure for {id}").into(),
            });
        }
        let row = inner.rows.get_mut(&id).ok_or_else(|| KeywardenError::NotFound {
            kind: "record",
            id: id.to_string(),
        })?;
        row.record = record.clone();
        if row.passphrase_hash.is_some() {
            row.passphrase_hash = Some(passphrase_hash.to_string());
        }
        inner.update_count += 1;
        Ok(())
    }
}

/// A [`PassphraseHashStore`] holding one value.
#[derive(Default)]
pub struct MemoryHashStore {
    hash: Mutex<Option<String>>,
}

impl MemoryHashStore {
    pub fn with_hash(hash: impl Into<String>) -> Self {
        Self {
            hash: Mutex::new(Some(hash.into())),
        }
    }
}

#[async_trait]
impl PassphraseHashStore for MemoryHashStore {
    async fn current_hash(&self) -> Result<Option<String>, KeywardenError> {
        Ok(self.hash.lock().await.clone())
    }

    async fn set_current_hash(&self, hash: &str) -> Result<(), KeywardenError> {
        *self.hash.lock().await = Some(hash.to_string());
        Ok(())
    }
}

/// A [`TokenStore`] over a map keyed by row id.
#[derive(Default)]
pub struct MemoryTokenStore {
    rows: Mutex<BTreeMap<RecordId, AuthTokenModel>>,
}

impl MemoryTokenStore {
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn find_token(
        &self,
        user_id: i64,
        action: &str,
    ) -> Result<Option<AuthTokenModel>, KeywardenError> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .find(|t| t.user_id == user_id && t.action.to_string() == action)
            .cloned())
    }

    async fn insert_token(&self, token: &AuthTokenModel) -> Result<RecordId, KeywardenError> {
        let mut rows = self.rows.lock().await;
        let id = RecordId(rows.len() as i64 + 1);
        let mut token = token.clone();
        token.id = Some(id);
        rows.insert(id, token);
        Ok(id)
    }

    async fn replace_token(
        &self,
        id: RecordId,
        token: &AuthTokenModel,
    ) -> Result<(), KeywardenError> {
        let mut rows = self.rows.lock().await;
        let slot = rows.get_mut(&id).ok_or_else(|| KeywardenError::NotFound {
            kind: "token",
            id: id.to_string(),
        })?;
        let mut token = token.clone();
        token.id = Some(id);
        *slot = token;
        Ok(())
    }
}
