// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits driven by the master-passphrase rotation pipeline.

use async_trait::async_trait;

use crate::error::KeywardenError;
use crate::types::{RecordId, SecretRecord, StoreKind, StoredSecret};

/// A secret-bearing table the rotation pipeline can stream and rewrite.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Which store this is; used as the progress task name.
    fn kind(&self) -> StoreKind;

    /// Fetch every candidate record in a stable order.
    async fn fetch_secrets(&self) -> Result<Vec<StoredSecret>, KeywardenError>;

    /// Replace one record's ciphertext and wrapped key as a unit.
    ///
    /// `passphrase_hash` is the hash of the passphrase the new record is
    /// protected under; stores that do not track it ignore the argument.
    async fn update_secret(
        &self,
        id: RecordId,
        record: &SecretRecord,
        passphrase_hash: &str,
    ) -> Result<(), KeywardenError>;
}

/// Where the hash of the current master passphrase is kept.
#[async_trait]
pub trait PassphraseHashStore: Send + Sync {
    /// The stored hash, or `None` before the vault is initialized.
    async fn current_hash(&self) -> Result<Option<String>, KeywardenError>;

    /// Replace the stored hash after a successful rotation.
    async fn set_current_hash(&self, hash: &str) -> Result<(), KeywardenError>;
}
