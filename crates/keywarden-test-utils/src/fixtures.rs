// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record fixtures.

use keywarden_config::VaultConfig;
use keywarden_core::{KeywardenError, RecordId, SecretRecord};
use keywarden_vault::legacy::legacy_encrypt;
use keywarden_vault::RecordCodec;
use secrecy::SecretString;

use crate::memory::MemorySecretStore;

/// Argon2id parameters cheap enough for unit tests. Never use in production.
pub fn fast_vault_config() -> VaultConfig {
    VaultConfig {
        kdf_memory_cost: 1024,
        kdf_iterations: 1,
        kdf_parallelism: 1,
        ..VaultConfig::default()
    }
}

pub fn fast_codec() -> RecordCodec {
    RecordCodec::new(fast_vault_config())
}

pub fn pass(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

/// Protect each `(name, secret)` under `passphrase` and insert it.
///
/// `passphrase_hash` is stamped onto every record (history-style stores).
pub async fn seed_secrets(
    store: &MemorySecretStore,
    passphrase: &SecretString,
    passphrase_hash: Option<&str>,
    secrets: &[(&str, &str)],
) -> Result<Vec<RecordId>, KeywardenError> {
    let codec = fast_codec();
    let mut ids = Vec::with_capacity(secrets.len());
    for (name, secret) in secrets {
        let record = codec.protect(secret, passphrase)?;
        ids.push(store.insert(name, record, passphrase_hash.map(str::to_string)).await);
    }
    Ok(ids)
}

/// Insert a legacy-format record.
pub async fn seed_legacy(
    store: &MemorySecretStore,
    passphrase: &SecretString,
    name: &str,
    secret: &str,
) -> Result<RecordId, KeywardenError> {
    let (ciphertext, iv) = legacy_encrypt(secret.as_bytes(), passphrase)?;
    Ok(store
        .insert(name, SecretRecord::legacy(ciphertext, iv.to_vec()), None)
        .await)
}

/// Flip one bit of the ciphertext body so authentication fails.
pub fn corrupt(record: &mut SecretRecord) {
    if let Some(last) = record.ciphertext.last_mut() {
        *last ^= 0x01;
    }
}
