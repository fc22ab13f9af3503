// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Self-contained encrypted blob for structured (non-string) secrets.

use keywarden_config::VaultConfig;
use keywarden_core::{CipherFormat, KeywardenError, SecretRecord};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto;
use crate::envelope::{self, WrappedKey};

/// A serialized payload encrypted under its own wrapped data key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultContainer {
    payload_ciphertext: Vec<u8>,
    wrapped_key: Vec<u8>,
}

impl VaultContainer {
    /// Serialize `payload` and encrypt it under a fresh data key.
    pub fn save<T: Serialize>(
        passphrase: &SecretString,
        payload: &T,
        config: &VaultConfig,
    ) -> Result<Self, KeywardenError> {
        let serialized = Zeroizing::new(serde_json::to_vec(payload)?);
        let secured = envelope::make_secured_key(passphrase, config)?;
        let payload_ciphertext = crypto::encrypt(&serialized, secured.data_key().as_bytes())?;
        Ok(Self {
            payload_ciphertext,
            wrapped_key: secured.into_wrapped().into_bytes(),
        })
    }

    /// Decrypt and deserialize the payload.
    pub fn open<T: DeserializeOwned>(&self, passphrase: &SecretString) -> Result<T, KeywardenError> {
        let wrapped = WrappedKey::from_bytes(self.wrapped_key.clone());
        let data_key = envelope::unlock_secured_key(&wrapped, passphrase)?;
        let serialized = Zeroizing::new(crypto::decrypt(
            &self.payload_ciphertext,
            data_key.as_bytes(),
        )?);
        Ok(serde_json::from_slice(&serialized)?)
    }

    /// Rebuild a container from its two persisted fields.
    pub fn from_parts(payload_ciphertext: Vec<u8>, wrapped_key: Vec<u8>) -> Self {
        Self {
            payload_ciphertext,
            wrapped_key,
        }
    }

    pub fn payload_ciphertext(&self) -> &[u8] {
        &self.payload_ciphertext
    }

    pub fn wrapped_key(&self) -> &[u8] {
        &self.wrapped_key
    }

    /// View as a current-format secret record, for byte-level rotation.
    pub fn to_record(&self) -> SecretRecord {
        SecretRecord::new(self.payload_ciphertext.clone(), self.wrapped_key.clone())
    }

    /// Rebuild from a record produced by rotation.
    pub fn from_record(record: SecretRecord) -> Result<Self, KeywardenError> {
        if record.format != CipherFormat::Current {
            return Err(KeywardenError::LegacyFormat);
        }
        Ok(Self::from_parts(record.ciphertext, record.wrapped_key))
    }
}

impl std::fmt::Debug for VaultContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultContainer")
            .field("payload_len", &self.payload_ciphertext.len())
            .field("wrapped_key_len", &self.wrapped_key.len())
            .finish()
    }
}
