// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-record data keys wrapped under a passphrase-derived key.
//!
//! A wrapped key is self-describing:
//!
//! ```text
//! version (1) | memory_cost (4, LE) | iterations (4, LE) | parallelism (4, LE)
//! | salt (16) | nonce (12) | sealed data key (32) | tag (16)
//! ```
//!
//! Because the Argon2id parameters travel with the key, raising the KDF cost
//! in configuration never strands records written under the old cost.

use keywarden_config::VaultConfig;
use keywarden_core::KeywardenError;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN, OVERHEAD};
use crate::kdf::{self, KdfParams, SALT_LEN};

const WRAPPED_KEY_VERSION: u8 = 1;
const HEADER_LEN: usize = 1 + 4 * 3 + SALT_LEN;

/// Total length of a wrapped key.
pub const WRAPPED_KEY_LEN: usize = HEADER_LEN + KEY_LEN + OVERHEAD;

/// A random per-record AES-256 key. Only ever held in memory.
pub struct DataKey(Zeroizing<[u8; KEY_LEN]>);

impl DataKey {
    /// Draw a fresh key from the system CSPRNG.
    pub fn generate() -> Result<Self, KeywardenError> {
        Ok(Self(Zeroizing::new(crypto::random_bytes()?)))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DataKey([REDACTED])")
    }
}

/// A [`DataKey`] sealed under a passphrase-derived key.
#[derive(Clone, PartialEq, Eq)]
pub struct WrappedKey(Vec<u8>);

impl WrappedKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// The Argon2id parameters recorded in the header, if it parses.
    pub fn kdf_params(&self) -> Option<KdfParams> {
        self.parts().map(|(params, _, _)| params)
    }

    fn parts(&self) -> Option<(KdfParams, [u8; SALT_LEN], &[u8])> {
        let bytes = &self.0;
        if bytes.len() != WRAPPED_KEY_LEN || bytes[0] != WRAPPED_KEY_VERSION {
            return None;
        }
        let read_u32 = |at: usize| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&bytes[at..at + 4]);
            u32::from_le_bytes(word)
        };
        let params = KdfParams {
            memory_cost: read_u32(1),
            iterations: read_u32(5),
            parallelism: read_u32(9),
        };
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[13..HEADER_LEN]);
        Some((params, salt, &bytes[HEADER_LEN..]))
    }
}

impl std::fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedKey")
            .field("len", &self.0.len())
            .field("kdf_params", &self.kdf_params())
            .finish()
    }
}

/// A freshly generated data key together with its wrapped form.
///
/// Returning both saves a second Argon2id run when the caller encrypts
/// immediately after generating the key.
#[derive(Debug)]
pub struct SecuredKey {
    wrapped: WrappedKey,
    data_key: DataKey,
}

impl SecuredKey {
    pub fn wrapped(&self) -> &WrappedKey {
        &self.wrapped
    }

    pub fn data_key(&self) -> &DataKey {
        &self.data_key
    }

    pub fn into_wrapped(self) -> WrappedKey {
        self.wrapped
    }
}

/// Generate a new data key and wrap it under `passphrase`.
///
/// Fails with [`KeywardenError::KeyGeneration`] if the randomness source is
/// unavailable.
pub fn make_secured_key(
    passphrase: &SecretString,
    config: &VaultConfig,
) -> Result<SecuredKey, KeywardenError> {
    let data_key = DataKey::generate()?;
    let params = KdfParams::from(config);
    let salt = kdf::generate_salt()?;
    let wrapping_key = kdf::derive_key(passphrase.expose_secret().as_bytes(), &salt, params)?;
    let sealed = crypto::encrypt(data_key.as_bytes(), &wrapping_key)?;

    let mut bytes = Vec::with_capacity(WRAPPED_KEY_LEN);
    bytes.push(WRAPPED_KEY_VERSION);
    bytes.extend_from_slice(&params.memory_cost.to_le_bytes());
    bytes.extend_from_slice(&params.iterations.to_le_bytes());
    bytes.extend_from_slice(&params.parallelism.to_le_bytes());
    bytes.extend_from_slice(&salt);
    bytes.extend_from_slice(&sealed);

    Ok(SecuredKey {
        wrapped: WrappedKey(bytes),
        data_key,
    })
}

/// Recover the data key sealed in `wrapped`.
///
/// A wrong passphrase, a malformed header, and a tampered key all surface
/// as the same [`KeywardenError::Decryption`].
pub fn unlock_secured_key(
    wrapped: &WrappedKey,
    passphrase: &SecretString,
) -> Result<DataKey, KeywardenError> {
    let (params, salt, sealed) = wrapped.parts().ok_or(KeywardenError::Decryption)?;
    if !params.within_stored_bounds() {
        return Err(KeywardenError::Decryption);
    }

    let wrapping_key = kdf::derive_key(passphrase.expose_secret().as_bytes(), &salt, params)
        .map_err(|_| KeywardenError::Decryption)?;
    let key_bytes = Zeroizing::new(crypto::decrypt(sealed, &wrapping_key)?);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    if key_bytes.len() != KEY_LEN {
        return Err(KeywardenError::Decryption);
    }
    key.copy_from_slice(&key_bytes);
    Ok(DataKey(key))
}
