// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from a passphrase.

use keywarden_config::validation::{
    MAX_KDF_ITERATIONS, MAX_KDF_MEMORY_COST, MAX_KDF_PARALLELISM,
};
use keywarden_config::VaultConfig;
use keywarden_core::KeywardenError;
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN};

/// Salt length for Argon2id.
pub const SALT_LEN: usize = 16;

/// Highest memory cost accepted from stored data (4 GiB).
pub(crate) const MAX_STORED_MEMORY_COST: u32 = 4 * MAX_KDF_MEMORY_COST;
/// Highest pass count accepted from stored data.
pub(crate) const MAX_STORED_ITERATIONS: u32 = 10 * MAX_KDF_ITERATIONS;
/// Highest lane count accepted from stored data.
pub(crate) const MAX_STORED_PARALLELISM: u32 = 10 * MAX_KDF_PARALLELISM;

/// Argon2id cost parameters, persisted inside every wrapped key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&VaultConfig> for KdfParams {
    fn from(config: &VaultConfig) -> Self {
        Self {
            memory_cost: config.kdf_memory_cost,
            iterations: config.kdf_iterations,
            parallelism: config.kdf_parallelism,
        }
    }
}

impl KdfParams {
    /// Whether parameters read back from storage are cheap enough to run.
    ///
    /// Stored headers and PHC strings are untrusted, so the work they demand
    /// is bounded.
    pub(crate) fn within_stored_bounds(self) -> bool {
        self.memory_cost <= MAX_STORED_MEMORY_COST
            && self.iterations <= MAX_STORED_ITERATIONS
            && self.parallelism <= MAX_STORED_PARALLELISM
    }

    pub(crate) fn to_argon2(self) -> Result<argon2::Params, argon2::Error> {
        argon2::Params::new(
            self.memory_cost,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
    }
}

/// Derive a 32-byte key from `passphrase` using Argon2id.
///
/// The result is wrapped in [`Zeroizing`] and wiped on drop.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, KeywardenError> {
    let argon_params = params
        .to_argon2()
        .map_err(|e| KeywardenError::Config(format!("invalid Argon2id parameters: {e}")))?;
    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase, salt, output.as_mut())
        .map_err(|e| KeywardenError::Internal(format!("Argon2id key derivation failed: {e}")))?;

    Ok(output)
}

/// Generate a random salt for Argon2id.
pub fn generate_salt() -> Result<[u8; SALT_LEN], KeywardenError> {
    crypto::random_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: KdfParams = KdfParams {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
    };

    #[test]
    fn derive_key_is_deterministic() {
        let salt = [1u8; SALT_LEN];
        let key1 = derive_key(b"alpha", &salt, FAST).unwrap();
        let key2 = derive_key(b"alpha", &salt, FAST).unwrap();
        assert_eq!(*key1, *key2);
    }

    #[test]
    fn different_passphrase_different_key() {
        let salt = [2u8; SALT_LEN];
        let key1 = derive_key(b"alpha", &salt, FAST).unwrap();
        let key2 = derive_key(b"beta", &salt, FAST).unwrap();
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn different_salt_different_key() {
        let key1 = derive_key(b"alpha", &[1u8; SALT_LEN], FAST).unwrap();
        let key2 = derive_key(b"alpha", &[2u8; SALT_LEN], FAST).unwrap();
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn zero_memory_cost_is_rejected() {
        let params = KdfParams {
            memory_cost: 0,
            ..FAST
        };
        assert!(matches!(
            derive_key(b"alpha", &[0u8; SALT_LEN], params),
            Err(KeywardenError::Config(_))
        ));
    }

    #[test]
    fn params_follow_vault_config() {
        let config = VaultConfig::default();
        let params = KdfParams::from(&config);
        assert_eq!(params.memory_cost, 65536);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 4);
    }
}
