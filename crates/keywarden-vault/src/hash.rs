// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-way Argon2id hashes (PHC strings) of the master passphrase and of
//! token login keys.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use keywarden_config::VaultConfig;
use keywarden_core::KeywardenError;
use secrecy::{ExposeSecret, SecretString};

use crate::crypto;
use crate::kdf::{KdfParams, SALT_LEN};

/// Hash `secret` into a PHC string with a random salt.
pub fn hash_secret(secret: &SecretString, config: &VaultConfig) -> Result<String, KeywardenError> {
    let salt_bytes: [u8; SALT_LEN] = crypto::random_bytes()?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| KeywardenError::Internal(format!("failed to encode salt: {e}")))?;

    let params = KdfParams::from(config)
        .to_argon2()
        .map_err(|e| KeywardenError::Config(format!("invalid Argon2id parameters: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let hash = argon2
        .hash_password(secret.expose_secret().as_bytes(), &salt)
        .map_err(|e| KeywardenError::Internal(format!("Argon2id hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Check `secret` against a PHC string produced by [`hash_secret`].
///
/// A malformed hash, or one whose cost parameters exceed what the vault
/// would ever write, verifies as `false`.
pub fn verify_secret(secret: &SecretString, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    let affordable = argon2::Params::try_from(&parsed).is_ok_and(|params| {
        KdfParams {
            memory_cost: params.m_cost(),
            iterations: params.t_cost(),
            parallelism: params.p_cost(),
        }
        .within_stored_bounds()
    });
    affordable
        && Argon2::default()
            .verify_password(secret.expose_secret().as_bytes(), &parsed)
            .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> VaultConfig {
        VaultConfig {
            kdf_memory_cost: 1024,
            kdf_iterations: 1,
            kdf_parallelism: 1,
            ..VaultConfig::default()
        }
    }

    #[test]
    fn hash_verifies_only_the_original_secret() {
        let hash = hash_secret(&SecretString::from("alpha".to_string()), &fast_config()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_secret(&SecretString::from("alpha".to_string()), &hash));
        assert!(!verify_secret(&SecretString::from("beta".to_string()), &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let secret = SecretString::from("alpha".to_string());
        let h1 = hash_secret(&secret, &fast_config()).unwrap();
        let h2 = hash_secret(&secret, &fast_config()).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn hash_demanding_runaway_passes_does_not_verify() {
        let hash = hash_secret(&SecretString::from("alpha".to_string()), &fast_config()).unwrap();
        let tampered = hash.replace(",t=1,", ",t=4294967295,");
        assert_ne!(tampered, hash);
        assert!(!verify_secret(&SecretString::from("alpha".to_string()), &tampered));
    }

    #[test]
    fn garbage_hash_does_not_verify() {
        assert!(!verify_secret(&SecretString::from("alpha".to_string()), "not-a-phc"));
    }
}
