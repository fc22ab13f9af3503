// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account-secret codec producing the `(ciphertext, wrapped_key)` pair
//! persisted per secret.

use keywarden_config::VaultConfig;
use keywarden_core::{CipherFormat, KeywardenError, SecretRecord};
use secrecy::SecretString;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto;
use crate::envelope::{self, WrappedKey};
use crate::legacy;

/// Protects and reveals single secrets under a master passphrase.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    config: VaultConfig,
}

impl RecordCodec {
    pub fn new(config: VaultConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Encrypt `secret` under a fresh data key wrapped by `passphrase`.
    ///
    /// Two calls with the same inputs never produce the same record.
    pub fn protect(
        &self,
        secret: &str,
        passphrase: &SecretString,
    ) -> Result<SecretRecord, KeywardenError> {
        self.protect_bytes(secret.as_bytes(), passphrase)
    }

    /// Byte-level form of [`protect`](Self::protect), shared with vault containers.
    pub fn protect_bytes(
        &self,
        plaintext: &[u8],
        passphrase: &SecretString,
    ) -> Result<SecretRecord, KeywardenError> {
        let secured = envelope::make_secured_key(passphrase, &self.config)?;
        let ciphertext = crypto::encrypt(plaintext, secured.data_key().as_bytes())?;
        let record = SecretRecord::new(ciphertext, secured.into_wrapped().into_bytes());
        self.check_bounds(&record)?;
        Ok(record)
    }

    /// Decrypt a current-format record back to its secret string.
    pub fn reveal(
        &self,
        record: &SecretRecord,
        passphrase: &SecretString,
    ) -> Result<SecretString, KeywardenError> {
        let plaintext = self.reveal_bytes(record, passphrase)?;
        let value = String::from_utf8(plaintext.to_vec()).map_err(|_| KeywardenError::Decryption)?;
        Ok(SecretString::from(value))
    }

    /// Byte-level form of [`reveal`](Self::reveal).
    ///
    /// Legacy records are refused; only [`reencrypt`](Self::reencrypt) reads them.
    pub fn reveal_bytes(
        &self,
        record: &SecretRecord,
        passphrase: &SecretString,
    ) -> Result<Zeroizing<Vec<u8>>, KeywardenError> {
        match record.format {
            CipherFormat::Current => open_current(record, passphrase),
            CipherFormat::Legacy => Err(KeywardenError::LegacyFormat),
        }
    }

    /// Re-protect a record from `old_passphrase` to `new_passphrase`.
    ///
    /// Accepts both cipher formats and always yields a current-format record.
    /// Legacy plaintext must pass [`legacy::plausible_plaintext`], the only
    /// check available for an unauthenticated ciphertext.
    pub fn reencrypt(
        &self,
        record: &SecretRecord,
        old_passphrase: &SecretString,
        new_passphrase: &SecretString,
    ) -> Result<SecretRecord, KeywardenError> {
        let plaintext = match record.format {
            CipherFormat::Current => open_current(record, old_passphrase)?,
            CipherFormat::Legacy => {
                let plaintext =
                    legacy::legacy_decrypt(&record.ciphertext, &record.wrapped_key, old_passphrase)?;
                if !legacy::plausible_plaintext(&plaintext) {
                    return Err(KeywardenError::Decryption);
                }
                debug!("upgrading legacy record to envelope format");
                plaintext
            }
        };
        self.protect_bytes(&plaintext, new_passphrase)
    }

    fn check_bounds(&self, record: &SecretRecord) -> Result<(), KeywardenError> {
        let max = self.config.max_field_bytes;
        for (field, size) in [
            ("ciphertext", record.ciphertext.len()),
            ("wrapped_key", record.wrapped_key.len()),
        ] {
            if size > max {
                return Err(KeywardenError::PayloadTooLarge { field, size, max });
            }
        }
        Ok(())
    }
}

fn open_current(
    record: &SecretRecord,
    passphrase: &SecretString,
) -> Result<Zeroizing<Vec<u8>>, KeywardenError> {
    let wrapped = WrappedKey::from_bytes(record.wrapped_key.clone());
    let data_key = envelope::unlock_secured_key(&wrapped, passphrase)?;
    Ok(Zeroizing::new(crypto::decrypt(
        &record.ciphertext,
        data_key.as_bytes(),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn codec() -> RecordCodec {
        RecordCodec::new(VaultConfig {
            kdf_memory_cost: 1024,
            kdf_iterations: 1,
            kdf_parallelism: 1,
            ..VaultConfig::default()
        })
    }

    fn pass(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn protect_reveal_scenario() {
        let codec = codec();
        let record = codec.protect("S3cr3t!", &pass("alpha")).unwrap();

        let revealed = codec.reveal(&record, &pass("alpha")).unwrap();
        assert_eq!(revealed.expose_secret(), "S3cr3t!");

        let wrong = codec.reveal(&record, &pass("beta"));
        assert!(matches!(wrong, Err(KeywardenError::Decryption)));
    }

    #[test]
    fn protect_is_non_deterministic() {
        let codec = codec();
        let a = codec.protect("same", &pass("alpha")).unwrap();
        let b = codec.protect("same", &pass("alpha")).unwrap();
        assert_ne!(a, b);
        assert_eq!(codec.reveal(&a, &pass("alpha")).unwrap().expose_secret(), "same");
        assert_eq!(codec.reveal(&b, &pass("alpha")).unwrap().expose_secret(), "same");
    }

    #[test]
    fn oversized_secret_is_rejected() {
        let codec = RecordCodec::new(VaultConfig {
            kdf_memory_cost: 1024,
            kdf_iterations: 1,
            kdf_parallelism: 1,
            max_field_bytes: 128,
        });
        let secret = "x".repeat(200);
        let result = codec.protect(&secret, &pass("alpha"));
        assert!(matches!(
            result,
            Err(KeywardenError::PayloadTooLarge {
                field: "ciphertext",
                ..
            })
        ));
    }

    #[test]
    fn swapping_wrapped_keys_between_records_fails() {
        let codec = codec();
        let a = codec.protect("first", &pass("alpha")).unwrap();
        let b = codec.protect("second", &pass("alpha")).unwrap();
        let mixed = SecretRecord::new(a.ciphertext.clone(), b.wrapped_key.clone());
        assert!(matches!(
            codec.reveal(&mixed, &pass("alpha")),
            Err(KeywardenError::Decryption)
        ));
    }

    #[test]
    fn reveal_refuses_legacy_records() {
        let codec = codec();
        let (ct, iv) = legacy::legacy_encrypt(b"old", &pass("alpha")).unwrap();
        let record = SecretRecord::legacy(ct, iv.to_vec());
        assert!(matches!(
            codec.reveal(&record, &pass("alpha")),
            Err(KeywardenError::LegacyFormat)
        ));
    }

    #[test]
    fn reencrypt_upgrades_legacy_records() {
        let codec = codec();
        let (ct, iv) = legacy::legacy_encrypt(b"old secret", &pass("alpha")).unwrap();
        let record = SecretRecord::legacy(ct, iv.to_vec());

        let upgraded = codec.reencrypt(&record, &pass("alpha"), &pass("beta")).unwrap();
        assert_eq!(upgraded.format, CipherFormat::Current);
        assert_eq!(
            codec.reveal(&upgraded, &pass("beta")).unwrap().expose_secret(),
            "old secret"
        );
    }

    #[test]
    fn reencrypt_legacy_with_wrong_passphrase_fails() {
        let codec = codec();
        let (ct, iv) =
            legacy::legacy_encrypt(b"correct horse battery staple", &pass("alpha")).unwrap();
        let record = SecretRecord::legacy(ct, iv.to_vec());
        assert!(matches!(
            codec.reencrypt(&record, &pass("gamma"), &pass("beta")),
            Err(KeywardenError::Decryption)
        ));
    }

    #[test]
    fn reencrypt_moves_record_to_new_passphrase() {
        let codec = codec();
        let record = codec.protect("S3cr3t!", &pass("alpha")).unwrap();
        let rotated = codec.reencrypt(&record, &pass("alpha"), &pass("beta")).unwrap();

        assert_eq!(codec.reveal(&rotated, &pass("beta")).unwrap().expose_secret(), "S3cr3t!");
        assert!(codec.reveal(&rotated, &pass("alpha")).is_err());
    }

    #[test]
    fn reencrypt_with_wrong_old_passphrase_fails() {
        let codec = codec();
        let record = codec.protect("S3cr3t!", &pass("alpha")).unwrap();
        assert!(matches!(
            codec.reencrypt(&record, &pass("gamma"), &pass("beta")),
            Err(KeywardenError::Decryption)
        ));
    }
}
