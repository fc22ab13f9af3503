// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-envelope cipher format, readable only during an upgrade rotation.
//!
//! Legacy records were AES-256-CTR under `SHA-256(passphrase)` with a per-record
//! 16-byte IV stored in the key column. There is no authentication tag, so a
//! wrong passphrase yields garbage instead of an error; callers must validate
//! the plaintext shape themselves. Nothing writes this format any more.
//!
//! [`plausible_plaintext`] is a heuristic, not an integrity check. Garbage
//! passes it with probability of roughly 0.4 per byte, so a one or two byte
//! secret under the wrong key can still slip through and be re-protected as
//! noise. Rotation verifies the old passphrase against the master hash before
//! touching any record, which leaves only rows written under some other
//! passphrase exposed to this.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use keywarden_core::KeywardenError;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// IV length of the legacy scheme.
pub const LEGACY_IV_LEN: usize = 16;

fn legacy_key(passphrase: &SecretString) -> Zeroizing<[u8; 32]> {
    let digest = Sha256::digest(passphrase.expose_secret().as_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&digest);
    key
}

/// Decrypt a legacy ciphertext with its stored IV.
pub fn legacy_decrypt(
    ciphertext: &[u8],
    iv: &[u8],
    passphrase: &SecretString,
) -> Result<Zeroizing<Vec<u8>>, KeywardenError> {
    if iv.len() != LEGACY_IV_LEN {
        return Err(KeywardenError::Decryption);
    }
    let key = legacy_key(passphrase);
    let mut cipher = Ctr128BE::<Aes256>::new(key.as_slice().into(), iv.into());
    let mut buf = Zeroizing::new(ciphertext.to_vec());
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}

/// Whether decrypted legacy bytes look like a stored secret: UTF-8 text with
/// no control characters other than tab and line breaks.
pub fn plausible_plaintext(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_ok_and(|text| {
        text.chars()
            .all(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
    })
}

/// Produce a legacy `(ciphertext, iv)` pair. Fixture support only.
#[cfg(any(test, feature = "legacy-fixtures"))]
pub fn legacy_encrypt(
    plaintext: &[u8],
    passphrase: &SecretString,
) -> Result<(Vec<u8>, [u8; LEGACY_IV_LEN]), KeywardenError> {
    let iv: [u8; LEGACY_IV_LEN] = crate::crypto::random_bytes()?;
    let key = legacy_key(passphrase);
    let mut cipher = Ctr128BE::<Aes256>::new(key.as_slice().into(), iv.as_slice().into());
    let mut buf = plaintext.to_vec();
    cipher.apply_keystream(&mut buf);
    Ok((buf, iv))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn legacy_roundtrip() {
        let (ct, iv) = legacy_encrypt(b"old secret", &pass("alpha")).unwrap();
        let pt = legacy_decrypt(&ct, &iv, &pass("alpha")).unwrap();
        assert_eq!(pt.as_slice(), b"old secret");
    }

    #[test]
    fn wrong_passphrase_yields_garbage_not_error() {
        let (ct, iv) = legacy_encrypt(b"old secret", &pass("alpha")).unwrap();
        let pt = legacy_decrypt(&ct, &iv, &pass("beta")).unwrap();
        assert_ne!(pt.as_slice(), b"old secret");
    }

    #[test]
    fn plaintext_shape_check() {
        assert!(plausible_plaintext("pässwörd\twith tab".as_bytes()));
        assert!(!plausible_plaintext(b"bell\x07"));
        assert!(!plausible_plaintext(&[0xff, 0xfe, 0x41]));
    }

    #[test]
    fn bad_iv_length_is_rejected() {
        let result = legacy_decrypt(b"abc", &[0u8; 12], &pass("alpha"));
        assert!(matches!(result, Err(KeywardenError::Decryption)));
    }
}
