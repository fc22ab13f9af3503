// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM encrypt/decrypt of opaque payloads under a raw key.
//!
//! Output layout is `nonce (12) || ciphertext || tag (16)`. Every call to
//! [`encrypt`] draws a fresh 96-bit nonce from the system CSPRNG; nonce reuse
//! would be catastrophic for GCM.

use keywarden_core::KeywardenError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

/// Raw AES-256 key length.
pub const KEY_LEN: usize = 32;

/// GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Bytes [`encrypt`] adds on top of the plaintext length.
pub const OVERHEAD: usize = NONCE_LEN + TAG_LEN;

/// Encrypt `plaintext` under `key`, returning `nonce || ciphertext || tag`.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>, KeywardenError> {
    let less_safe = aead_key(key)?;
    let nonce_bytes: [u8; NONCE_LEN] = random_bytes()?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| KeywardenError::Internal("AES-256-GCM encryption failed".to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + in_out.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&in_out);
    Ok(out)
}

/// Decrypt output of [`encrypt`].
///
/// Truncated input, a wrong key, and any flipped bit all fail the same way.
pub fn decrypt(ciphertext: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>, KeywardenError> {
    if ciphertext.len() < OVERHEAD {
        return Err(KeywardenError::Decryption);
    }
    let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| KeywardenError::Decryption)?;

    let less_safe = aead_key(key)?;
    let mut in_out = sealed.to_vec();
    let plaintext = less_safe
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| KeywardenError::Decryption)?;

    Ok(plaintext.to_vec())
}

/// Fill an `N`-byte array from the system CSPRNG.
///
/// There is no fallback source: if the OS generator fails, so does the caller.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], KeywardenError> {
    let mut buf = [0u8; N];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| KeywardenError::KeyGeneration("system randomness source unavailable".to_string()))?;
    Ok(buf)
}

fn aead_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, KeywardenError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| KeywardenError::Internal("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}
