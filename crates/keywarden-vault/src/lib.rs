// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope encryption for stored secrets.
//!
//! Every secret gets its own random data key. The data key encrypts the
//! secret with AES-256-GCM and is itself sealed under a key derived from the
//! master passphrase via Argon2id. Only the sealed ("wrapped") data key is
//! persisted next to the ciphertext, so a leaked data key exposes exactly one
//! record and nothing about the passphrase.

pub mod container;
pub mod crypto;
pub mod envelope;
pub mod hash;
pub mod kdf;
pub mod legacy;
pub mod record;

pub use container::VaultContainer;
pub use envelope::{make_secured_key, unlock_secured_key, DataKey, SecuredKey, WrappedKey};
pub use hash::{hash_secret, verify_secret};
pub use record::RecordCodec;
