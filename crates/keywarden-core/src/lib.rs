// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Keywarden.
//!
//! Defines the error taxonomy shared by every crate, the persisted shape of a
//! protected secret, and the storage traits the rotation pipeline drives.
//! Nothing in this crate performs cryptography.

pub mod error;
pub mod traits;
pub mod types;

pub use error::KeywardenError;
pub use traits::{PassphraseHashStore, SecretStore};
pub use types::{CipherFormat, RecordId, SecretRecord, StoreKind, StoredSecret};
