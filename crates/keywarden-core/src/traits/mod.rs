// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence seams implemented by storage backends.

pub mod store;

pub use store::{PassphraseHashStore, SecretStore};
