// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keywarden.
//!
//! In-memory implementations of the persistence seams, a cheap KDF
//! configuration, and helpers for seeding protected records.

pub mod fixtures;
pub mod memory;

pub use fixtures::{corrupt, fast_codec, fast_vault_config, pass, seed_legacy, seed_secrets};
pub use memory::{MemoryHashStore, MemorySecretStore, MemoryTokenStore};
