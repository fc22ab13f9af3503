// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the secret-bearing tables.

use keywarden_core::{RecordId, SecretRecord};

/// A live account and its protected password.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: RecordId,
    pub name: String,
    pub login: String,
    pub record: SecretRecord,
    pub created_at: String,
    pub updated_at: String,
}

/// A snapshot of an account taken before it was edited.
#[derive(Debug, Clone)]
pub struct AccountHistoryEntry {
    pub id: RecordId,
    pub account_id: RecordId,
    pub name: String,
    pub login: String,
    pub record: SecretRecord,
    /// Hash of the master passphrase the snapshot's record is protected under.
    pub master_pass_hash: String,
    pub created_at: String,
}
