// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Keywarden.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, typed queries for accounts, their
//! history snapshots, authorization tokens and vault metadata, and adapters
//! implementing the core persistence seams on top of them.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::{
    AccountSecrets, HistorySecrets, SqliteHashStore, SqliteTokenStore, TokenVaultSecrets,
};
pub use database::Database;
pub use models::{Account, AccountHistoryEntry};
