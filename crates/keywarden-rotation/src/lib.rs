// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master-passphrase rotation.
//!
//! A rotation re-encrypts every stored secret from the old passphrase to the
//! new one, store by store (live accounts, history snapshots, token vaults),
//! one record at a time. Per-record failures are collected, never thrown, so
//! a bad record cannot stop the batch. Progress is published to an
//! append-only feed that any number of observers can replay and follow.

pub mod job;
pub mod manager;
pub mod pipeline;
pub mod progress;

pub use job::{JobId, JobState, JobStatus, RotationRequest, RotationSummary, StageReport};
pub use manager::RotationManager;
pub use progress::{FeedSubscription, ProgressFeed, ProgressMessage, ProgressStats};
