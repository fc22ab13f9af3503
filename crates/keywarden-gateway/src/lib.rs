// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for master-passphrase rotation.
//!
//! Routes:
//! - `GET /health`
//! - `POST /v1/rotations` start a job
//! - `GET /v1/rotations/{id}` job status
//! - `GET /v1/rotations/{id}/events` server-sent progress feed
//! - `DELETE /v1/rotations/{id}` cooperative cancel

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{build_router, start_server, GatewayState};
