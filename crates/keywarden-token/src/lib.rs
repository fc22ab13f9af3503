// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization tokens and the policy deciding which of them carry a
//! vault-protected payload.

pub mod policy;
pub mod service;
pub mod token;

pub use policy::{can_use_secure_token_action, is_secured_action, ActionKind, PolicyGroup};
pub use service::{TokenService, TokenStore};
pub use token::{generate_token_value, issue_or_refresh, AuthTokenModel, TokenRequest, TokenSecureData};
