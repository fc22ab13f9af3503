// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token values and the secure payload attached to protected tokens.

use keywarden_config::VaultConfig;
use keywarden_core::{KeywardenError, RecordId};
use keywarden_vault::crypto::random_bytes;
use keywarden_vault::{hash_secret, VaultContainer};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy::ActionKind;

/// Length in bytes of a raw token value before hex encoding.
pub const TOKEN_BYTES: usize = 32;

/// What a caller asks for when issuing a token.
pub struct TokenRequest {
    pub user_id: i64,
    pub action: ActionKind,
    /// The user's login key; only its hash is ever stored.
    pub login_key: SecretString,
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("user_id", &self.user_id)
            .field("action", &self.action)
            .field("login_key", &"[REDACTED]")
            .finish()
    }
}

/// Payload sealed inside a token's vault container.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecureData {
    pub login_key_hash: String,
    pub token: String,
}

impl std::fmt::Debug for TokenSecureData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSecureData")
            .field("login_key_hash", &self.login_key_hash)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// A persisted authorization token.
#[derive(Clone)]
pub struct AuthTokenModel {
    /// Row id; `None` until first persisted.
    pub id: Option<RecordId>,
    pub user_id: i64,
    pub action: ActionKind,
    /// Hex-encoded random token value.
    pub token: String,
    /// Present only for actions in a secured group.
    pub vault: Option<VaultContainer>,
    /// One-way hash of the login key; present exactly when `vault` is.
    pub hash: Option<String>,
    pub created_at: String,
}

impl AuthTokenModel {
    /// Open the secure payload under the master passphrase.
    pub fn secure_data(
        &self,
        passphrase: &SecretString,
    ) -> Result<Option<TokenSecureData>, KeywardenError> {
        self.vault
            .as_ref()
            .map(|vault| vault.open::<TokenSecureData>(passphrase))
            .transpose()
    }
}

impl std::fmt::Debug for AuthTokenModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokenModel")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("action", &self.action)
            .field("token", &"[REDACTED]")
            .field("vault", &self.vault)
            .field("has_hash", &self.hash.is_some())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// A fresh hex-encoded token value from the system CSPRNG.
pub fn generate_token_value() -> Result<String, KeywardenError> {
    let bytes: [u8; TOKEN_BYTES] = random_bytes()?;
    Ok(hex::encode(bytes))
}

/// Build a token for `request`, protected according to its action's policy.
///
/// The returned model is not persisted and carries no id; callers keep
/// `token`, `vault` and `hash` together when writing it.
pub fn issue_or_refresh(
    request: &TokenRequest,
    passphrase: &SecretString,
    config: &VaultConfig,
) -> Result<AuthTokenModel, KeywardenError> {
    let token = generate_token_value()?;

    let (vault, hash) = if request.action.needs_vault() {
        let login_key_hash = hash_secret(&request.login_key, config)?;
        let secure = TokenSecureData {
            login_key_hash: login_key_hash.clone(),
            token: token.clone(),
        };
        let vault = VaultContainer::save(passphrase, &secure, config)?;
        (Some(vault), Some(login_key_hash))
    } else {
        (None, None)
    };

    debug!(
        user_id = request.user_id,
        action = %request.action,
        secured = vault.is_some(),
        "token built"
    );

    Ok(AuthTokenModel {
        id: None,
        user_id: request.user_id,
        action: request.action,
        token,
        vault,
        hash,
        created_at: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keywarden_vault::verify_secret;
    use strum::IntoEnumIterator;

    fn fast_config() -> VaultConfig {
        VaultConfig {
            kdf_memory_cost: 1024,
            kdf_iterations: 1,
            kdf_parallelism: 1,
            ..VaultConfig::default()
        }
    }

    fn pass(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn request(action: ActionKind) -> TokenRequest {
        TokenRequest {
            user_id: 7,
            action,
            login_key: pass("login-key"),
        }
    }

    #[test]
    fn token_value_is_32_random_bytes() {
        let a = generate_token_value().unwrap();
        let b = generate_token_value().unwrap();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn every_action_follows_its_policy() {
        let config = fast_config();
        for action in ActionKind::iter() {
            let model = issue_or_refresh(&request(action), &pass("alpha"), &config).unwrap();
            if action.needs_vault() {
                let hash = model.hash.clone().expect("secured tokens carry a hash");
                let secure = model.secure_data(&pass("alpha")).unwrap().unwrap();
                assert_eq!(secure.login_key_hash, hash);
                assert_eq!(secure.token, model.token);
                assert!(verify_secret(&pass("login-key"), &hash));
            } else {
                assert!(model.vault.is_none(), "{action}");
                assert!(model.hash.is_none(), "{action}");
            }
        }
    }

    #[test]
    fn secure_data_needs_the_master_passphrase() {
        let model =
            issue_or_refresh(&request(ActionKind::AccountViewPass), &pass("alpha"), &fast_config())
                .unwrap();
        assert!(matches!(
            model.secure_data(&pass("beta")),
            Err(KeywardenError::Decryption)
        ));
    }

    #[test]
    fn debug_hides_token_value() {
        let model =
            issue_or_refresh(&request(ActionKind::TagView), &pass("alpha"), &fast_config()).unwrap();
        let debug = format!("{model:?}");
        assert!(!debug.contains(&model.token));
    }
}
