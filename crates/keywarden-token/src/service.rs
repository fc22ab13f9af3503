// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token issuance and refresh against a persistence backend.

use std::sync::Arc;

use async_trait::async_trait;
use keywarden_config::VaultConfig;
use keywarden_core::{KeywardenError, RecordId};
use secrecy::SecretString;
use tracing::info;

use crate::token::{issue_or_refresh, AuthTokenModel, TokenRequest};

/// Persistence seam for authorization tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The token for a user and action, if one was issued.
    async fn find_token(
        &self,
        user_id: i64,
        action: &str,
    ) -> Result<Option<AuthTokenModel>, KeywardenError>;

    /// Insert a new token and return its row id.
    async fn insert_token(&self, token: &AuthTokenModel) -> Result<RecordId, KeywardenError>;

    /// Replace the token value, vault and hash of an existing row as a unit.
    async fn replace_token(
        &self,
        id: RecordId,
        token: &AuthTokenModel,
    ) -> Result<(), KeywardenError>;
}

/// Issues and refreshes tokens, keeping value, vault and hash in lockstep.
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    config: VaultConfig,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>, config: VaultConfig) -> Self {
        Self { store, config }
    }

    /// Issue a token for `request`, refreshing any existing one for the same
    /// user and action.
    pub async fn issue(
        &self,
        request: &TokenRequest,
        passphrase: &SecretString,
    ) -> Result<AuthTokenModel, KeywardenError> {
        let existing = self
            .store
            .find_token(request.user_id, &request.action.to_string())
            .await?;
        match existing.and_then(|t| t.id) {
            Some(id) => self.refresh(id, request, passphrase).await,
            None => {
                let mut model = issue_or_refresh(request, passphrase, &self.config)?;
                let id = self.store.insert_token(&model).await?;
                model.id = Some(id);
                info!(token_id = %id, action = %request.action, "token issued");
                Ok(model)
            }
        }
    }

    /// Regenerate the token value and rebuild its vault under `passphrase`.
    pub async fn refresh(
        &self,
        id: RecordId,
        request: &TokenRequest,
        passphrase: &SecretString,
    ) -> Result<AuthTokenModel, KeywardenError> {
        let mut model = issue_or_refresh(request, passphrase, &self.config)?;
        model.id = Some(id);
        self.store.replace_token(id, &model).await?;
        info!(token_id = %id, action = %request.action, "token refreshed");
        Ok(model)
    }
}
