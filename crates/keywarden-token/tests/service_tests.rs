// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TokenService behavior against the in-memory token store.

use std::sync::Arc;

use keywarden_test_utils::{fast_vault_config, pass, MemoryTokenStore};
use keywarden_token::{ActionKind, TokenRequest, TokenService, TokenStore};

fn request(action: ActionKind) -> TokenRequest {
    TokenRequest {
        user_id: 3,
        action,
        login_key: pass("login-key"),
    }
}

#[tokio::test]
async fn first_issue_inserts_a_row() {
    let store = Arc::new(MemoryTokenStore::default());
    let service = TokenService::new(store.clone(), fast_vault_config());

    let token = service
        .issue(&request(ActionKind::AccountEditPass), &pass("alpha"))
        .await
        .unwrap();
    assert!(token.id.is_some());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn reissue_refreshes_value_and_vault_together() {
    let store = Arc::new(MemoryTokenStore::default());
    let service = TokenService::new(store.clone(), fast_vault_config());
    let req = request(ActionKind::AccountView);

    let first = service.issue(&req, &pass("alpha")).await.unwrap();
    let second = service.issue(&req, &pass("alpha")).await.unwrap();
    assert_eq!(store.len().await, 1);
    assert_eq!(first.id, second.id);
    assert_ne!(first.token, second.token);

    let stored = store
        .find_token(3, "account_view")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.token, second.token);
    let secure = stored.secure_data(&pass("alpha")).unwrap().unwrap();
    assert_eq!(secure.token, second.token);
    assert_eq!(Some(secure.login_key_hash), stored.hash);
}

#[tokio::test]
async fn unsecured_action_gets_bare_token() {
    let store = Arc::new(MemoryTokenStore::default());
    let service = TokenService::new(store.clone(), fast_vault_config());

    let token = service
        .issue(&request(ActionKind::CategoryDelete), &pass("alpha"))
        .await
        .unwrap();
    assert!(token.vault.is_none());
    assert!(token.hash.is_none());
    assert!(token.secure_data(&pass("alpha")).unwrap().is_none());
}
