// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway routes driven through the router without a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use keywarden_config::RotationConfig;
use keywarden_core::{SecretStore, StoreKind};
use keywarden_gateway::{build_router, GatewayState};
use keywarden_rotation::RotationManager;
use keywarden_test_utils::{
    fast_codec, fast_vault_config, pass, seed_secrets, MemoryHashStore, MemorySecretStore,
};
use keywarden_vault::hash_secret;
use serde_json::{json, Value};
use tower::ServiceExt;

struct App {
    router: axum::Router,
    manager: RotationManager,
}

async fn app_with_accounts(count: usize) -> App {
    let hash = hash_secret(&pass("alpha"), &fast_vault_config()).unwrap();
    let accounts = Arc::new(MemorySecretStore::new(StoreKind::Accounts));
    let names: Vec<String> = (0..count).map(|i| format!("acct-{i}")).collect();
    let secrets: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "s3cret")).collect();
    seed_secrets(&accounts, &pass("alpha"), None, &secrets)
        .await
        .unwrap();
    let manager = RotationManager::new(
        fast_codec(),
        RotationConfig {
            progress_interval: 1,
            ..RotationConfig::default()
        },
        vec![accounts as Arc<dyn SecretStore>],
        Arc::new(MemoryHashStore::with_hash(hash)),
    );
    App {
        router: build_router(GatewayState::new(manager.clone())),
        manager,
    }
}

async fn send(app: &App, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn start(old: &str, new: &str) -> Request<Body> {
    Request::post("/v1/rotations")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "old_passphrase": old, "new_passphrase": new }).to_string(),
        ))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_idle_manager() {
    let app = app_with_accounts(1).await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["rotation_running"], false);
}

#[tokio::test]
async fn start_then_stream_until_end() {
    let app = app_with_accounts(3).await;
    let (status, body) = send(&app, start("alpha", "beta")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = serde_json::from_slice::<Value>(&body).unwrap()["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = send(&app, get(&format!("/v1/rotations/{job_id}/events"))).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    let events: Vec<Value> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();
    let last = events.last().unwrap();
    assert_eq!(last["end"], 1);
    assert_eq!(last["summary"]["ok_count"], 3);
    assert!(text.contains("event: end"));

    let (status, body) = send(&app, get(&format!("/v1/rotations/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["state"], "completed");
    assert_eq!(body["processed"], 3);
}

#[tokio::test]
async fn wrong_old_passphrase_is_forbidden() {
    let app = app_with_accounts(1).await;
    let (status, body) = send(&app, start("wrong", "beta")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("does not match"));
    assert!(!app.manager.is_busy());
}

#[tokio::test]
async fn empty_store_is_unprocessable() {
    let app = app_with_accounts(0).await;
    let (status, _) = send(&app, start("alpha", "beta")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_and_malformed_jobs_are_not_found() {
    let app = app_with_accounts(1).await;
    let unknown = keywarden_rotation::JobId::new();
    for uri in [
        format!("/v1/rotations/{unknown}"),
        format!("/v1/rotations/{unknown}/events"),
        "/v1/rotations/not-a-job".to_string(),
    ] {
        let (status, _) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }

    let delete = Request::delete(format!("/v1/rotations/{unknown}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = app_with_accounts(1).await;
    let request = Request::post("/v1/rotations")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"old_passphrase":"alpha"}"#))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert!(status.is_client_error());
}
