//! Test utilities and fixtures for donation relay integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub use donation_relay::crypto::hash_secret;
pub use donation_relay::licensing::Licensing;
pub use donation_relay::middleware::AdminCredential;
pub use donation_relay::models::*;
pub use donation_relay::store::{AppState, JsonFileStore, LicenseStore, MemoryStore, StoreError};
pub use donation_relay::tenants::TenantDirectory;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const TENANT_ID: &str = "game1";
pub const TENANT_PASSWORD: &str = "game1-password";

/// Tenant `game1` owning `music_license_key`.
pub fn test_tenants(music_license_key: Option<&str>) -> TenantDirectory {
    TenantDirectory::new(vec![Tenant {
        id: TENANT_ID.to_string(),
        name: "Game 1".to_string(),
        universe_id: Some("universe-1".to_string()),
        password_hash: hash_secret(TENANT_PASSWORD),
        music_license_key: music_license_key.map(String::from),
    }])
}

pub fn tenant_credential() -> String {
    format!("{}:{}", TENANT_ID, TENANT_PASSWORD)
}

/// App state over an arbitrary store.
pub fn create_app_state_with(store: Arc<dyn LicenseStore>, tenants: TenantDirectory) -> AppState {
    AppState {
        licensing: Arc::new(Licensing::new(store, "TEST")),
        tenants: Arc::new(tenants),
        admin: AdminCredential::new(Some(ADMIN_TOKEN)),
    }
}

/// App state over an in-memory store with no tenants.
pub fn create_test_app_state() -> AppState {
    create_app_state_with(Arc::new(MemoryStore::default()), TenantDirectory::default())
}

/// App state over a JSON file inside a fresh temp dir. Keep the dir alive.
pub fn create_file_app_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = JsonFileStore::new(dir.path().join("licenses.json"), "1.0.0");
    (
        create_app_state_with(Arc::new(store), TenantDirectory::default()),
        dir,
    )
}

pub fn test_app(state: AppState) -> Router {
    donation_relay::app(state)
}

/// Issue a license straight through the engine.
pub fn issue_test_license(state: &AppState, expiry_days: Option<i64>) -> String {
    state
        .licensing
        .issue(&IssueLicense {
            owner: Some("Test Owner".to_string()),
            expiry_days,
            notes: None,
        })
        .expect("Failed to issue test license")
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("Response should be valid JSON")
    };
    (status, json)
}

pub fn json_post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

pub fn admin_post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", ADMIN_TOKEN))
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

pub fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", ADMIN_TOKEN))
        .body(Body::empty())
        .unwrap()
}

pub async fn verify(app: &Router, key: &str, tenant: &str) -> (StatusCode, Value) {
    send(
        app,
        json_post(
            "/api/verify",
            &serde_json::json!({ "licenseKey": key, "tenantIdentifier": tenant }),
        ),
    )
    .await
}
