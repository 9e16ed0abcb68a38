//! Shared helpers for integration tests

#![allow(dead_code)]

use axum_test::TestServer;
use evently::{
    build_app,
    db::{MemoryStore, ResourceStore, TursoClient},
    utils::toml_config::{EventlyConfig, HashingConfig},
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Which store backs the server under test
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Memory,
    Sqlite,
}

/// Default configuration with cheap hashing so tests stay fast
pub fn test_config() -> EventlyConfig {
    let mut config = EventlyConfig::default();
    config.auth.hashing = HashingConfig {
        memory_kib: 256,
        iterations: 1,
        parallelism: 1,
    };
    config
}

pub async fn create_store(backend: Backend) -> Arc<dyn ResourceStore> {
    match backend {
        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::Sqlite => Arc::new(
            TursoClient::new_memory()
                .await
                .expect("Failed to create in-memory database"),
        ),
    }
}

pub async fn create_test_state(backend: Backend) -> AppState {
    AppState::new(test_config(), create_store(backend).await, TEST_SECRET)
        .expect("Failed to build application state")
}

pub async fn create_test_server(backend: Backend) -> TestServer {
    let app = build_app(create_test_state(backend).await);
    TestServer::new(app).expect("Failed to create test server")
}

/// Sign up and log in, returning the issued token
pub async fn signup_and_login(server: &TestServer, email: &str, password: &str) -> String {
    let credentials = json!({ "email": email, "password": password });

    server
        .post("/signup")
        .json(&credentials)
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server.post("/login").json(&credentials).await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    body["token"]
        .as_str()
        .expect("login response carries a token")
        .to_string()
}

pub fn event_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "D",
        "location": "Hall",
        "dateTime": "2025-01-01T00:00:00Z"
    })
}

/// Create an event with `token` and return its id
pub async fn create_event(server: &TestServer, token: &str, name: &str) -> i64 {
    let response = server
        .post("/events")
        .add_header("Authorization", token.to_string())
        .json(&event_body(name))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    body["event"]["id"].as_i64().expect("created event has an id")
}
