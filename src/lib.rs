//! # Evently - event management backend
//!
//! Users sign up, log in for a signed token, publish events and register for
//! events published by others. The interesting part is authorization: every
//! mutating route requires a valid token, and event updates and deletes are
//! only applied when the caller owns the event.
//!
//! ## Overview
//!
//! Evently can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `evently-server` binary
//! 2. **As a library** - Build the router yourself, e.g. in integration tests
//!
//! ### Library Example
//!
//! ```rust,ignore
//! use evently::{build_app, db::MemoryStore, utils::toml_config::EventlyConfig, AppState};
//! use std::sync::Arc;
//!
//! let state = AppState::new(
//!     EventlyConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     "a-signing-secret-of-at-least-32-bytes",
//! )?;
//! let app = build_app(state);
//! ```
//!
//! ## Modules
//!
//! - [`api`] - HTTP handlers, routes and the OpenAPI document
//! - [`auth`] - password hashing, tokens, authentication middleware
//! - [`db`] - the [`ResourceStore`](db::ResourceStore) trait and its backends
//! - [`types`] - resources, request/response bodies and [`AppError`]
//! - [`utils`] - `evently.toml` configuration
//! - [`cli`] - command-line parsing and terminal output

#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Credential hashing, tokens and middleware.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Resource stores (libsql, in-process).
pub mod db;
/// Core types (resources, requests, responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use db::{DatabaseProvider, ResourceStore};
pub use types::{AppError, Result};
pub use utils::toml_config::EventlyConfig;

use crate::api::handlers::health::health_check;
use crate::auth::{CredentialHasher, TokenService};
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;

/// Largest request body accepted, in bytes
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup, immutable afterwards
    pub config: Arc<EventlyConfig>,
    /// Users, events and registrations
    pub store: Arc<dyn ResourceStore>,
    /// Password hashing with the configured cost
    pub hasher: Arc<CredentialHasher>,
    /// Token issuing and verification with the process-wide secret
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Assemble state around an existing store and signing secret.
    pub fn new(config: EventlyConfig, store: Arc<dyn ResourceStore>, secret: &str) -> Result<Self> {
        let hasher = CredentialHasher::new(&config.auth.hashing)?;
        let tokens = TokenService::new(secret, config.auth.token_expiry)?;

        Ok(Self {
            config: Arc::new(config),
            store,
            hasher: Arc::new(hasher),
            tokens: Arc::new(tokens),
        })
    }

    /// Read the secret from the environment and open the configured store.
    pub async fn from_config(config: EventlyConfig) -> Result<Self> {
        let secret = config
            .jwt_secret()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let provider = DatabaseProvider::from_config(&config);
        tracing::info!(backend = provider_label(&provider), "opening resource store");
        let store = provider.create_store().await?;

        Self::new(config, store, &secret)
    }
}

fn provider_label(provider: &DatabaseProvider) -> &'static str {
    match provider {
        DatabaseProvider::Memory => "sqlite-memory",
        DatabaseProvider::SQLite { .. } => "sqlite-file",
        DatabaseProvider::Turso { .. } => "turso",
        DatabaseProvider::Process => "process-memory",
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(api::ApiDoc::openapi())
}

/// Full application router: resource routes, health, OpenAPI document and
/// request tracing.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(api::routes::create_router(state.tokens.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
