//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Evently, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Users
//! - `POST /signup` - Create an account
//! - `POST /login` - Exchange credentials for a token
//!
//! ## Events
//! - `GET /events` - List events
//! - `GET /events/{id}` - Get one event
//! - `POST /events` - Create an event (token)
//! - `PUT /events/{id}` - Update an event (token, owner)
//! - `DELETE /events/{id}` - Delete an event (token, owner)
//!
//! ## Registrations
//! - `GET /registrations` - List registrations
//! - `GET /registrations/{id}` - Get one registration
//! - `POST /events/{id}/register` - Register for an event (token)
//! - `DELETE /events/{id}/register` - Cancel registration (token)
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # Authentication
//!
//! Protected endpoints read the token from the `Authorization` header. The raw
//! token is expected; a `Bearer ` prefix is accepted too:
//! ```text
//! Authorization: <token>
//! ```
//!
//! # OpenAPI Documentation
//!
//! The generated document is served at `/api-docs/openapi.json`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    CredentialsRequest, Event, EventCreatedResponse, EventDetails, LoginResponse,
    MessageResponse, Registration, RegistrationsResponse,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI description of every route
#[derive(OpenApi)]
#[openapi(
    info(title = "Evently API", description = "Event management backend"),
    paths(
        handlers::health::health_check,
        handlers::users::signup,
        handlers::users::login,
        handlers::events::list_events,
        handlers::events::get_event,
        handlers::events::create_event,
        handlers::events::update_event,
        handlers::events::delete_event,
        handlers::registrations::list_registrations,
        handlers::registrations::get_registration,
        handlers::registrations::register_for_event,
        handlers::registrations::cancel_registration,
    ),
    components(schemas(
        CredentialsRequest,
        Event,
        EventCreatedResponse,
        EventDetails,
        LoginResponse,
        MessageResponse,
        Registration,
        RegistrationsResponse,
    )),
    modifiers(&TokenHeader),
    tags(
        (name = "users", description = "Signup and login"),
        (name = "events", description = "Event CRUD"),
        (name = "registrations", description = "Event registrations"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Declares the `Authorization` header token scheme referenced by protected paths
struct TokenHeader;

impl Modify for TokenHeader {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}
