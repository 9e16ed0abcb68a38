use crate::api::handlers::{events, registrations, users};
use crate::auth::{auth_middleware, TokenService};
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Resource routes. Public and protected methods may share a path; the token
/// check is attached to the protected methods only.
pub fn create_router(tokens: Arc<TokenService>) -> Router<AppState> {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/events", get(events::list_events))
        .route("/events/{id}", get(events::get_event))
        .route("/registrations", get(registrations::list_registrations))
        .route("/registrations/{id}", get(registrations::get_registration));

    let protected_routes = Router::new()
        // Protected routes (auth required)
        .route("/events", post(events::create_event))
        .route(
            "/events/{id}",
            put(events::update_event).delete(events::delete_event),
        )
        .route(
            "/events/{id}/register",
            post(registrations::register_for_event).delete(registrations::cancel_registration),
        )
        .route_layer(middleware::from_fn_with_state(tokens, auth_middleware));

    public_routes.merge(protected_routes)
}

