//! Registration handlers.

use crate::{
    api::handlers::events::parse_event_id,
    auth::middleware::AuthUser,
    types::{AppError, MessageResponse, Registration, RegistrationsResponse, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

const REGISTER_FAILURE: &str = "Could not register user for event";

/// List every registration.
#[utoipa::path(
    get,
    path = "/registrations",
    responses(
        (status = 200, description = "All registrations", body = RegistrationsResponse),
        (status = 500, description = "Could not fetch registrations")
    ),
    tag = "registrations"
)]
pub async fn list_registrations(
    State(state): State<AppState>,
) -> Result<Json<RegistrationsResponse>> {
    let registrations = state
        .store
        .list_registrations()
        .await
        .map_err(|e| e.with_failure_message("Could not fetch registrations"))?;

    Ok(Json(RegistrationsResponse {
        message: "Registrations fetched successfully".to_string(),
        registrations,
    }))
}

/// Get a single registration.
#[utoipa::path(
    get,
    path = "/registrations/{id}",
    params(("id" = i64, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "The registration", body = Registration),
        (status = 400, description = "Invalid registration Id"),
        (status = 500, description = "Registration not found or store failure")
    ),
    tag = "registrations"
)]
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Registration>> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::InvalidInput("Invalid registration Id".to_string()))?;

    let registration = state
        .store
        .get_registration(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Could not fetch registration".to_string()))?;

    Ok(Json(registration))
}

/// Register the caller for an event. Owners may register for their own events.
#[utoipa::path(
    post,
    path = "/events/{id}/register",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 201, description = "Registered", body = MessageResponse),
        (status = 400, description = "Invalid event Id"),
        (status = 401, description = "Not Authorized"),
        (status = 500, description = "Event not found or store failure")
    ),
    tag = "registrations",
    security(("token" = []))
)]
pub async fn register_for_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let event_id = parse_event_id(&id)?;

    let registration = state
        .store
        .register(event_id, user.user_id)
        .await
        .map_err(|e| e.with_failure_message(REGISTER_FAILURE))?
        .ok_or_else(|| AppError::NotFound("Could not fetch event".to_string()))?;
    tracing::info!(
        registration_id = registration.id,
        event_id,
        user_id = user.user_id,
        "user registered for event"
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered for event successfully")),
    ))
}

/// Cancel the caller's registrations for an event.
///
/// Succeeds even when there was nothing to cancel.
#[utoipa::path(
    delete,
    path = "/events/{id}/register",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Cancelled", body = MessageResponse),
        (status = 400, description = "Invalid event Id"),
        (status = 401, description = "Not Authorized"),
        (status = 500, description = "Could not register user for event")
    ),
    tag = "registrations",
    security(("token" = []))
)]
pub async fn cancel_registration(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let event_id = parse_event_id(&id)?;

    let removed = state
        .store
        .cancel_registration(event_id, user.user_id)
        .await
        .map_err(|e| e.with_failure_message(REGISTER_FAILURE))?;
    tracing::debug!(event_id, user_id = user.user_id, removed, "registration cancelled");

    Ok(Json(MessageResponse::new(
        "Registration for event cancelled successfully",
    )))
}
