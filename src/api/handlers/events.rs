//! Event handlers.
//!
//! Reads are public. Create requires a caller; update and delete additionally
//! require that the caller owns the event, checked inside the same store
//! operation that applies the change.

use crate::{
    auth::middleware::AuthUser,
    db::Ownership,
    types::{AppError, Event, EventCreatedResponse, EventDetails, MessageResponse, Result},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

const EVENT_NOT_FOUND: &str = "Could not fetch event, try again later";

/// Parse a path segment as an event id.
pub(crate) fn parse_event_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::InvalidInput("Invalid event Id".to_string()))
}

fn event_not_found() -> AppError {
    AppError::NotFound(EVENT_NOT_FOUND.to_string())
}

/// Unwrap and validate an event body.
fn event_details(
    payload: std::result::Result<Json<EventDetails>, JsonRejection>,
    parse_message: &str,
) -> Result<EventDetails> {
    let Json(details) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejecting event body");
        AppError::InvalidInput(parse_message.to_string())
    })?;
    details.validate()?;
    Ok(details)
}

/// Resolve an event and fail unless `user` owns it. Mutates nothing.
async fn ensure_owner(state: &AppState, id: i64, user: &AuthUser) -> Result<()> {
    let event = state.store.get_event(id).await?.ok_or_else(event_not_found)?;
    if event.owner_id != user.user_id {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn ownership_result(outcome: Ownership, id: i64, user: &AuthUser) -> Result<()> {
    match outcome {
        Ownership::Granted => Ok(()),
        Ownership::Missing => Err(event_not_found()),
        Ownership::NotOwner => {
            tracing::info!(event_id = id, user_id = user.user_id, "caller does not own event");
            Err(AppError::Unauthorized)
        }
    }
}

/// List every event.
#[utoipa::path(
    get,
    path = "/events",
    responses(
        (status = 200, description = "All events", body = Vec<Event>),
        (status = 500, description = "Store failure")
    ),
    tag = "events"
)]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>> {
    let events = state
        .store
        .list_events()
        .await
        .map_err(|e| e.with_failure_message("Could not fetch events, try again later"))?;
    Ok(Json(events))
}

/// Get a single event.
#[utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "The event", body = Event),
        (status = 400, description = "Invalid event Id"),
        (status = 500, description = "Event not found or store failure")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>> {
    let id = parse_event_id(&id)?;

    let event = state.store.get_event(id).await?.ok_or_else(event_not_found)?;

    Ok(Json(event))
}

/// Create an event owned by the caller.
///
/// Any owner field in the body is ignored.
#[utoipa::path(
    post,
    path = "/events",
    request_body = EventDetails,
    responses(
        (status = 201, description = "Event created", body = EventCreatedResponse),
        (status = 400, description = "Missing or malformed field"),
        (status = 401, description = "Not Authorized"),
        (status = 500, description = "Could not save event")
    ),
    tag = "events",
    security(("token" = []))
)]
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    payload: std::result::Result<Json<EventDetails>, JsonRejection>,
) -> Result<(StatusCode, Json<EventCreatedResponse>)> {
    let details = event_details(payload, "Could not parse request data.")?;

    let event = state
        .store
        .create_event(&details, user.user_id)
        .await
        .map_err(|e| e.with_failure_message("Could not save event, try again later"))?;
    tracing::info!(event_id = event.id, owner_id = event.owner_id, "event created");

    Ok((
        StatusCode::CREATED,
        Json(EventCreatedResponse {
            message: "Event created!".to_string(),
            event,
        }),
    ))
}

/// Replace the mutable fields of an event the caller owns.
///
/// A missing event or a foreign owner is reported before any body problem.
#[utoipa::path(
    put,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    request_body = EventDetails,
    responses(
        (status = 200, description = "Event updated", body = MessageResponse),
        (status = 400, description = "Invalid id or body"),
        (status = 401, description = "Not Authorized or not the owner"),
        (status = 500, description = "Event not found or store failure")
    ),
    tag = "events",
    security(("token" = []))
)]
pub async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: std::result::Result<Json<EventDetails>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let id = parse_event_id(&id)?;

    let details = match event_details(payload, "Could not parse request") {
        Ok(details) => details,
        Err(body_error) => {
            ensure_owner(&state, id, &user).await?;
            return Err(body_error);
        }
    };

    let outcome = state
        .store
        .update_owned_event(id, user.user_id, &details)
        .await?;
    ownership_result(outcome, id, &user)?;

    Ok(Json(MessageResponse::new("Event updated successfully!")))
}

/// Delete an event the caller owns, along with its registrations.
#[utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 400, description = "Invalid event Id"),
        (status = 401, description = "Not Authorized or not the owner"),
        (status = 500, description = "Event not found or store failure")
    ),
    tag = "events",
    security(("token" = []))
)]
pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_event_id(&id)?;

    let outcome = state.store.delete_owned_event(id, user.user_id).await?;
    ownership_result(outcome, id, &user)?;
    tracing::info!(event_id = id, "event deleted");

    Ok(Json(MessageResponse::new("event deleted successfully")))
}
