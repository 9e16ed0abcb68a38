use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Resource Types =============

/// An event as persisted and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_time: DateTime<Utc>,
    /// Id of the user that created the event. Fixed at creation.
    pub owner_id: i64,
}

/// A user's registration for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
}

// ============= API Request/Response Types =============

/// Mutable fields of an event, used for both create and update.
///
/// Every field is required. Unknown fields in the body, including any attempt
/// to name an owner, are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_time: DateTime<Utc>,
}

impl EventDetails {
    /// Rejects blank text fields.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("name", &self.name),
            ("description", &self.description),
            ("location", &self.location),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(AppError::InvalidInput(format!("Field '{}' must not be empty", field)));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventCreatedResponse {
    pub message: String,
    pub event: Event,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationsResponse {
    pub message: String,
    pub registrations: Vec<Registration>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

// ============= Authentication Types =============

/// Claims carried by a signed access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub exp: usize,
    pub iat: usize,
}

// ============= Error Types =============

pub(crate) const NOT_AUTHORIZED: &str = "Not Authorized";
pub(crate) const INVALID_CREDENTIALS: &str = "Could not authenticate user";
const GENERIC_FAILURE: &str = "Something went wrong, try again later";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(String),

    /// Missing, invalid or expired token, or a caller that does not own the resource.
    #[error("Not authorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store failure reported to the caller with a fixed message.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        // Lookup misses and constraint violations are reported as server errors.
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, NOT_AUTHORIZED.to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string())
            }
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::Unavailable(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Database(ref detail)
            | AppError::Hashing(ref detail)
            | AppError::Token(ref detail)
            | AppError::Internal(ref detail) => {
                tracing::error!(error = %self, detail = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
        };

        let body = MessageResponse { message };

        (status, axum::Json(body)).into_response()
    }
}

impl AppError {
    /// Replaces a store or internal failure with a caller-facing message,
    /// logging the cause. Other errors pass through unchanged.
    pub fn with_failure_message(self, message: &str) -> AppError {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "store operation failed");
                AppError::Unavailable(message.to_string())
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
