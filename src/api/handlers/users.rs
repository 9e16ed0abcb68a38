use crate::{
    types::{AppError, CredentialsRequest, LoginResponse, MessageResponse, Result},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

const PARSE_FAILURE: &str = "Could not parse request";

/// Unwrap a credentials body, rejecting blank fields.
fn credentials(
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<CredentialsRequest> {
    let Json(credentials) =
        payload.map_err(|_| AppError::InvalidInput(PARSE_FAILURE.to_string()))?;

    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(AppError::InvalidInput(PARSE_FAILURE.to_string()));
    }

    Ok(credentials)
}

/// Create a user account
#[utoipa::path(
    post,
    path = "/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Missing email or password"),
        (status = 500, description = "Email already taken or store failure")
    ),
    tag = "users"
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let CredentialsRequest { email, password } = credentials(payload)?;

    // CPU-bound, must not run on the async workers
    let hasher = state.hasher.clone();
    let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))??;

    let user_id = state.store.create_user(&email, &digest).await?;
    tracing::info!(user_id, "user created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

/// Exchange email and password for a token
#[utoipa::path(
    post,
    path = "/login",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Could not authenticate user")
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginResponse>)> {
    let CredentialsRequest { email, password } = credentials(payload)?;

    let user = state.store.get_user_by_email(&email).await?;

    // Unknown emails still pay for one verification, against the decoy digest
    let hasher = state.hasher.clone();
    let digest = user.as_ref().map(|user| user.password_hash.clone());
    let valid = tokio::task::spawn_blocking(move || match digest {
        Some(digest) => hasher.verify(&password, &digest),
        None => hasher.verify_decoy(&password),
    })
    .await
    .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?;

    // Unknown email and wrong password are indistinguishable to the client
    let user = match user {
        Some(user) if valid => user,
        Some(user) => {
            tracing::debug!(user_id = user.id, "password mismatch");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            tracing::debug!("login for unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = state.tokens.issue(user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            message: "Login Successfully".to_string(),
            token,
        }),
    ))
}
