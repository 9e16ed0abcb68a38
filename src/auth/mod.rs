//! Credentials, tokens and the authentication middleware
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id hashing of user passwords
//! - [`auth::jwt`](crate::auth::jwt) - issuing and verifying signed access tokens
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and the [`AuthUser`] extractor
//!
//! # Flow
//!
//! `POST /login` verifies the password against the stored digest and issues a
//! token carrying `userId` and `email`. Protected routes run
//! [`auth_middleware`], which verifies the token from the `Authorization`
//! header and attaches an [`AuthUser`] to the request. Handlers take
//! `AuthUser` as an argument:
//!
//! ```ignore
//! async fn protected_handler(user: AuthUser) -> impl IntoResponse {
//!     format!("Hello, user {}!", user.user_id)
//! }
//! ```
//!
//! Ownership of a resource is not decided here. Handlers pass
//! `AuthUser::user_id` to the store, which applies an owner-gated change only
//! when the id matches the event's owner.

/// Token issuing and verification.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// Password hashing and verification.
pub mod password;

pub use jwt::{TokenError, TokenService};
pub use middleware::{auth_middleware, AuthUser};
pub use password::CredentialHasher;
