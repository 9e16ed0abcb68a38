//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by resource.

/// Event listing and owner-gated event CRUD.
pub mod events;
/// Liveness probe.
pub mod health;
/// Event registration and cancellation.
pub mod registrations;
/// Signup and login.
pub mod users;
