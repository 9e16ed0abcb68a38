//! Resource store abstraction
//!
//! This module provides the `ResourceStore` trait that abstracts over the
//! persistence backends for users, events and registrations (in-memory
//! SQLite, file-based SQLite, remote Turso, or the process-local
//! [`MemoryStore`](super::memory::MemoryStore)).
//!
//! # Example
//!
//! ```rust,ignore
//! use evently::db::DatabaseProvider;
//!
//! // Ephemeral SQLite database (default for development/testing)
//! let store = DatabaseProvider::Memory.create_store().await?;
//!
//! // File-based SQLite
//! let store = DatabaseProvider::SQLite { path: "data/evently.db".into() }.create_store().await?;
//! ```

use crate::types::{Event, EventDetails, Registration, Result};
use crate::utils::toml_config::{DatabaseBackend, EventlyConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database (requires network access)
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
    /// Process-local store without SQL
    Process,
}

impl DatabaseProvider {
    /// Pick a provider from the `[database]` section.
    ///
    /// Turso wins when both of its environment variables resolve; `:memory:`
    /// selects an ephemeral SQLite database.
    pub fn from_config(config: &EventlyConfig) -> Self {
        if config.database.backend == DatabaseBackend::Memory {
            return DatabaseProvider::Process;
        }

        if let Some((url, auth_token)) = config.turso_credentials() {
            return DatabaseProvider::Turso { url, auth_token };
        }

        let path = config.database.url.trim();
        if path == ":memory:" {
            DatabaseProvider::Memory
        } else {
            DatabaseProvider::SQLite {
                path: path.to_string(),
            }
        }
    }

    /// Create a store from this provider configuration
    pub async fn create_store(&self) -> Result<Arc<dyn ResourceStore>> {
        match self {
            DatabaseProvider::Memory => {
                let client = super::turso::TursoClient::new_memory().await?;
                Ok(Arc::new(client))
            }
            DatabaseProvider::SQLite { path } => {
                let client = super::turso::TursoClient::new_local(path).await?;
                Ok(Arc::new(client))
            }
            DatabaseProvider::Turso { url, auth_token } => {
                let client =
                    super::turso::TursoClient::new_remote(url.clone(), auth_token.clone()).await?;
                Ok(Arc::new(client))
            }
            DatabaseProvider::Process => Ok(Arc::new(super::memory::MemoryStore::new())),
        }
    }
}

/// User record from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Argon2 PHC string, never the plain password
    pub password_hash: String,
}

/// Outcome of an owner-gated mutation.
///
/// The ownership check and the write happen as one store operation, so a
/// `Granted` result means the row belonged to the caller at the moment it
/// was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The caller owned the event and the mutation was applied
    Granted,
    /// No event with that id exists
    Missing,
    /// The event exists but belongs to someone else; nothing was changed
    NotOwner,
}

/// Abstract trait for persistence of users, events and registrations
///
/// Implementations must be safe to call from many in-flight requests at once.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    // ============== User Operations ==============

    /// Insert a user and return its id.
    ///
    /// Fails with `AppError::Conflict` when the email is already taken.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<i64>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // ============== Event Operations ==============

    /// All events, in id order
    async fn list_events(&self) -> Result<Vec<Event>>;

    async fn get_event(&self, id: i64) -> Result<Option<Event>>;

    /// Persist an event owned by `owner_id` and return it with its new id
    async fn create_event(&self, details: &EventDetails, owner_id: i64) -> Result<Event>;

    /// Overwrite the mutable fields of an event, only if `caller_id` owns it
    async fn update_owned_event(
        &self,
        id: i64,
        caller_id: i64,
        details: &EventDetails,
    ) -> Result<Ownership>;

    /// Delete an event and its registrations, only if `caller_id` owns it
    async fn delete_owned_event(&self, id: i64, caller_id: i64) -> Result<Ownership>;

    // ============== Registration Operations ==============

    /// Register `user_id` for an event.
    ///
    /// Returns `None` when the event does not exist. Duplicate registrations
    /// are accepted.
    async fn register(&self, event_id: i64, user_id: i64) -> Result<Option<Registration>>;

    /// Remove every registration of `user_id` for `event_id`, returning how many
    /// rows went away. Zero is not an error.
    async fn cancel_registration(&self, event_id: i64, user_id: i64) -> Result<u64>;

    /// All registrations, in id order
    async fn list_registrations(&self) -> Result<Vec<Registration>>;

    async fn get_registration(&self, id: i64) -> Result<Option<Registration>>;
}
