//! Persistence for users, events and registrations.
//!
//! - **Turso/SQLite**: relational store over libsql (file, `:memory:`, or remote)
//! - **Memory**: process-local collections, for tests and throwaway servers
//!
//! Handlers only see [`ResourceStore`]; the backend is chosen at startup by
//! [`DatabaseProvider::from_config`].

pub mod memory;
pub mod traits;
pub mod turso;

pub use memory::MemoryStore;
pub use traits::{DatabaseProvider, Ownership, ResourceStore, User};
pub use turso::TursoClient;
