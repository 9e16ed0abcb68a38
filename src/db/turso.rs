use crate::db::traits::{Ownership, ResourceStore, User};
use crate::types::{AppError, Event, EventDetails, Registration, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row, TransactionBehavior};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

const BUSY_TIMEOUT_MS: u32 = 5_000;

const EVENT_COLUMNS: &str = "id, name, description, location, dateTime, user_id";

/// How operations obtain a connection.
///
/// Every connection to `:memory:` opens a fresh empty database, so the
/// ephemeral store keeps one connection and serializes access to it.
enum ConnectionMode {
    Shared(Arc<Mutex<Connection>>),
    PerOperation { local: bool },
}

/// Connection handed to a single store operation
pub(crate) enum OperationConn {
    Shared(OwnedMutexGuard<Connection>),
    Owned(Connection),
}

impl Deref for OperationConn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            OperationConn::Shared(guard) => guard,
            OperationConn::Owned(conn) => conn,
        }
    }
}

/// libsql-backed store: local SQLite file, `:memory:`, or remote Turso
pub struct TursoClient {
    db: Database,
    mode: ConnectionMode,
}

impl TursoClient {
    /// Ephemeral database that lives as long as the client
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self {
            db,
            mode: ConnectionMode::Shared(Arc::new(Mutex::new(conn))),
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// SQLite file at `path`, created if missing
    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database {}: {}", path, e)))?;

        let client = Self {
            db,
            mode: ConnectionMode::PerOperation { local: true },
        };

        {
            let conn = client.operation_conn().await?;
            pragma(&conn, "PRAGMA journal_mode = WAL").await?;
        }
        client.initialize_schema().await?;

        tracing::info!(path, "opened local database");
        Ok(client)
    }

    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url.clone(), auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        let client = Self {
            db,
            mode: ConnectionMode::PerOperation { local: false },
        };
        client.initialize_schema().await?;

        tracing::info!(url = %url, "connected to remote database");
        Ok(client)
    }

    pub fn connection(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))
    }

    pub(crate) async fn operation_conn(&self) -> Result<OperationConn> {
        match &self.mode {
            ConnectionMode::Shared(conn) => {
                Ok(OperationConn::Shared(conn.clone().lock_owned().await))
            }
            ConnectionMode::PerOperation { local } => {
                let conn = self.connection()?;
                if *local {
                    pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS)).await?;
                }
                Ok(OperationConn::Owned(conn))
            }
        }
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.operation_conn().await?;

        // Users table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        // Events table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                location TEXT NOT NULL,
                dateTime TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create events table: {}", e)))?;

        // Registrations table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS registrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY (event_id) REFERENCES events(id),
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to create registrations table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_registrations_event_user
             ON registrations (event_id, user_id)",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create registrations index: {}", e)))?;

        Ok(())
    }

    /// Decide why an owner-scoped statement matched nothing.
    async fn classify_miss(conn: &Connection, id: i64) -> Result<Ownership> {
        let mut rows = conn
            .query("SELECT 1 FROM events WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query event: {}", e)))?;

        let exists = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some();

        Ok(if exists {
            Ownership::NotOwner
        } else {
            Ownership::Missing
        })
    }
}

async fn pragma(conn: &Connection, statement: &str) -> Result<()> {
    let mut rows = conn
        .query(statement, ())
        .await
        .map_err(|e| AppError::Database(format!("Failed to apply '{}': {}", statement, e)))?;
    while rows
        .next()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .is_some()
    {}
    Ok(())
}

fn is_unique_violation(error: &libsql::Error) -> bool {
    error.to_string().contains("UNIQUE constraint failed")
}

fn row_to_event(row: &Row) -> Result<Event> {
    let date_time: String = row.get(4).map_err(|e| AppError::Database(e.to_string()))?;
    let date_time = DateTime::parse_from_rfc3339(&date_time)
        .map_err(|e| AppError::Database(format!("Corrupt dateTime '{}': {}", date_time, e)))?
        .with_timezone(&Utc);

    Ok(Event {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        name: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        description: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        location: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
        date_time,
        owner_id: row.get(5).map_err(|e| AppError::Database(e.to_string()))?,
    })
}

fn row_to_registration(row: &Row) -> Result<Registration> {
    Ok(Registration {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        event_id: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        user_id: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
    })
}

fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        email: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        password_hash: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
    })
}

// ============== Implement ResourceStore for TursoClient ==============

#[async_trait]
impl ResourceStore for TursoClient {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<i64> {
        let conn = self.operation_conn().await?;

        let mut rows = conn
            .query(
                "INSERT INTO users (email, password) VALUES (?, ?) RETURNING id",
                (email, password_hash),
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Could not save user, try again later".to_string())
                } else {
                    AppError::Database(format!("Failed to create user: {}", e))
                }
            })?;

        let row = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::Database("Insert returned no user id".to_string()))?;

        row.get(0).map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.operation_conn().await?;

        let mut rows = conn
            .query("SELECT id, email, password FROM users WHERE email = ?", [email])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let conn = self.operation_conn().await?;

        let mut rows = conn
            .query(
                &format!("SELECT {} FROM events ORDER BY id ASC", EVENT_COLUMNS),
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query events: {}", e)))?;

        let mut events = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            events.push(row_to_event(&row)?);
        }

        Ok(events)
    }

    async fn get_event(&self, id: i64) -> Result<Option<Event>> {
        let conn = self.operation_conn().await?;

        let mut rows = conn
            .query(
                &format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS),
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query event: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(row_to_event(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_event(&self, details: &EventDetails, owner_id: i64) -> Result<Event> {
        let conn = self.operation_conn().await?;

        let mut rows = conn
            .query(
                "INSERT INTO events (name, description, location, dateTime, user_id)
                 VALUES (?, ?, ?, ?, ?) RETURNING id",
                (
                    details.name.as_str(),
                    details.description.as_str(),
                    details.location.as_str(),
                    details.date_time.to_rfc3339(),
                    owner_id,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create event: {}", e)))?;

        let row = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::Database("Insert returned no event id".to_string()))?;
        let id: i64 = row.get(0).map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Event {
            id,
            name: details.name.clone(),
            description: details.description.clone(),
            location: details.location.clone(),
            date_time: details.date_time,
            owner_id,
        })
    }

    async fn update_owned_event(
        &self,
        id: i64,
        caller_id: i64,
        details: &EventDetails,
    ) -> Result<Ownership> {
        let conn = self.operation_conn().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let changed = tx
            .execute(
                "UPDATE events SET name = ?, description = ?, location = ?, dateTime = ?
                 WHERE id = ? AND user_id = ?",
                (
                    details.name.as_str(),
                    details.description.as_str(),
                    details.location.as_str(),
                    details.date_time.to_rfc3339(),
                    id,
                    caller_id,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update event: {}", e)))?;

        let outcome = if changed > 0 {
            Ownership::Granted
        } else {
            Self::classify_miss(&tx, id).await?
        };

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit update: {}", e)))?;

        Ok(outcome)
    }

    async fn delete_owned_event(&self, id: i64, caller_id: i64) -> Result<Ownership> {
        let conn = self.operation_conn().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let removed = tx
            .execute(
                "DELETE FROM events WHERE id = ? AND user_id = ?",
                (id, caller_id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete event: {}", e)))?;

        let outcome = if removed > 0 {
            tx.execute("DELETE FROM registrations WHERE event_id = ?", [id])
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to delete event registrations: {}", e))
                })?;
            Ownership::Granted
        } else {
            Self::classify_miss(&tx, id).await?
        };

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit delete: {}", e)))?;

        Ok(outcome)
    }

    async fn register(&self, event_id: i64, user_id: i64) -> Result<Option<Registration>> {
        let conn = self.operation_conn().await?;

        // Existence check and insert in one statement so a concurrent delete
        // cannot leave an orphan registration.
        let mut rows = conn
            .query(
                "INSERT INTO registrations (event_id, user_id)
                 SELECT ?1, ?2 WHERE EXISTS (SELECT 1 FROM events WHERE id = ?1)
                 RETURNING id",
                (event_id, user_id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to register for event: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(Registration {
                id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
                event_id,
                user_id,
            })),
            None => Ok(None),
        }
    }

    async fn cancel_registration(&self, event_id: i64, user_id: i64) -> Result<u64> {
        let conn = self.operation_conn().await?;

        conn.execute(
            "DELETE FROM registrations WHERE event_id = ? AND user_id = ?",
            (event_id, user_id),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to cancel registration: {}", e)))
    }

    async fn list_registrations(&self) -> Result<Vec<Registration>> {
        let conn = self.operation_conn().await?;

        let mut rows = conn
            .query(
                "SELECT id, event_id, user_id FROM registrations ORDER BY id ASC",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query registrations: {}", e)))?;

        let mut registrations = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            registrations.push(row_to_registration(&row)?);
        }

        Ok(registrations)
    }

    async fn get_registration(&self, id: i64) -> Result<Option<Registration>> {
        let conn = self.operation_conn().await?;

        let mut rows = conn
            .query(
                "SELECT id, event_id, user_id FROM registrations WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query registration: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(row_to_registration(&row)?)),
            None => Ok(None),
        }
    }
}
