//! Database integration tests
//!
//! These tests verify TursoClient against in-memory and file-backed SQLite.

use chrono::{DateTime, Utc};
use evently::db::{Ownership, ResourceStore, TursoClient};
use evently::types::{AppError, EventDetails};
use std::sync::Arc;
use tempfile::TempDir;

/// Test helper to create a TursoClient with in-memory database
async fn create_test_client() -> TursoClient {
    TursoClient::new_memory()
        .await
        .expect("Failed to create in-memory database")
}

fn details(name: &str) -> EventDetails {
    EventDetails {
        name: name.to_string(),
        description: "D".to_string(),
        location: "Hall".to_string(),
        date_time: "2025-01-01T00:00:00Z"
            .parse::<DateTime<Utc>>()
            .expect("valid timestamp"),
    }
}

#[tokio::test]
async fn test_create_memory_client() {
    let client = create_test_client().await;

    assert!(client.list_events().await.expect("list").is_empty());
    assert!(client.list_registrations().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_create_and_lookup_user() {
    let client = create_test_client().await;

    let id = client
        .create_user("test@example.com", "hashed_password_here")
        .await
        .expect("create user");

    let by_email = client
        .get_user_by_email("test@example.com")
        .await
        .expect("query")
        .expect("user exists");
    assert_eq!(by_email.id, id);
    assert_eq!(by_email.password_hash, "hashed_password_here");

    assert!(client
        .get_user_by_email("nobody@example.com")
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn test_create_duplicate_user_fails() {
    let client = create_test_client().await;

    client
        .create_user("test@example.com", "hashed_password")
        .await
        .expect("First user creation should succeed");

    let result = client
        .create_user("test@example.com", "different_password")
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_event_round_trip_preserves_fields() {
    let client = create_test_client().await;

    let created = client.create_event(&details("Conf"), 7).await.expect("create");
    let fetched = client
        .get_event(created.id)
        .await
        .expect("query")
        .expect("event exists");

    assert_eq!(fetched, created);
    assert_eq!(fetched.owner_id, 7);
    assert_eq!(fetched.date_time, details("Conf").date_time);
}

#[tokio::test]
async fn test_update_owned_event_outcomes() {
    let client = create_test_client().await;
    let event = client.create_event(&details("Conf"), 1).await.expect("create");

    assert_eq!(
        client
            .update_owned_event(event.id, 2, &details("Hijacked"))
            .await
            .expect("update"),
        Ownership::NotOwner
    );
    assert_eq!(
        client
            .update_owned_event(event.id + 100, 1, &details("Nowhere"))
            .await
            .expect("update"),
        Ownership::Missing
    );
    assert_eq!(
        client.get_event(event.id).await.expect("query").expect("exists").name,
        "Conf"
    );

    assert_eq!(
        client
            .update_owned_event(event.id, 1, &details("Conf 2"))
            .await
            .expect("update"),
        Ownership::Granted
    );

    let updated = client.get_event(event.id).await.expect("query").expect("exists");
    assert_eq!(updated.name, "Conf 2");
    assert_eq!(updated.owner_id, 1);
}

#[tokio::test]
async fn test_delete_owned_event_cascades() {
    let client = create_test_client().await;
    let kept = client.create_event(&details("Kept"), 1).await.expect("create");
    let gone = client.create_event(&details("Gone"), 1).await.expect("create");
    client.register(kept.id, 2).await.expect("register");
    client.register(gone.id, 2).await.expect("register");
    client.register(gone.id, 3).await.expect("register");

    assert_eq!(
        client.delete_owned_event(gone.id, 2).await.expect("delete"),
        Ownership::NotOwner
    );
    assert_eq!(client.list_registrations().await.expect("list").len(), 3);

    assert_eq!(
        client.delete_owned_event(gone.id, 1).await.expect("delete"),
        Ownership::Granted
    );
    assert_eq!(
        client.delete_owned_event(gone.id, 1).await.expect("delete"),
        Ownership::Missing
    );

    assert!(client.get_event(gone.id).await.expect("query").is_none());
    let remaining = client.list_registrations().await.expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].event_id, kept.id);
}

#[tokio::test]
async fn test_register_requires_existing_event() {
    let client = create_test_client().await;

    assert!(client.register(99, 1).await.expect("register").is_none());
    assert!(client.list_registrations().await.expect("list").is_empty());

    let event = client.create_event(&details("Conf"), 1).await.expect("create");
    let registration = client
        .register(event.id, 1)
        .await
        .expect("register")
        .expect("event exists");

    assert_eq!(registration.event_id, event.id);
    assert_eq!(
        client
            .get_registration(registration.id)
            .await
            .expect("query"),
        Some(registration)
    );
}

#[tokio::test]
async fn test_cancel_registration_counts_rows() {
    let client = create_test_client().await;
    let event = client.create_event(&details("Conf"), 1).await.expect("create");
    client.register(event.id, 2).await.expect("register");
    client.register(event.id, 2).await.expect("register");

    assert_eq!(client.cancel_registration(event.id, 2).await.expect("cancel"), 2);
    assert_eq!(client.cancel_registration(event.id, 2).await.expect("cancel"), 0);
}

#[tokio::test]
async fn test_local_file_database_persists() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("nested").join("evently.db");
    let path = path.to_str().expect("utf-8 path");

    let id = {
        let client = TursoClient::new_local(path).await.expect("open database");
        let user = client.create_user("a@x.com", "h").await.expect("create user");
        client.create_event(&details("Conf"), user).await.expect("create").id
    };

    let reopened = TursoClient::new_local(path).await.expect("reopen database");
    let event = reopened.get_event(id).await.expect("query").expect("persisted");
    assert_eq!(event.name, "Conf");
}

#[tokio::test]
async fn test_concurrent_owner_and_intruder_updates() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("evently.db");
    let client: Arc<dyn ResourceStore> = Arc::new(
        TursoClient::new_local(path.to_str().expect("utf-8 path"))
            .await
            .expect("open database"),
    );
    let event = client.create_event(&details("Conf"), 1).await.expect("create");

    let mut handles = Vec::new();
    for caller in [1_i64, 2, 1, 2, 2, 1] {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let outcome = client
                .update_owned_event(event.id, caller, &details(&format!("by {}", caller)))
                .await
                .expect("update");
            (caller, outcome)
        }));
    }

    for handle in handles {
        let (caller, outcome) = handle.await.expect("task");
        let expected = if caller == 1 {
            Ownership::Granted
        } else {
            Ownership::NotOwner
        };
        assert_eq!(outcome, expected);
    }

    let stored = client.get_event(event.id).await.expect("query").expect("exists");
    assert_eq!(stored.name, "by 1");
    assert_eq!(stored.owner_id, 1);
}
