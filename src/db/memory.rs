//! Process-local resource store
//!
//! Keeps users, events and registrations in plain collections behind a single
//! `RwLock`. Each trait call takes the lock once, so an ownership check and the
//! write it guards can never interleave with another request. Nothing survives
//! a restart; it backs tests and `backend = "memory"`.

use crate::db::traits::{Ownership, ResourceStore, User};
use crate::types::{AppError, Event, EventDetails, Registration, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    events: BTreeMap<i64, Event>,
    registrations: BTreeMap<i64, Registration>,
    next_user_id: i64,
    next_event_id: i64,
    next_registration_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<i64> {
        let mut tables = self.tables.write();

        if tables.users.values().any(|u| u.email == email) {
            return Err(AppError::Conflict(
                "Could not save user, try again later".to_string(),
            ));
        }

        let id = next_id(&mut tables.next_user_id);
        tables.users.insert(
            id,
            User {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );

        Ok(id)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        Ok(self.tables.read().events.values().cloned().collect())
    }

    async fn get_event(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.tables.read().events.get(&id).cloned())
    }

    async fn create_event(&self, details: &EventDetails, owner_id: i64) -> Result<Event> {
        let mut tables = self.tables.write();

        let id = next_id(&mut tables.next_event_id);
        let event = Event {
            id,
            name: details.name.clone(),
            description: details.description.clone(),
            location: details.location.clone(),
            date_time: details.date_time,
            owner_id,
        };
        tables.events.insert(id, event.clone());

        Ok(event)
    }

    async fn update_owned_event(
        &self,
        id: i64,
        caller_id: i64,
        details: &EventDetails,
    ) -> Result<Ownership> {
        let mut tables = self.tables.write();

        let Some(event) = tables.events.get_mut(&id) else {
            return Ok(Ownership::Missing);
        };
        if event.owner_id != caller_id {
            return Ok(Ownership::NotOwner);
        }

        event.name = details.name.clone();
        event.description = details.description.clone();
        event.location = details.location.clone();
        event.date_time = details.date_time;

        Ok(Ownership::Granted)
    }

    async fn delete_owned_event(&self, id: i64, caller_id: i64) -> Result<Ownership> {
        let mut tables = self.tables.write();

        match tables.events.get(&id) {
            None => return Ok(Ownership::Missing),
            Some(event) if event.owner_id != caller_id => return Ok(Ownership::NotOwner),
            Some(_) => {}
        }

        tables.events.remove(&id);
        tables.registrations.retain(|_, r| r.event_id != id);

        Ok(Ownership::Granted)
    }

    async fn register(&self, event_id: i64, user_id: i64) -> Result<Option<Registration>> {
        let mut tables = self.tables.write();

        if !tables.events.contains_key(&event_id) {
            return Ok(None);
        }

        let id = next_id(&mut tables.next_registration_id);
        let registration = Registration {
            id,
            event_id,
            user_id,
        };
        tables.registrations.insert(id, registration.clone());

        Ok(Some(registration))
    }

    async fn cancel_registration(&self, event_id: i64, user_id: i64) -> Result<u64> {
        let mut tables = self.tables.write();

        let before = tables.registrations.len();
        tables
            .registrations
            .retain(|_, r| !(r.event_id == event_id && r.user_id == user_id));

        Ok((before - tables.registrations.len()) as u64)
    }

    async fn list_registrations(&self) -> Result<Vec<Registration>> {
        Ok(self.tables.read().registrations.values().cloned().collect())
    }

    async fn get_registration(&self, id: i64) -> Result<Option<Registration>> {
        Ok(self.tables.read().registrations.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str) -> EventDetails {
        EventDetails {
            name: name.to_string(),
            description: "D".to_string(),
            location: "Hall".to_string(),
            date_time: "2025-01-01T00:00:00Z".parse().expect("valid timestamp"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user("a@x.com", "h").await.expect("first insert");

        let err = store
            .create_user("a@x.com", "h2")
            .await
            .expect_err("duplicate email");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store.create_event(&details("a"), 1).await.expect("create");
        store
            .delete_owned_event(first.id, 1)
            .await
            .expect("delete");

        let second = store.create_event(&details("b"), 1).await.expect("create");
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_leaves_event_untouched() {
        let store = MemoryStore::new();
        let event = store.create_event(&details("a"), 1).await.expect("create");

        let outcome = store
            .update_owned_event(event.id, 2, &details("hijacked"))
            .await
            .expect("update");

        assert_eq!(outcome, Ownership::NotOwner);
        let stored = store.get_event(event.id).await.expect("get").expect("exists");
        assert_eq!(stored.name, "a");
    }

    #[tokio::test]
    async fn test_delete_cascades_registrations() {
        let store = MemoryStore::new();
        let kept = store.create_event(&details("kept"), 1).await.expect("create");
        let gone = store.create_event(&details("gone"), 1).await.expect("create");
        store.register(kept.id, 2).await.expect("register");
        store.register(gone.id, 2).await.expect("register");

        assert_eq!(
            store.delete_owned_event(gone.id, 1).await.expect("delete"),
            Ownership::Granted
        );

        let remaining = store.list_registrations().await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].event_id, kept.id);
    }

    #[tokio::test]
    async fn test_register_missing_event_returns_none() {
        let store = MemoryStore::new();

        assert!(store.register(42, 1).await.expect("register").is_none());
    }

    #[tokio::test]
    async fn test_cancel_removes_all_duplicates() {
        let store = MemoryStore::new();
        let event = store.create_event(&details("a"), 1).await.expect("create");
        store.register(event.id, 2).await.expect("register");
        store.register(event.id, 2).await.expect("register");
        store.register(event.id, 3).await.expect("register");

        assert_eq!(store.cancel_registration(event.id, 2).await.expect("cancel"), 2);
        assert_eq!(store.cancel_registration(event.id, 2).await.expect("cancel"), 0);
        assert_eq!(store.list_registrations().await.expect("list").len(), 1);
    }
}
