//! User store seam.
//!
//! The store owns email uniqueness. A duplicate insert is reported as
//! [`StoreError::Conflict`], distinct from infrastructure failure.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;

use super::AuthError;
use crate::models::auth::{User, UserRecord};
use crate::uuid::uuidv7;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered")]
    Conflict,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AuthError::AlreadyExists,
            StoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
        }
    }
}

/// Persistent user store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user (with password hash) by exact email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new user. Fails with `Conflict` if the email is taken.
    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, StoreError>;

    /// Connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// In-process store keyed by email.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, UserRecord>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(email).map(|r| r.value().clone()))
    }

    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, StoreError> {
        match self.users.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                let user = User {
                    id: uuidv7().to_string(),
                    email: email.to_string(),
                    name: name.to_string(),
                };
                slot.insert(UserRecord {
                    user: user.clone(),
                    password_hash: password_hash.to_string(),
                });
                Ok(user)
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryUserStore::new();
        let user = store.insert_user("a@x.com", "hash", "A").await.unwrap();
        let found = store.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.user, user);
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    async fn duplicate_insert_is_conflict() {
        let store = MemoryUserStore::new();
        store.insert_user("a@x.com", "hash", "A").await.unwrap();
        let err = store.insert_user("a@x.com", "other", "B").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.insert_user("a@x.com", "hash", "A").await.unwrap();
        assert!(store.find_user_by_email("A@X.COM").await.unwrap().is_none());
    }

    #[test]
    fn conflict_maps_to_already_exists() {
        assert!(matches!(
            AuthError::from(StoreError::Conflict),
            AuthError::AlreadyExists
        ));
        assert!(matches!(
            AuthError::from(StoreError::Unavailable("down".into())),
            AuthError::StoreUnavailable(_)
        ));
    }
}
