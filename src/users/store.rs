//! Data access for user records.
//!
//! The store is an explicit handle passed to whoever needs it; there is no
//! process-wide connection.

use std::future::Future;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed source of a backend fault.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A persisted user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

/// Data-access failures.
///
/// `NotFound` is a caller-visible condition; `Storage` is an infrastructure
/// fault carrying the operation and key it happened on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found user by id {id}")]
    NotFound { id: u64 },

    #[error("{op} user error by id {id}: {source}")]
    Storage {
        op: &'static str,
        id: u64,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    /// Wrap a backend fault with the operation and key.
    pub fn storage(op: &'static str, id: u64, source: impl Into<BoxError>) -> Self {
        StoreError::Storage {
            op,
            id,
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Keyed read and keyed write against a persistent store.
pub trait UserStore: Send + Sync + 'static {
    /// Look up a record by id.
    fn find(&self, id: u64) -> impl Future<Output = Result<User, StoreError>> + Send;

    /// Overwrite the record with `user.id`.
    fn update(&self, user: &User) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// In-memory store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<u64, User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        for user in users {
            store.insert(user);
        }
        store
    }

    pub fn insert(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserStore for MemoryStore {
    async fn find(&self, id: u64) -> Result<User, StoreError> {
        self.users
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound { id })
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        match self.users.get_mut(&user.id) {
            Some(mut entry) => {
                *entry = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound { id: user.id }),
        }
    }
}
