//! Business operations on users.

use serde::Deserialize;

use crate::users::store::{StoreError, User, UserStore};

/// Request to rename a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInput {
    pub id: u64,
    pub name: String,
}

/// Find the user, apply the new name and write it back.
///
/// Store errors are returned as-is so callers can tell a missing record
/// from an infrastructure fault.
pub async fn update_user<S: UserStore>(store: &S, input: &UserInput) -> Result<User, StoreError> {
    let mut user = store.find(input.id).await?;
    user.name = input.name.clone();
    store.update(&user).await?;

    tracing::debug!(user_id = user.id, "user updated");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::store::MemoryStore;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts writes and optionally fails them.
    struct RecordingStore {
        inner: MemoryStore,
        updates: AtomicUsize,
        fail_updates: bool,
    }

    impl RecordingStore {
        fn new(users: Vec<User>, fail_updates: bool) -> Self {
            Self {
                inner: MemoryStore::with_users(users),
                updates: AtomicUsize::new(0),
                fail_updates,
            }
        }
    }

    impl UserStore for RecordingStore {
        async fn find(&self, id: u64) -> Result<User, StoreError> {
            self.inner.find(id).await
        }

        async fn update(&self, user: &User) -> Result<(), StoreError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if self.fail_updates {
                return Err(StoreError::storage(
                    "update",
                    user.id,
                    io::Error::new(io::ErrorKind::BrokenPipe, "database gone"),
                ));
            }
            self.inner.update(user).await
        }
    }

    fn alice() -> User {
        User { id: 1, name: "alice".into() }
    }

    #[tokio::test]
    async fn renames_existing_user() {
        let store = RecordingStore::new(vec![alice()], false);
        let input = UserInput { id: 1, name: "bob".into() };

        let user = update_user(&store, &input).await.unwrap();

        assert_eq!(user, User { id: 1, name: "bob".into() });
        assert_eq!(store.inner.find(1).await.unwrap().name, "bob");
        assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_user_skips_update() {
        let store = RecordingStore::new(vec![alice()], false);
        let input = UserInput { id: 99, name: "x".into() };

        let err = update_user(&store, &input).await.unwrap_err();

        assert!(matches!(err, StoreError::NotFound { id: 99 }));
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn storage_fault_propagates_unchanged() {
        let store = RecordingStore::new(vec![alice()], true);
        let input = UserInput { id: 1, name: "bob".into() };

        let err = update_user(&store, &input).await.unwrap_err();

        match err {
            StoreError::Storage { op, id, .. } => {
                assert_eq!(op, "update");
                assert_eq!(id, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.inner.find(1).await.unwrap().name, "alice");
    }
}
