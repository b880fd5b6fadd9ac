//! Per-owner "something changed" markers.
//!
//! Every successful add or remove bumps the caller's marker; clients poll
//! [`SyncTracker::get`] and refresh their cached view when it moves. The
//! marker is advisory: it is written after the mutation commits, outside any
//! transaction, so a failure in between leaves it stale.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::storage::{StorageError, SyncStore};

#[derive(Debug, Error)]
pub enum SyncError {
    /// The owner has never mutated anything.
    #[error("no changes recorded for this owner")]
    NotFound,

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for SyncError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => SyncError::NotFound,
            other => SyncError::Storage(other),
        }
    }
}

#[derive(Clone)]
pub struct SyncTracker {
    store: Arc<dyn SyncStore>,
}

impl SyncTracker {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }

    /// Time of the owner's most recent mutation.
    pub async fn get(&self, owner: Uuid) -> Result<DateTime<Utc>, SyncError> {
        Ok(self.store.get(owner).await?)
    }

    /// Record a mutation by `owner` now.
    pub async fn set(&self, owner: Uuid) -> Result<(), SyncError> {
        Ok(self.store.set(owner).await?)
    }

    /// [`SyncTracker::set`] after a committed mutation; a failure is logged
    /// and otherwise ignored since the mutation itself already succeeded.
    pub async fn notify(&self, owner: Uuid) {
        if let Err(e) = self.set(owner).await {
            warn!(owner_id = %owner, error = %e, "failed to update sync marker");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::MockSyncStore;

    #[tokio::test]
    async fn never_mutated_is_not_found() {
        let tracker = SyncTracker::new(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            tracker.get(Uuid::new_v4()).await,
            Err(SyncError::NotFound)
        ));
    }

    #[tokio::test]
    async fn marker_is_monotonic_and_per_owner() {
        let tracker = SyncTracker::new(Arc::new(MemoryStorage::new()));
        let (x, y) = (Uuid::new_v4(), Uuid::new_v4());

        tracker.set(x).await.unwrap();
        let first = tracker.get(x).await.unwrap();
        tracker.set(x).await.unwrap();
        let second = tracker.get(x).await.unwrap();
        assert!(second >= first);

        tracker.set(y).await.unwrap();
        assert_eq!(tracker.get(x).await.unwrap(), second);
        assert!(tracker.get(y).await.is_ok());
    }

    #[tokio::test]
    async fn notify_swallows_backend_failure() {
        let mut store = MockSyncStore::new();
        store
            .expect_set()
            .times(1)
            .returning(|_| Err(StorageError::Backend("connection reset".into())));
        let tracker = SyncTracker::new(Arc::new(store));
        tracker.notify(Uuid::new_v4()).await;
    }

    #[tokio::test]
    async fn backend_failure_on_get_is_not_not_found() {
        let mut store = MockSyncStore::new();
        store
            .expect_get()
            .returning(|_| Err(StorageError::Backend("timeout".into())));
        let tracker = SyncTracker::new(Arc::new(store));
        assert!(matches!(
            tracker.get(Uuid::new_v4()).await,
            Err(SyncError::Storage(_))
        ));
    }
}
