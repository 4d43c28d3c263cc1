//! Status detail repository

use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::cache::{CacheKeyTracker, NormalizedStore, StatusCacheKey, switch_to_latest};
use crate::entity::Status;
use crate::error::Result;
use crate::remote::Remote;

/// One status, watched live with its author joined in.
///
/// Built around the shared store, so a favourite toggled here is visible
/// to every timeline watcher referencing the same status, and vice versa.
pub struct StatusRepository {
    remote: Arc<dyn Remote>,
    store: NormalizedStore,
    tracker: CacheKeyTracker<StatusCacheKey>,
    status_id: String,
}

impl StatusRepository {
    pub fn new(remote: Arc<dyn Remote>, store: NormalizedStore, status_id: String) -> Self {
        Self {
            remote,
            store,
            tracker: CacheKeyTracker::new(),
            status_id,
        }
    }

    /// Seed from an already-fetched status (navigation from a timeline)
    /// without a remote round trip.
    pub async fn seed(&self, status: &Status) -> Result<()> {
        let key = self.store.store_status(status).await?;
        self.tracker.store(key);
        Ok(())
    }

    /// Fetch the status, store it and replace the tracked key.
    pub async fn fetch_initial(&self) -> Result<()> {
        let status = self.remote.status(self.status_id.clone()).await?;
        let key = self.store.store_status(&status).await?;
        self.tracker.store(key);
        Ok(())
    }

    /// Favourite or unfavourite depending on the current flag; the result
    /// is stored, the tracked key is left alone.
    pub async fn toggle_favourite(&self, status: &Status) -> Result<Status> {
        let updated = if status.is_favourited() {
            self.remote.unfavourite_status(status.id.clone()).await?
        } else {
            self.remote.favourite_status(status.id.clone()).await?
        };
        self.store.store_status(&updated).await?;
        Ok(updated)
    }

    pub fn watch(&self) -> BoxStream<'static, Status> {
        let store = self.store.clone();
        let keys = self.tracker.watch();
        switch_to_latest(keys.map(move |key| store.watch_status(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Database;
    use crate::entity::Account;
    use crate::remote::MockRemote;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn create_test_store() -> (NormalizedStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        (NormalizedStore::new(Arc::new(db)), temp_dir)
    }

    fn status(id: &str, favourited: bool) -> Status {
        Status {
            id: id.to_string(),
            account: Account {
                id: "a1".to_string(),
                display_name: "Alice".to_string(),
                note: String::new(),
                avatar: String::new(),
                created_at: Utc::now(),
                statuses_count: 0,
                followers_count: 0,
                following_count: 0,
            },
            content: None,
            url: None,
            favourites_count: if favourited { 1 } else { 0 },
            favourited: Some(favourited),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn fetch_initial_stores_and_tracks_the_status() {
        let (store, _temp_dir) = create_test_store().await;
        let mut remote = MockRemote::new();
        remote
            .expect_status()
            .withf(|id| id.as_str() == "s1")
            .returning(|id| Ok(status(&id, false)));

        let repo = StatusRepository::new(Arc::new(remote), store.clone(), "s1".to_string());
        repo.fetch_initial().await.unwrap();

        let key = repo.tracker.current().unwrap();
        assert_eq!(key, StatusCacheKey::new("s1", "a1"));
        assert!(store.status(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn seed_tracks_without_touching_the_remote() {
        let (store, _temp_dir) = create_test_store().await;
        let remote = MockRemote::new();

        let repo = StatusRepository::new(Arc::new(remote), store, "s1".to_string());
        repo.seed(&status("s1", false)).await.unwrap();
        assert!(repo.tracker.current().is_some());
    }

    #[tokio::test]
    async fn toggle_on_a_favourited_status_unfavourites() {
        let (store, _temp_dir) = create_test_store().await;
        let mut remote = MockRemote::new();
        remote
            .expect_unfavourite_status()
            .times(1)
            .returning(|id| Ok(status(&id, false)));

        let repo = StatusRepository::new(Arc::new(remote), store, "s1".to_string());
        let updated = repo.toggle_favourite(&status("s1", true)).await.unwrap();
        assert_eq!(updated.favourited, Some(false));
    }
}
