//! Timeline repository
//!
//! Orchestrates remote pagination against the normalized store for one
//! timeline surface. Fetches write through the store and then replace the
//! tracked cache key; `watch()` follows the tracked key, retargeting the
//! live composed query whenever the key changes.

use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::cache::{CacheKeyTracker, NormalizedStore, TimelineCacheKey, switch_to_latest};
use crate::entity::Status;
use crate::error::Result;
use crate::remote::Remote;

/// Which timeline a repository paginates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineSource {
    Home,
    /// Statuses authored by one account
    Account(String),
}

pub struct TimelineRepository {
    remote: Arc<dyn Remote>,
    store: NormalizedStore,
    tracker: CacheKeyTracker<TimelineCacheKey>,
    source: TimelineSource,
}

impl TimelineRepository {
    pub fn new(remote: Arc<dyn Remote>, store: NormalizedStore, source: TimelineSource) -> Self {
        Self {
            remote,
            store,
            tracker: CacheKeyTracker::new(),
            source,
        }
    }

    pub fn home(remote: Arc<dyn Remote>, store: NormalizedStore) -> Self {
        Self::new(remote, store, TimelineSource::Home)
    }

    pub fn account(remote: Arc<dyn Remote>, store: NormalizedStore, account_id: String) -> Self {
        Self::new(remote, store, TimelineSource::Account(account_id))
    }

    async fn fetch_page(&self, max_id: Option<String>) -> Result<Vec<Status>> {
        match &self.source {
            TimelineSource::Home => self.remote.home_timeline(max_id).await,
            TimelineSource::Account(id) => {
                self.remote.account_statuses(id.clone(), max_id).await
            }
        }
    }

    /// Fetch the first page, store it and replace the tracked key with the
    /// page's key. Returns the number of statuses fetched.
    pub async fn fetch_initial(&self) -> Result<usize> {
        let page = self.fetch_page(None).await?;
        tracing::debug!(source = ?self.source, count = page.len(), "Fetched initial page");

        let key = self.store.store_timeline(&page).await?;
        self.tracker.store(key);
        Ok(page.len())
    }

    /// Fetch the page after the tracked key's trailing status and append
    /// it. A no-op before the first successful `fetch_initial`, and when
    /// the tracked key is empty.
    pub async fn fetch_next(&self) -> Result<usize> {
        let Some(current) = self.tracker.current() else {
            return Ok(0);
        };
        let Some(cursor) = current.last_status_id().map(str::to_string) else {
            return Ok(0);
        };

        let page = self.fetch_page(Some(cursor)).await?;
        tracing::debug!(source = ?self.source, count = page.len(), "Fetched next page");

        let next = self.store.store_timeline(&page).await?;
        self.tracker.store(current.concat(next));
        Ok(page.len())
    }

    /// True when `status_id` is the trailing entry of the tracked key,
    /// i.e. the consumer has scrolled to the end of what is cached.
    pub fn is_last(&self, status_id: &str) -> bool {
        match self.tracker.current() {
            Some(key) => key.last_status_id() == Some(status_id),
            None => false,
        }
    }

    /// Favourite or unfavourite depending on the status's current flag.
    /// The returned record is stored; the tracked key is left alone, so
    /// every watcher referencing the status picks the change up.
    pub async fn toggle_favourite(&self, status: &Status) -> Result<Status> {
        let updated = if status.is_favourited() {
            self.remote.unfavourite_status(status.id.clone()).await?
        } else {
            self.remote.favourite_status(status.id.clone()).await?
        };
        self.store.store_status(&updated).await?;
        Ok(updated)
    }

    /// Live composed timeline for whatever key is tracked, switching to
    /// the new key's query on every fetch.
    pub fn watch(&self) -> BoxStream<'static, Vec<Status>> {
        let store = self.store.clone();
        let keys = self.tracker.watch();
        switch_to_latest(keys.map(move |key| store.watch_timeline(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Database;
    use crate::entity::Account;
    use crate::remote::MockRemote;
    use chrono::Utc;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn create_test_store() -> (NormalizedStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        (NormalizedStore::new(Arc::new(db)), temp_dir)
    }

    fn status(id: &str, account_id: &str) -> Status {
        Status {
            id: id.to_string(),
            account: Account {
                id: account_id.to_string(),
                display_name: "Someone".to_string(),
                note: String::new(),
                avatar: String::new(),
                created_at: Utc::now(),
                statuses_count: 0,
                followers_count: 0,
                following_count: 0,
            },
            content: Some("<p>post</p>".to_string()),
            url: None,
            favourites_count: 0,
            favourited: Some(false),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn fetch_initial_replaces_the_tracked_key() {
        let (store, _temp_dir) = create_test_store().await;
        let mut remote = MockRemote::new();
        remote
            .expect_home_timeline()
            .withf(|max_id| max_id.is_none())
            .returning(|_| Ok(vec![status("s2", "a1"), status("s1", "a1")]));

        let repo = TimelineRepository::home(Arc::new(remote), store);
        assert_eq!(repo.fetch_initial().await.unwrap(), 2);

        let key = repo.tracker.current().unwrap();
        assert_eq!(key.status_ids(), vec!["s2", "s1"]);
    }

    #[tokio::test]
    async fn fetch_next_is_a_noop_without_a_key() {
        let (store, _temp_dir) = create_test_store().await;
        let remote = MockRemote::new(); // any remote call would panic

        let repo = TimelineRepository::home(Arc::new(remote), store);
        assert_eq!(repo.fetch_next().await.unwrap(), 0);
        assert!(repo.tracker.current().is_none());
    }

    #[tokio::test]
    async fn fetch_next_cursors_from_the_trailing_key_entry_and_appends() {
        let (store, _temp_dir) = create_test_store().await;
        let mut remote = MockRemote::new();
        remote
            .expect_home_timeline()
            .withf(|max_id| max_id.is_none())
            .times(1)
            .returning(|_| Ok(vec![status("s3", "a1"), status("s2", "a1")]));
        remote
            .expect_home_timeline()
            .withf(|max_id| max_id.as_deref() == Some("s2"))
            .times(1)
            .returning(|_| Ok(vec![status("s1", "a2")]));

        let repo = TimelineRepository::home(Arc::new(remote), store);
        repo.fetch_initial().await.unwrap();
        assert_eq!(repo.fetch_next().await.unwrap(), 1);

        let key = repo.tracker.current().unwrap();
        assert_eq!(key.status_ids(), vec!["s3", "s2", "s1"]);
        assert!(repo.is_last("s1"));
        assert!(!repo.is_last("s2"));
    }

    #[tokio::test]
    async fn account_source_queries_account_statuses() {
        let (store, _temp_dir) = create_test_store().await;
        let mut remote = MockRemote::new();
        remote
            .expect_account_statuses()
            .withf(|account_id, max_id| account_id.as_str() == "a7" && max_id.is_none())
            .returning(|_, _| Ok(vec![status("s1", "a7")]));

        let repo = TimelineRepository::account(Arc::new(remote), store, "a7".to_string());
        assert_eq!(repo.fetch_initial().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn toggle_favourite_picks_the_inverse_call_and_keeps_the_key() {
        let (store, _temp_dir) = create_test_store().await;
        let mut remote = MockRemote::new();
        remote
            .expect_home_timeline()
            .returning(|_| Ok(vec![status("s1", "a1")]));
        remote.expect_favourite_status().times(1).returning(|id| {
            let mut updated = status(&id, "a1");
            updated.favourited = Some(true);
            updated.favourites_count = 1;
            Ok(updated)
        });

        let repo = TimelineRepository::home(Arc::new(remote), store);
        repo.fetch_initial().await.unwrap();
        let key_before = repo.tracker.current().unwrap();

        let updated = repo.toggle_favourite(&status("s1", "a1")).await.unwrap();
        assert_eq!(updated.favourited, Some(true));
        assert_eq!(repo.tracker.current().unwrap(), key_before);
    }

    #[tokio::test]
    async fn watch_switches_to_the_grown_key_after_pagination() {
        let (store, _temp_dir) = create_test_store().await;
        let mut remote = MockRemote::new();
        remote
            .expect_home_timeline()
            .withf(|max_id| max_id.is_none())
            .returning(|_| Ok(vec![status("s2", "a1")]));
        remote
            .expect_home_timeline()
            .withf(|max_id| max_id.is_some())
            .returning(|_| Ok(vec![status("s1", "a1")]));

        let repo = TimelineRepository::home(Arc::new(remote), store);
        let mut watched = repo.watch();

        // Nothing tracked yet, nothing emitted.
        let pending = tokio::time::timeout(Duration::from_millis(20), watched.next()).await;
        assert!(pending.is_err());

        repo.fetch_initial().await.unwrap();
        let first = watched.next().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "s2");

        repo.fetch_next().await.unwrap();
        // The watcher retargets to the concatenated key.
        let grown = watched.next().await.unwrap();
        let ids: Vec<&str> = grown.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s1"]);
    }
}
