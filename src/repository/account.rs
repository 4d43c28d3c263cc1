//! Own-account repository

use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::cache::{AccountCacheKey, CacheKeyTracker, NormalizedStore, switch_to_latest};
use crate::entity::Account;
use crate::error::Result;
use crate::remote::Remote;

/// The authenticated user's profile, watched live.
pub struct AccountRepository {
    remote: Arc<dyn Remote>,
    store: NormalizedStore,
    tracker: CacheKeyTracker<AccountCacheKey>,
}

impl AccountRepository {
    pub fn new(remote: Arc<dyn Remote>, store: NormalizedStore) -> Self {
        Self {
            remote,
            store,
            tracker: CacheKeyTracker::new(),
        }
    }

    /// Fetch the credential account, store it and replace the tracked key.
    pub async fn fetch_initial(&self) -> Result<Account> {
        let account = self.remote.verify_credentials().await?;
        let key = self.store.store_account(&account).await?;
        self.tracker.store(key);
        Ok(account)
    }

    /// PATCH the profile and store the returned record. The tracked key
    /// already names this account, so watchers refresh from the upsert
    /// alone.
    pub async fn update_profile(
        &self,
        display_name: String,
        note: Option<String>,
    ) -> Result<Account> {
        let account = self.remote.update_credentials(display_name, note).await?;
        self.store.store_account(&account).await?;
        Ok(account)
    }

    pub fn watch(&self) -> BoxStream<'static, Account> {
        let store = self.store.clone();
        let keys = self.tracker.watch();
        switch_to_latest(keys.map(move |key| store.watch_account(key)))
    }
}
