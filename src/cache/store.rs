//! Normalized store
//!
//! Write-through facade over the record database. Writes split fetched
//! entity graphs into per-identity records (one row per identity, total
//! replacement) and return the cache key describing what was written.
//! Reads recompose entities by joining the latest records referenced by a
//! key; watch variants keep the join live across subsequent writes.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cache::key::{AccountCacheKey, StatusCacheKey, TimelineCacheKey};
use crate::cache::watch::{Composition, watch_composed};
use crate::data::{
    AccountRecord, Database, RecordChange, StatusRecord, normalize_account, normalize_status,
    normalize_timeline,
};
use crate::entity::{Account, Status};
use crate::error::Result;

#[derive(Clone)]
pub struct NormalizedStore {
    db: Arc<Database>,
}

impl NormalizedStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store one status and its embedded author, atomically.
    pub async fn store_status(&self, status: &Status) -> Result<StatusCacheKey> {
        let (record, account, key) = normalize_status(status);
        self.db
            .upsert_batch(std::slice::from_ref(&record), std::slice::from_ref(&account))
            .await?;
        Ok(key)
    }

    pub async fn store_account(&self, account: &Account) -> Result<AccountCacheKey> {
        let (record, key) = normalize_account(account);
        self.db.upsert_account(&record).await?;
        Ok(key)
    }

    /// Store a fetched page, atomically. The returned key preserves the
    /// page's response order.
    pub async fn store_timeline(&self, statuses: &[Status]) -> Result<TimelineCacheKey> {
        let (records, accounts, key) = normalize_timeline(statuses);
        self.db.upsert_batch(&records, &accounts).await?;
        Ok(key)
    }

    // =========================================================================
    // One-shot composed reads
    // =========================================================================

    pub async fn status(&self, key: &StatusCacheKey) -> Result<Option<Status>> {
        compose_status(&self.db, &key.status_id).await
    }

    pub async fn account(&self, key: &AccountCacheKey) -> Result<Option<Account>> {
        compose_account(&self.db, &key.account_id).await
    }

    pub async fn timeline(&self, key: &TimelineCacheKey) -> Result<Vec<Status>> {
        compose_timeline(&self.db, key).await
    }

    // =========================================================================
    // Live composed reads
    // =========================================================================

    /// Composed status, live. Emits once the status record exists, then on
    /// every write that changes the composed value, including writes to the
    /// author's account record alone.
    pub fn watch_status(&self, key: StatusCacheKey) -> BoxStream<'static, Status> {
        watch_composed(self.db.clone(), StatusComposition { key })
    }

    pub fn watch_account(&self, key: AccountCacheKey) -> BoxStream<'static, Account> {
        watch_composed(self.db.clone(), AccountComposition { key })
    }

    /// Composed timeline, live, in key order regardless of storage order.
    /// Statuses whose records are missing are omitted from the emission.
    pub fn watch_timeline(&self, key: TimelineCacheKey) -> BoxStream<'static, Vec<Status>> {
        watch_composed(self.db.clone(), TimelineComposition::new(key))
    }
}

async fn compose_status(db: &Database, status_id: &str) -> Result<Option<Status>> {
    let Some(record) = db.get_status(status_id).await? else {
        return Ok(None);
    };
    let account = db.get_account(&record.account_id).await?;
    Ok(Some(record.compose(account.as_ref())))
}

async fn compose_account(db: &Database, account_id: &str) -> Result<Option<Account>> {
    Ok(db.get_account(account_id).await?.map(|r| r.to_entity()))
}

async fn compose_timeline(db: &Database, key: &TimelineCacheKey) -> Result<Vec<Status>> {
    let records = db.get_statuses(&key.status_ids()).await?;
    let records_by_id: HashMap<&str, &StatusRecord> =
        records.iter().map(|r| (r.id.as_str(), r)).collect();

    // Join against the accounts the stored records actually reference,
    // which may differ from the key's write-time account set.
    let mut account_ids: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for record in &records {
        if seen.insert(record.account_id.as_str()) {
            account_ids.push(record.account_id.clone());
        }
    }
    let accounts = db.get_accounts(&account_ids).await?;
    let accounts_by_id: HashMap<&str, &AccountRecord> =
        accounts.iter().map(|a| (a.id.as_str(), a)).collect();

    let mut composed = Vec::with_capacity(key.len());
    for status_key in &key.statuses {
        if let Some(record) = records_by_id.get(status_key.status_id.as_str()) {
            let account = accounts_by_id.get(record.account_id.as_str()).copied();
            composed.push(record.compose(account));
        }
    }
    Ok(composed)
}

struct StatusComposition {
    key: StatusCacheKey,
}

#[async_trait]
impl Composition for StatusComposition {
    type Output = Status;

    fn is_affected(&self, change: &RecordChange) -> bool {
        change.touches_status(&self.key.status_id)
            || change.touches_account(&self.key.account.account_id)
    }

    async fn compose(&self, db: &Database) -> Result<Option<Status>> {
        compose_status(db, &self.key.status_id).await
    }
}

struct AccountComposition {
    key: AccountCacheKey,
}

#[async_trait]
impl Composition for AccountComposition {
    type Output = Account;

    fn is_affected(&self, change: &RecordChange) -> bool {
        change.touches_account(&self.key.account_id)
    }

    async fn compose(&self, db: &Database) -> Result<Option<Account>> {
        compose_account(db, &self.key.account_id).await
    }
}

struct TimelineComposition {
    key: TimelineCacheKey,
    status_ids: HashSet<String>,
    account_ids: HashSet<String>,
}

impl TimelineComposition {
    fn new(key: TimelineCacheKey) -> Self {
        let status_ids = key.status_ids().into_iter().collect();
        let account_ids = key.account_ids().into_iter().collect();
        Self {
            key,
            status_ids,
            account_ids,
        }
    }
}

#[async_trait]
impl Composition for TimelineComposition {
    type Output = Vec<Status>;

    fn is_affected(&self, change: &RecordChange) -> bool {
        change.statuses.iter().any(|id| self.status_ids.contains(id))
            || change.accounts.iter().any(|id| self.account_ids.contains(id))
    }

    async fn compose(&self, db: &Database) -> Result<Option<Vec<Status>>> {
        compose_timeline(db, &self.key).await.map(Some)
    }
}
