//! Entity normalization
//!
//! Pure splitting of fetched, denormalized entity graphs (a status with
//! its author embedded) into independent per-identity records plus the
//! cache key describing their relationship.

use std::collections::HashMap;

use crate::cache::{AccountCacheKey, StatusCacheKey, TimelineCacheKey};
use crate::data::models::{AccountRecord, StatusRecord};
use crate::entity::{Account, Status};

/// Split one status into its status record, its author's account record
/// and the cache key tying them together.
pub fn normalize_status(status: &Status) -> (StatusRecord, AccountRecord, StatusCacheKey) {
    let record = StatusRecord::from_entity(status);
    let account = AccountRecord::from_entity(&status.account);
    let key = StatusCacheKey::new(&status.id, &status.account.id);
    (record, account, key)
}

/// Normalize one account on its own.
pub fn normalize_account(account: &Account) -> (AccountRecord, AccountCacheKey) {
    (
        AccountRecord::from_entity(account),
        AccountCacheKey::new(&account.id),
    )
}

/// Split a fetched page into records plus an ordered timeline key.
///
/// The key preserves the response order. Account records are deduplicated
/// by identity with the last occurrence winning, matching the store's
/// last-write-replaces-all merge policy.
pub fn normalize_timeline(
    statuses: &[Status],
) -> (Vec<StatusRecord>, Vec<AccountRecord>, TimelineCacheKey) {
    let mut records = Vec::with_capacity(statuses.len());
    let mut keys = Vec::with_capacity(statuses.len());
    let mut accounts: Vec<AccountRecord> = Vec::new();
    let mut account_index: HashMap<String, usize> = HashMap::new();

    for status in statuses {
        let (record, account, key) = normalize_status(status);
        records.push(record);
        keys.push(key);

        match account_index.get(&account.id) {
            Some(&index) => accounts[index] = account,
            None => {
                account_index.insert(account.id.clone(), accounts.len());
                accounts.push(account);
            }
        }
    }

    (records, accounts, TimelineCacheKey::new(keys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn status(id: &str, account_id: &str, display_name: &str) -> Status {
        Status {
            id: id.to_string(),
            account: Account {
                id: account_id.to_string(),
                display_name: display_name.to_string(),
                note: String::new(),
                avatar: String::new(),
                created_at: Utc::now(),
                statuses_count: 0,
                followers_count: 0,
                following_count: 0,
            },
            content: None,
            url: None,
            favourites_count: 0,
            favourited: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn normalize_status_splits_author_out() {
        let (record, account, key) = normalize_status(&status("s1", "a1", "Alice"));
        assert_eq!(record.id, "s1");
        assert_eq!(record.account_id, "a1");
        assert_eq!(account.id, "a1");
        assert_eq!(key, StatusCacheKey::new("s1", "a1"));
    }

    #[test]
    fn normalize_timeline_keeps_response_order_and_dedups_authors() {
        let page = vec![
            status("s1", "a1", "Alice"),
            status("s2", "a1", "Alicia"),
            status("s3", "a2", "Bob"),
        ];

        let (records, accounts, key) = normalize_timeline(&page);
        assert_eq!(records.len(), 3);
        assert_eq!(key.status_ids(), vec!["s1", "s2", "s3"]);

        // Duplicate author collapses to a single record, last write wins.
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, "a1");
        assert_eq!(accounts[0].display_name, "Alicia");
        assert_eq!(accounts[1].id, "a2");
    }
}
