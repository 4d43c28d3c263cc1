//! Cache keys
//!
//! A cache key names the identity (or ordered set of identities) a
//! consumer currently wants displayed, decoupled from the payload that
//! last populated the store. Keys are immutable values; trackers replace
//! them wholesale, never mutate them in place.

/// The account currently being watched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCacheKey {
    pub account_id: String,
}

impl AccountCacheKey {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }
}

/// The single composed status currently being watched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCacheKey {
    pub status_id: String,
    pub account: AccountCacheKey,
}

impl StatusCacheKey {
    pub fn new(status_id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            status_id: status_id.into(),
            account: AccountCacheKey::new(account_id),
        }
    }
}

/// The ordered list of composed statuses currently being watched
///
/// Order is pagination order and is independent of storage order. Keys
/// grow by concatenation on every page fetch and are never pruned, so a
/// long-lived timeline key grows without bound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimelineCacheKey {
    pub statuses: Vec<StatusCacheKey>,
}

impl TimelineCacheKey {
    pub fn new(statuses: Vec<StatusCacheKey>) -> Self {
        Self { statuses }
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Pagination cursor: the trailing status identity.
    pub fn last_status_id(&self) -> Option<&str> {
        self.statuses.last().map(|key| key.status_id.as_str())
    }

    /// Status identities in key order.
    pub fn status_ids(&self) -> Vec<String> {
        self.statuses
            .iter()
            .map(|key| key.status_id.clone())
            .collect()
    }

    /// Referenced account identities, deduplicated, in first-seen order.
    pub fn account_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.statuses
            .iter()
            .filter(|key| seen.insert(key.account.account_id.as_str()))
            .map(|key| key.account.account_id.clone())
            .collect()
    }

    /// The key for the prior pages followed by `next`.
    pub fn concat(&self, next: TimelineCacheKey) -> TimelineCacheKey {
        let mut statuses = self.statuses.clone();
        statuses.extend(next.statuses);
        TimelineCacheKey { statuses }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_appends_in_order() {
        let first = TimelineCacheKey::new(vec![
            StatusCacheKey::new("s1", "a1"),
            StatusCacheKey::new("s2", "a1"),
        ]);
        let second = TimelineCacheKey::new(vec![StatusCacheKey::new("s3", "a2")]);

        let combined = first.concat(second);
        assert_eq!(combined.status_ids(), vec!["s1", "s2", "s3"]);
        assert_eq!(combined.last_status_id(), Some("s3"));
    }

    #[test]
    fn account_ids_are_deduplicated_in_first_seen_order() {
        let key = TimelineCacheKey::new(vec![
            StatusCacheKey::new("s1", "a2"),
            StatusCacheKey::new("s2", "a1"),
            StatusCacheKey::new("s3", "a2"),
        ]);
        assert_eq!(key.account_ids(), vec!["a2", "a1"]);
    }

    #[test]
    fn empty_key_has_no_cursor() {
        let key = TimelineCacheKey::default();
        assert!(key.is_empty());
        assert_eq!(key.last_status_id(), None);
    }
}
