//! Normalized records
//!
//! Rust structs representing the identity-keyed rows the cache persists.
//! Upserts are total replacements; there is no partial-field merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Account, Status};

/// One row per account identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountRecord {
    pub id: String,
    pub display_name: String,
    pub note: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub statuses_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

impl AccountRecord {
    pub fn from_entity(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            display_name: account.display_name.clone(),
            note: account.note.clone(),
            avatar: account.avatar.clone(),
            created_at: account.created_at,
            statuses_count: account.statuses_count,
            followers_count: account.followers_count,
            following_count: account.following_count,
        }
    }

    pub fn to_entity(&self) -> Account {
        Account {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            note: self.note.clone(),
            avatar: self.avatar.clone(),
            created_at: self.created_at,
            statuses_count: self.statuses_count,
            followers_count: self.followers_count,
            following_count: self.following_count,
        }
    }
}

/// One row per status identity
///
/// `account_id` references an `AccountRecord` that may not have been
/// stored yet. The `author_*` columns keep the author's display fields as
/// they were at write time; composed reads use them whenever the accounts
/// table has no row for `account_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusRecord {
    pub id: String,
    pub account_id: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub favourites_count: i64,
    pub favourited: bool,
    pub created_at: DateTime<Utc>,
    pub author_display_name: String,
    pub author_note: String,
    pub author_avatar: String,
    pub author_created_at: DateTime<Utc>,
    pub author_statuses_count: i64,
    pub author_followers_count: i64,
    pub author_following_count: i64,
}

impl StatusRecord {
    pub fn from_entity(status: &Status) -> Self {
        Self {
            id: status.id.clone(),
            account_id: status.account.id.clone(),
            content: status.content.clone(),
            url: status.url.clone(),
            favourites_count: status.favourites_count,
            favourited: status.is_favourited(),
            created_at: status.created_at,
            author_display_name: status.account.display_name.clone(),
            author_note: status.account.note.clone(),
            author_avatar: status.account.avatar.clone(),
            author_created_at: status.account.created_at,
            author_statuses_count: status.account.statuses_count,
            author_followers_count: status.account.followers_count,
            author_following_count: status.account.following_count,
        }
    }

    /// Compose the read-time view. The latest account row wins; the
    /// write-time snapshot fills in when the account was never stored.
    pub fn compose(&self, account: Option<&AccountRecord>) -> Status {
        let account = account
            .map(AccountRecord::to_entity)
            .unwrap_or_else(|| self.snapshot_account());
        Status {
            id: self.id.clone(),
            account,
            content: self.content.clone(),
            url: self.url.clone(),
            favourites_count: self.favourites_count,
            favourited: Some(self.favourited),
            created_at: self.created_at,
        }
    }

    fn snapshot_account(&self) -> Account {
        Account {
            id: self.account_id.clone(),
            display_name: self.author_display_name.clone(),
            note: self.author_note.clone(),
            avatar: self.author_avatar.clone(),
            created_at: self.author_created_at,
            statuses_count: self.author_statuses_count,
            followers_count: self.author_followers_count,
            following_count: self.author_following_count,
        }
    }
}
