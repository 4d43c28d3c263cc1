//! SQLite persistence for normalized records
//!
//! All database access goes through this module. Writes are
//! identity-keyed total-replacement upserts (`INSERT … ON CONFLICT(id) DO
//! UPDATE`); batch writes run in one transaction and either fully commit
//! or leave prior state unchanged.
//!
//! Every committed write publishes a [`RecordChange`] on a broadcast
//! channel. Live watch streams (see `cache::store`) subscribe to it and
//! re-evaluate their composition on every change that intersects the
//! identities they reference. This is the process-wide notification path
//! that cross-repository consistency depends on: a write performed by any
//! component is observed by every active watcher on the shared handle.

use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::models::{AccountRecord, StatusRecord};
use crate::error::{AppError, Result};

const DEFAULT_CHANGE_BUFFER: usize = 256;

/// Identities touched by one committed write transaction
#[derive(Debug, Clone, Default)]
pub struct RecordChange {
    pub statuses: Vec<String>,
    pub accounts: Vec<String>,
}

impl RecordChange {
    pub fn touches_status(&self, id: &str) -> bool {
        self.statuses.iter().any(|s| s == id)
    }

    pub fn touches_account(&self, id: &str) -> bool {
        self.accounts.iter().any(|a| a == id)
    }
}

/// Database connection pool wrapper
///
/// One logical instance is shared (by `Arc`) across every repository in
/// the process; the watch machinery relies on all writes funnelling
/// through the same change channel.
pub struct Database {
    pool: Pool<Sqlite>,
    changes: broadcast::Sender<Arc<RecordChange>>,
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    pub async fn connect(path: &Path) -> Result<Self> {
        Self::connect_with_capacity(path, DEFAULT_CHANGE_BUFFER).await
    }

    /// Connect with an explicit change-notification buffer capacity.
    ///
    /// Watchers that lag more than `change_buffer` events recompose from
    /// scratch rather than replaying misses.
    pub async fn connect_with_capacity(path: &Path, change_buffer: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let (changes, _) = broadcast::channel(change_buffer.max(1));

        Ok(Self { pool, changes })
    }

    /// Subscribe to committed-write notifications.
    ///
    /// The receiver buffers events from the moment of subscription, so a
    /// watcher can subscribe first and query initial state afterwards
    /// without missing intervening writes.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RecordChange>> {
        self.changes.subscribe()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Upsert one account record (total replacement by id).
    pub async fn upsert_account(&self, account: &AccountRecord) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_account_on(&mut *conn, account).await?;
        drop(conn);

        self.publish(RecordChange {
            accounts: vec![account.id.clone()],
            ..Default::default()
        });
        Ok(())
    }

    /// Upsert one status record (total replacement by id).
    pub async fn upsert_status(&self, status: &StatusRecord) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_status_on(&mut *conn, status).await?;
        drop(conn);

        self.publish(RecordChange {
            statuses: vec![status.id.clone()],
            ..Default::default()
        });
        Ok(())
    }

    /// Upsert a batch of records atomically: all rows commit or none do,
    /// and exactly one change notification covers the whole batch.
    pub async fn upsert_batch(
        &self,
        statuses: &[StatusRecord],
        accounts: &[AccountRecord],
    ) -> Result<()> {
        if statuses.is_empty() && accounts.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for status in statuses {
            upsert_status_on(&mut *tx, status).await?;
        }
        for account in accounts {
            upsert_account_on(&mut *tx, account).await?;
        }
        tx.commit().await?;

        tracing::debug!(
            statuses = statuses.len(),
            accounts = accounts.len(),
            "Committed batch upsert"
        );

        self.publish(RecordChange {
            statuses: statuses.iter().map(|s| s.id.clone()).collect(),
            accounts: accounts.iter().map(|a| a.id.clone()).collect(),
        });
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_account(&self, id: &str) -> Result<Option<AccountRecord>> {
        let account =
            sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(account)
    }

    pub async fn get_status(&self, id: &str) -> Result<Option<StatusRecord>> {
        let status = sqlx::query_as::<_, StatusRecord>("SELECT * FROM statuses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(status)
    }

    /// Fetch account rows for a set of identities. Return order is
    /// storage-defined; callers needing a particular order must impose it.
    pub async fn get_accounts(&self, ids: &[String]) -> Result<Vec<AccountRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM accounts WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let accounts = builder
            .build_query_as::<AccountRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }

    /// Fetch status rows for a set of identities. Return order is
    /// storage-defined; callers needing a particular order must impose it.
    pub async fn get_statuses(&self, ids: &[String]) -> Result<Vec<StatusRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM statuses WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let statuses = builder
            .build_query_as::<StatusRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(statuses)
    }

    fn publish(&self, change: RecordChange) {
        // No receivers is fine; nothing is watching yet.
        let _ = self.changes.send(Arc::new(change));
    }
}

async fn upsert_account_on(
    conn: &mut SqliteConnection,
    account: &AccountRecord,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts (
            id, display_name, note, avatar, created_at,
            statuses_count, followers_count, following_count
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            display_name = excluded.display_name,
            note = excluded.note,
            avatar = excluded.avatar,
            created_at = excluded.created_at,
            statuses_count = excluded.statuses_count,
            followers_count = excluded.followers_count,
            following_count = excluded.following_count
        "#,
    )
    .bind(&account.id)
    .bind(&account.display_name)
    .bind(&account.note)
    .bind(&account.avatar)
    .bind(account.created_at)
    .bind(account.statuses_count)
    .bind(account.followers_count)
    .bind(account.following_count)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_status_on(conn: &mut SqliteConnection, status: &StatusRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO statuses (
            id, account_id, content, url, favourites_count, favourited,
            created_at, author_display_name, author_note, author_avatar,
            author_created_at, author_statuses_count,
            author_followers_count, author_following_count
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            account_id = excluded.account_id,
            content = excluded.content,
            url = excluded.url,
            favourites_count = excluded.favourites_count,
            favourited = excluded.favourited,
            created_at = excluded.created_at,
            author_display_name = excluded.author_display_name,
            author_note = excluded.author_note,
            author_avatar = excluded.author_avatar,
            author_created_at = excluded.author_created_at,
            author_statuses_count = excluded.author_statuses_count,
            author_followers_count = excluded.author_followers_count,
            author_following_count = excluded.author_following_count
        "#,
    )
    .bind(&status.id)
    .bind(&status.account_id)
    .bind(&status.content)
    .bind(&status.url)
    .bind(status.favourites_count)
    .bind(status.favourited)
    .bind(status.created_at)
    .bind(&status.author_display_name)
    .bind(&status.author_note)
    .bind(&status.author_avatar)
    .bind(status.author_created_at)
    .bind(status.author_statuses_count)
    .bind(status.author_followers_count)
    .bind(status.author_following_count)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
