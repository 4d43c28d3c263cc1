//! fedicache - a normalized reactive cache for Mastodon-style clients
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Presentation Layer                        │
//! │  - View models (state machine per screen)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Repository Layer                          │
//! │  - Fetch / paginate / mutate orchestration                 │
//! │  - Live watch via cache keys                               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Cache + Data Layer        Remote Layer           │
//! │  - Normalized store (SQLite/sqlx)    - Mastodon REST       │
//! │  - Cache key trackers                  client (reqwest)    │
//! │  - Change notifications                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All repositories share one [`cache::NormalizedStore`]: records are
//! stored once per identity, so a mutation issued through any surface is
//! observed by every live watcher that references the same identity.
//!
//! # Modules
//!
//! - `entity`: Mastodon wire entities
//! - `remote`: typed HTTP client and the `Remote` trait
//! - `data`: SQLite records, upserts, change notifications, normalization
//! - `cache`: cache keys, key trackers, the normalized store, live watch
//! - `repository`: per-surface fetch/mutate/watch orchestrators
//! - `view`: presentation state machines
//! - `config`: configuration management
//! - `error`: error types

pub mod cache;
pub mod config;
pub mod data;
pub mod entity;
pub mod error;
pub mod remote;
pub mod repository;
pub mod view;

use std::sync::Arc;

/// Application state shared across all consumer surfaces
///
/// Owns the single database handle and normalized store; repositories
/// built from it all observe each other's writes.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database handle (shared, owns the change channel)
    pub db: Arc<data::Database>,

    /// Normalized store over `db`
    pub store: cache::NormalizedStore,

    /// Remote API client
    pub remote: Arc<dyn remote::Remote>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to the SQLite database (runs migrations)
    /// 2. Build the normalized store over the shared handle
    /// 3. Build the HTTP client with the configured credentials
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect_with_capacity(
            &config.database.path,
            config.cache.change_buffer,
        )
        .await?;
        tracing::info!("Database connected");

        let db = Arc::new(db);
        let store = cache::NormalizedStore::new(db.clone());

        let token = config.auth.access_token.clone();
        let client = remote::ApiClient::new(
            config.remote.base_url.clone(),
            Arc::new(move || token.clone()),
        )?;
        tracing::info!(base_url = %config.remote.base_url, "Remote client initialized");

        Ok(Self {
            config: Arc::new(config),
            db,
            store,
            remote: Arc::new(client),
        })
    }

    pub fn home_timeline(&self) -> repository::TimelineRepository {
        repository::TimelineRepository::home(self.remote.clone(), self.store.clone())
    }

    pub fn user_timeline(&self, account_id: String) -> repository::TimelineRepository {
        repository::TimelineRepository::account(self.remote.clone(), self.store.clone(), account_id)
    }

    pub fn status_detail(&self, status_id: String) -> repository::StatusRepository {
        repository::StatusRepository::new(self.remote.clone(), self.store.clone(), status_id)
    }

    pub fn profile(&self) -> repository::AccountRepository {
        repository::AccountRepository::new(self.remote.clone(), self.store.clone())
    }
}
