//! fedicache demo binary
//!
//! Fetches the home timeline, watches it live, and demonstrates a
//! favourite toggle propagating back into the watched stream.

use fedicache::{AppState, config, view};
use futures::StreamExt;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Initialize tracing/logging
/// 2. Load configuration from file and environment
/// 3. Initialize AppState
/// 4. Run a short watch-and-fetch demonstration
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing/logging
    let log_format =
        std::env::var("FEDICACHE__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "fedicache=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "fedicache=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting fedicache demo...");

    // 2. Load configuration
    let config = config::AppConfig::load()?;
    tracing::info!(
        base_url = %config.remote.base_url,
        database = %config.database.path.display(),
        "Configuration loaded"
    );

    // 3. Initialize application state
    let state = AppState::new(config).await?;

    // 4. Watch the home timeline, then fetch into it
    let repository = Arc::new(state.home_timeline());
    let view_model = Arc::new(view::TimelineViewModel::new(repository.clone()));

    let pump = {
        let view_model = view_model.clone();
        tokio::spawn(async move { view_model.run().await })
    };

    let mut timeline = repository.watch();

    view_model.on_appear().await;

    let Some(statuses) = timeline.next().await else {
        tracing::warn!("Timeline watch ended before the first emission");
        return Ok(());
    };
    tracing::info!(count = statuses.len(), "Home timeline");
    for status in &statuses {
        tracing::info!(
            id = %status.id,
            author = %status.account.display_name,
            favourited = status.is_favourited(),
            "{}",
            status.normalized_content().unwrap_or_default()
        );
    }

    // Toggle a favourite and watch the mutation come back through the
    // cache rather than through the mutation's return value.
    if let Some(first) = statuses.first() {
        view_model.toggle_favourite(first).await;

        if let Some(updated) = timeline.next().await {
            if let Some(status) = updated.iter().find(|s| s.id == first.id) {
                tracing::info!(
                    id = %status.id,
                    favourited = status.is_favourited(),
                    favourites = status.favourites_count,
                    "Favourite propagated through the cache"
                );
            }
        }
    }

    pump.abort();
    Ok(())
}
