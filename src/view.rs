//! Presentation state machines
//!
//! One view model per screen. Each owns a `ViewState` watch channel the
//! presentation layer renders from, a set of event handlers the layer
//! calls, and a `run()` pump that drives the repository's live query into
//! the state. `Loading` is entered exactly once per view model: appearance
//! events after the first are ignored, so navigation back to a screen
//! re-renders from cache instead of refetching.

use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

use crate::entity::{Account, Status};
use crate::error::{AppError, Result};
use crate::repository::{AccountRepository, StatusRepository, TimelineRepository};

#[derive(Debug, Clone)]
pub enum ViewState<T> {
    Initial,
    Loading,
    Empty,
    HasData(T),
    Failed(Arc<AppError>),
}

impl<T> ViewState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::HasData(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ViewState::Failed(_))
    }
}

/// Shared `on_appear` guard + fetch-and-fail transition.
async fn appear<T, F>(
    appeared: &AtomicBool,
    state: &watch::Sender<ViewState<T>>,
    fetch: F,
) where
    F: Future<Output = Result<()>>,
{
    if appeared.swap(true, Ordering::SeqCst) {
        return;
    }
    state.send_replace(ViewState::Loading);
    if let Err(e) = fetch.await {
        tracing::warn!(error = %e, "Initial fetch failed");
        state.send_replace(ViewState::Failed(Arc::new(e)));
    }
}

pub struct TimelineViewModel {
    repository: Arc<TimelineRepository>,
    state: watch::Sender<ViewState<Vec<Status>>>,
    appeared: AtomicBool,
}

impl TimelineViewModel {
    pub fn new(repository: Arc<TimelineRepository>) -> Self {
        let (state, _) = watch::channel(ViewState::Initial);
        Self {
            repository,
            state,
            appeared: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> watch::Receiver<ViewState<Vec<Status>>> {
        self.state.subscribe()
    }

    pub async fn on_appear(&self) {
        appear(&self.appeared, &self.state, async {
            self.repository.fetch_initial().await.map(|_| ())
        })
        .await;
    }

    /// End-reached pagination: fetch the next page when the status that
    /// appeared is the last cached one. A failed page fetch keeps the
    /// current state.
    pub async fn on_status_appear(&self, status_id: &str) {
        if !self.repository.is_last(status_id) {
            return;
        }
        if let Err(e) = self.repository.fetch_next().await {
            tracing::warn!(error = %e, "Next page fetch failed");
        }
    }

    pub async fn toggle_favourite(&self, status: &Status) {
        if let Err(e) = self.repository.toggle_favourite(status).await {
            tracing::warn!(error = %e, status_id = %status.id, "Favourite toggle failed");
        }
    }

    /// Drive live emissions into the state. Runs until the repository's
    /// watch stream ends; spawn it alongside the view model.
    pub async fn run(&self) {
        let mut watched = self.repository.watch();
        while let Some(statuses) = watched.next().await {
            let next = if statuses.is_empty() {
                ViewState::Empty
            } else {
                ViewState::HasData(statuses)
            };
            self.state.send_replace(next);
        }
    }
}

pub struct StatusDetailViewModel {
    repository: Arc<StatusRepository>,
    state: watch::Sender<ViewState<Status>>,
    appeared: AtomicBool,
}

impl StatusDetailViewModel {
    pub fn new(repository: Arc<StatusRepository>) -> Self {
        let (state, _) = watch::channel(ViewState::Initial);
        Self {
            repository,
            state,
            appeared: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> watch::Receiver<ViewState<Status>> {
        self.state.subscribe()
    }

    pub async fn on_appear(&self) {
        appear(&self.appeared, &self.state, self.repository.fetch_initial()).await;
    }

    pub async fn toggle_favourite(&self, status: &Status) {
        if let Err(e) = self.repository.toggle_favourite(status).await {
            tracing::warn!(error = %e, status_id = %status.id, "Favourite toggle failed");
        }
    }

    pub async fn run(&self) {
        let mut watched = self.repository.watch();
        while let Some(status) = watched.next().await {
            self.state.send_replace(ViewState::HasData(status));
        }
    }
}

pub struct ProfileViewModel {
    repository: Arc<AccountRepository>,
    state: watch::Sender<ViewState<Account>>,
    appeared: AtomicBool,
}

impl ProfileViewModel {
    pub fn new(repository: Arc<AccountRepository>) -> Self {
        let (state, _) = watch::channel(ViewState::Initial);
        Self {
            repository,
            state,
            appeared: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> watch::Receiver<ViewState<Account>> {
        self.state.subscribe()
    }

    pub async fn on_appear(&self) {
        appear(&self.appeared, &self.state, async {
            self.repository.fetch_initial().await.map(|_| ())
        })
        .await;
    }

    /// Submit a profile edit. The error is returned for the form to show;
    /// on success the watch pump refreshes the state.
    pub async fn update_profile(&self, display_name: String, note: Option<String>) -> Result<()> {
        self.repository.update_profile(display_name, note).await?;
        Ok(())
    }

    pub async fn run(&self) {
        let mut watched = self.repository.watch();
        while let Some(account) = watched.next().await {
            self.state.send_replace(ViewState::HasData(account));
        }
    }
}
