//! Remote service access
//!
//! The `Remote` trait is the seam repositories depend on; `ApiClient`
//! implements it over HTTP. Tests substitute a mock or stub.

mod client;
mod request;

pub use client::{AccessTokenProvider, ApiClient};
pub use request::{
    ApiRequest, GetAccountCredential, GetAccountStatuses, GetHomeTimeline, GetStatus,
    PatchAccountCredential, PostStatusFavourite, PostStatusUnfavourite,
};

use async_trait::async_trait;

use crate::entity::{Account, Status};
use crate::error::Result;

/// Operations the repositories need from the remote service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Remote: Send + Sync {
    /// Home timeline page, newest first; `max_id` pages backwards.
    async fn home_timeline(&self, max_id: Option<String>) -> Result<Vec<Status>>;

    /// Statuses authored by one account, newest first.
    async fn account_statuses(
        &self,
        account_id: String,
        max_id: Option<String>,
    ) -> Result<Vec<Status>>;

    async fn status(&self, id: String) -> Result<Status>;

    async fn favourite_status(&self, id: String) -> Result<Status>;

    async fn unfavourite_status(&self, id: String) -> Result<Status>;

    /// The authenticated user's own account.
    async fn verify_credentials(&self) -> Result<Account>;

    async fn update_credentials(
        &self,
        display_name: String,
        note: Option<String>,
    ) -> Result<Account>;
}

#[async_trait]
impl Remote for ApiClient {
    async fn home_timeline(&self, max_id: Option<String>) -> Result<Vec<Status>> {
        self.send(&GetHomeTimeline {
            max_id,
            ..Default::default()
        })
        .await
    }

    async fn account_statuses(
        &self,
        account_id: String,
        max_id: Option<String>,
    ) -> Result<Vec<Status>> {
        let mut request = GetAccountStatuses::new(account_id);
        request.max_id = max_id;
        self.send(&request).await
    }

    async fn status(&self, id: String) -> Result<Status> {
        self.send(&GetStatus { id }).await
    }

    async fn favourite_status(&self, id: String) -> Result<Status> {
        self.send(&PostStatusFavourite { id }).await
    }

    async fn unfavourite_status(&self, id: String) -> Result<Status> {
        self.send(&PostStatusUnfavourite { id }).await
    }

    async fn verify_credentials(&self) -> Result<Account> {
        self.send(&GetAccountCredential).await
    }

    async fn update_credentials(
        &self,
        display_name: String,
        note: Option<String>,
    ) -> Result<Account> {
        self.send(&PatchAccountCredential { display_name, note })
            .await
    }
}
