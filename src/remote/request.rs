//! Request descriptions for the Mastodon REST API.
//!
//! Each request type declares its method, path, query and body; the
//! `ApiClient` turns one into an HTTP call and decodes the typed response.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::entity::{Account, Status};

/// A typed API request
pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String;

    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn body(&self) -> Option<Value> {
        None
    }
}

/// GET /timelines/home
#[derive(Debug, Clone, Default)]
pub struct GetHomeTimeline {
    pub max_id: Option<String>,
    pub since_id: Option<String>,
    pub min_id: Option<String>,
    pub limit: Option<u32>,
    pub local: Option<bool>,
}

impl ApiRequest for GetHomeTimeline {
    type Response = Vec<Status>;

    fn path(&self) -> String {
        "/timelines/home".to_string()
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(max_id) = &self.max_id {
            query.push(("max_id", max_id.clone()));
        }
        if let Some(since_id) = &self.since_id {
            query.push(("since_id", since_id.clone()));
        }
        if let Some(min_id) = &self.min_id {
            query.push(("min_id", min_id.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(local) = self.local {
            query.push(("local", local.to_string()));
        }
        query
    }
}

/// GET /accounts/{id}/statuses
#[derive(Debug, Clone)]
pub struct GetAccountStatuses {
    pub account_id: String,
    pub max_id: Option<String>,
    pub since_id: Option<String>,
    pub limit: Option<u32>,
    pub exclude_replies: Option<bool>,
    pub exclude_reblogs: Option<bool>,
}

impl GetAccountStatuses {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            max_id: None,
            since_id: None,
            limit: None,
            // Boosts and replies carry statuses this cache does not
            // normalize (reblog targets), so skip them by default.
            exclude_replies: Some(true),
            exclude_reblogs: Some(true),
        }
    }
}

impl ApiRequest for GetAccountStatuses {
    type Response = Vec<Status>;

    fn path(&self) -> String {
        format!("/accounts/{}/statuses", self.account_id)
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(max_id) = &self.max_id {
            query.push(("max_id", max_id.clone()));
        }
        if let Some(since_id) = &self.since_id {
            query.push(("since_id", since_id.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(exclude_replies) = self.exclude_replies {
            query.push(("exclude_replies", exclude_replies.to_string()));
        }
        if let Some(exclude_reblogs) = self.exclude_reblogs {
            query.push(("exclude_reblogs", exclude_reblogs.to_string()));
        }
        query
    }
}

/// GET /statuses/{id}
#[derive(Debug, Clone)]
pub struct GetStatus {
    pub id: String,
}

impl ApiRequest for GetStatus {
    type Response = Status;

    fn path(&self) -> String {
        format!("/statuses/{}", self.id)
    }
}

/// POST /statuses/{id}/favourite
#[derive(Debug, Clone)]
pub struct PostStatusFavourite {
    pub id: String,
}

impl ApiRequest for PostStatusFavourite {
    type Response = Status;

    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        format!("/statuses/{}/favourite", self.id)
    }
}

/// POST /statuses/{id}/unfavourite
#[derive(Debug, Clone)]
pub struct PostStatusUnfavourite {
    pub id: String,
}

impl ApiRequest for PostStatusUnfavourite {
    type Response = Status;

    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        format!("/statuses/{}/unfavourite", self.id)
    }
}

/// GET /accounts/verify_credentials
#[derive(Debug, Clone, Default)]
pub struct GetAccountCredential;

impl ApiRequest for GetAccountCredential {
    type Response = Account;

    fn path(&self) -> String {
        "/accounts/verify_credentials".to_string()
    }
}

/// PATCH /accounts/update_credentials
#[derive(Debug, Clone)]
pub struct PatchAccountCredential {
    pub display_name: String,
    pub note: Option<String>,
}

impl ApiRequest for PatchAccountCredential {
    type Response = Account;

    fn method(&self) -> Method {
        Method::PATCH
    }

    fn path(&self) -> String {
        "/accounts/update_credentials".to_string()
    }

    fn body(&self) -> Option<Value> {
        Some(serde_json::json!({
            "display_name": self.display_name,
            "note": self.note,
        }))
    }
}
