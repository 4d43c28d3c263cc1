//! Fetched and composed view entities.
//!
//! These are the denormalized shapes the remote service speaks: a `Status`
//! carries its author embedded. The same shapes are produced by the cache's
//! join-on-read composition, so a presentation layer only ever sees one
//! form of the data.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A Mastodon account as fetched or composed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: String,
    pub display_name: String,
    pub note: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub statuses_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

impl Account {
    /// Bio text with HTML markup removed
    pub fn normalized_note(&self) -> String {
        strip_html(&self.note)
    }
}

/// A status (post) with its author embedded
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Status {
    pub id: String,
    pub account: Account,
    pub content: Option<String>,
    pub url: Option<String>,
    pub favourites_count: i64,
    /// Absent on responses for unauthenticated requests
    pub favourited: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl Status {
    pub fn is_favourited(&self) -> bool {
        self.favourited.unwrap_or(false)
    }

    /// Body text with HTML markup removed
    pub fn normalized_content(&self) -> Option<String> {
        self.content.as_deref().map(strip_html)
    }
}

/// Drop HTML tags and decode entities. Statuses arrive as sanitized HTML
/// fragments, so a tag scan plus entity decoding is sufficient here.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    html_escape::decode_html_entities(&text).trim().to_string()
}
