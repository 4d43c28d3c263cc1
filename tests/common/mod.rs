//! Common test utilities for E2E tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use fedicache::cache::NormalizedStore;
use fedicache::data::Database;
use fedicache::entity::{Account, Status};
use fedicache::error::{AppError, Result};
use fedicache::remote::Remote;

/// Shared store over a temporary database
pub struct TestHarness {
    pub db: Arc<Database>,
    pub store: NormalizedStore,
    pub _temp_dir: TempDir,
}

impl TestHarness {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );
        let store = NormalizedStore::new(db.clone());
        Self {
            db,
            store,
            _temp_dir: temp_dir,
        }
    }
}

pub fn account(id: &str, display_name: &str) -> Account {
    Account {
        id: id.to_string(),
        display_name: display_name.to_string(),
        note: format!("<p>{display_name}'s bio</p>"),
        avatar: format!("https://files.example/{id}.png"),
        created_at: Utc::now(),
        statuses_count: 1,
        followers_count: 10,
        following_count: 5,
    }
}

pub fn status(id: &str, author: Account, content: &str) -> Status {
    Status {
        id: id.to_string(),
        account: author,
        content: Some(format!("<p>{content}</p>")),
        url: Some(format!("https://mastodon.example/statuses/{id}")),
        favourites_count: 0,
        favourited: Some(false),
        created_at: Utc::now(),
    }
}

/// Scripted remote: pages are served in the order they were enqueued, and
/// favourite/unfavourite mutate a canonical server-side copy so repeated
/// calls behave like a real instance.
pub struct StubRemote {
    home_pages: Mutex<VecDeque<Vec<Status>>>,
    account_pages: Mutex<VecDeque<Vec<Status>>>,
    server: Mutex<HashMap<String, Status>>,
    credential: Mutex<Option<Account>>,
}

impl StubRemote {
    pub fn new() -> Self {
        Self {
            home_pages: Mutex::new(VecDeque::new()),
            account_pages: Mutex::new(VecDeque::new()),
            server: Mutex::new(HashMap::new()),
            credential: Mutex::new(None),
        }
    }

    pub fn push_home_page(&self, page: Vec<Status>) {
        let mut server = self.server.lock().unwrap();
        for status in &page {
            server.insert(status.id.clone(), status.clone());
        }
        self.home_pages.lock().unwrap().push_back(page);
    }

    pub fn push_account_page(&self, page: Vec<Status>) {
        let mut server = self.server.lock().unwrap();
        for status in &page {
            server.insert(status.id.clone(), status.clone());
        }
        self.account_pages.lock().unwrap().push_back(page);
    }

    pub fn set_credential(&self, account: Account) {
        *self.credential.lock().unwrap() = Some(account);
    }

    fn not_found() -> AppError {
        AppError::Server {
            status: 404,
            reason: None,
        }
    }
}

#[async_trait]
impl Remote for StubRemote {
    async fn home_timeline(&self, _max_id: Option<String>) -> Result<Vec<Status>> {
        Ok(self
            .home_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn account_statuses(
        &self,
        _account_id: String,
        _max_id: Option<String>,
    ) -> Result<Vec<Status>> {
        Ok(self
            .account_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn status(&self, id: String) -> Result<Status> {
        self.server
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    async fn favourite_status(&self, id: String) -> Result<Status> {
        let mut server = self.server.lock().unwrap();
        let status = server.get_mut(&id).ok_or_else(Self::not_found)?;
        if !status.is_favourited() {
            status.favourited = Some(true);
            status.favourites_count += 1;
        }
        Ok(status.clone())
    }

    async fn unfavourite_status(&self, id: String) -> Result<Status> {
        let mut server = self.server.lock().unwrap();
        let status = server.get_mut(&id).ok_or_else(Self::not_found)?;
        if status.is_favourited() {
            status.favourited = Some(false);
            status.favourites_count -= 1;
        }
        Ok(status.clone())
    }

    async fn verify_credentials(&self) -> Result<Account> {
        self.credential
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(Self::not_found)
    }

    async fn update_credentials(
        &self,
        display_name: String,
        note: Option<String>,
    ) -> Result<Account> {
        let mut credential = self.credential.lock().unwrap();
        let account = credential.as_mut().ok_or_else(Self::not_found)?;
        account.display_name = display_name;
        if let Some(note) = note {
            account.note = note;
        }
        Ok(account.clone())
    }
}
