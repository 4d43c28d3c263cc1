//! HTTP client for the Mastodon REST API.

use std::sync::Arc;
use url::Url;

use crate::error::{AppError, Result, ServerReason};
use crate::remote::request::ApiRequest;

/// Supplies the bearer token at request time.
///
/// Credential storage is external to this crate; the callback is expected
/// to read from whatever secret store the host application uses.
pub type AccessTokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Typed HTTP client over a Mastodon-compatible API
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    access_token: AccessTokenProvider,
}

impl ApiClient {
    /// Create a client against `base_url` (including the version prefix,
    /// e.g. "https://mastodon.social/api/v1").
    pub fn new(base_url: Url, access_token: AccessTokenProvider) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fedicache/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            http,
            access_token,
        })
    }

    /// Send a typed request and decode the typed response.
    ///
    /// # Errors
    /// - `Network` for transport failures
    /// - `Server` for non-2xx responses, with the structured body if one
    ///   could be decoded
    /// - `Decode` for malformed success bodies
    pub async fn send<R: ApiRequest>(&self, request: &R) -> Result<R::Response> {
        let url = self.request_url(&request.path())?;

        let mut builder = self.http.request(request.method(), url);

        let query = request.query();
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = request.body() {
            builder = builder.json(&body);
        }
        if let Some(token) = (self.access_token)() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let reason = serde_json::from_slice::<ServerReason>(&bytes).ok();
            tracing::warn!(
                status = status.as_u16(),
                reason = reason.as_ref().map(|r| r.error.as_str()),
                "Remote request failed"
            );
            return Err(AppError::Server {
                status: status.as_u16(),
                reason,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn request_url(&self, path: &str) -> Result<Url> {
        // Url::join would drop the version prefix for absolute paths, so
        // splice the path onto the base manually.
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| AppError::Config(format!("invalid request URL {joined}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(
            Url::parse("https://mastodon.example/api/v1").unwrap(),
            Arc::new(|| None),
        )
        .unwrap()
    }

    #[test]
    fn request_url_keeps_version_prefix() {
        let url = client().request_url("/timelines/home").unwrap();
        assert_eq!(
            url.as_str(),
            "https://mastodon.example/api/v1/timelines/home"
        );
    }

    #[test]
    fn request_url_tolerates_trailing_base_slash() {
        let client = ApiClient::new(
            Url::parse("https://mastodon.example/api/v1/").unwrap(),
            Arc::new(|| None),
        )
        .unwrap();
        let url = client.request_url("statuses/1").unwrap();
        assert_eq!(url.as_str(), "https://mastodon.example/api/v1/statuses/1");
    }
}
