use super::types::{ApiError, Article, Feed, FeedId, Reply};
use super::FeedApi;
use futures::StreamExt;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

const GET_FEEDS_BEING_FOLLOWED: &str = "get_feeds_being_followed";
const FOLLOW_FEED_ENDPOINT: &str = "start_following_feed";
const UNFOLLOW_FEED_ENDPOINT: &str = "stop_following_feed";
const FEED_ITEMS_ENDPOINT: &str = "get_feed_items_with_metrics";
const INTERESTING_FEEDS_ENDPOINT: &str = "interesting_feeds";

/// HTTP client for the Zeeguu API.
///
/// Every request carries the session id as a `session` query parameter when
/// one is configured.
pub struct ZeeguuClient {
    http: reqwest::Client,
    base: Url,
    session: Option<SecretString>,
    timeout: Duration,
}

impl std::fmt::Debug for ZeeguuClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZeeguuClient")
            .field("base", &self.base.as_str())
            .field("session", &self.session.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ZeeguuClient {
    /// Create a client for `base_url`.
    ///
    /// The base URL must be HTTPS, except for `localhost`/`127.0.0.1` which
    /// may use plain HTTP so tests can run against a local mock server.
    pub fn new(
        base_url: &str,
        session: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        match base.scheme() {
            "https" => {}
            "http" if matches!(base.host_str(), Some("localhost") | Some("127.0.0.1")) => {
                tracing::warn!(base_url = %base, "Using non-HTTPS Zeeguu base URL (localhost only)");
            }
            "http" => {
                tracing::error!(base_url = %base, "Rejecting non-HTTPS base URL (HTTPS required except for localhost)");
                return Err(ApiError::InsecureBaseUrl);
            }
            other => {
                return Err(ApiError::InvalidBaseUrl(format!(
                    "unsupported scheme {other:?}"
                )))
            }
        }

        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("zeeguu-feeds/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base,
            session,
            timeout,
        })
    }

    /// Build the URL for an endpoint, appending path segments and the session.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);

        if let Some(session) = &self.session {
            url.query_pairs_mut()
                .append_pair("session", session.expose_secret());
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        // The body stream is not covered by the send timeout above.
        tokio::time::timeout(self.timeout, read_limited_text(response, MAX_RESPONSE_SIZE))
            .await
            .map_err(|_| ApiError::Timeout)?
    }

    async fn get_text(&self, segments: &[&str]) -> Result<String, ApiError> {
        let url = self.endpoint(segments)?;
        self.send(self.http.get(url)).await
    }
}

impl FeedApi for ZeeguuClient {
    async fn feeds_being_followed(&self) -> Result<Vec<Feed>, ApiError> {
        let body = self.get_text(&[GET_FEEDS_BEING_FOLLOWED]).await?;
        let feeds = decode_feeds(&body)?;
        tracing::debug!(count = feeds.len(), "Fetched followed feeds");
        Ok(feeds)
    }

    async fn follow_feed(&self, feed_id: FeedId) -> Result<Reply, ApiError> {
        let url = self.endpoint(&[FOLLOW_FEED_ENDPOINT])?;
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("feed_id", &feed_id.to_string())
            .finish();

        tracing::debug!(feed_id, "Sending follow request");
        let request = self
            .http
            .post(url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(form);
        let body = self.send(request).await?;
        Ok(Reply::new(body))
    }

    async fn unfollow_feed(&self, feed_id: FeedId) -> Result<Reply, ApiError> {
        tracing::debug!(feed_id, "Sending unfollow request");
        let id = feed_id.to_string();
        let body = self.get_text(&[UNFOLLOW_FEED_ENDPOINT, &id]).await?;
        Ok(Reply::new(body))
    }

    async fn feed_items(&self, feed_id: FeedId) -> Result<Vec<Article>, ApiError> {
        let id = feed_id.to_string();
        let body = self.get_text(&[FEED_ITEMS_ENDPOINT, &id]).await?;
        let articles = decode_articles(&body)?;
        tracing::debug!(feed_id, count = articles.len(), "Fetched feed items");
        Ok(articles)
    }

    async fn interesting_feeds(&self, language: &str) -> Result<Vec<Feed>, ApiError> {
        let body = self.get_text(&[INTERESTING_FEEDS_ENDPOINT, language]).await?;
        decode_feeds(&body)
    }
}

/// Decode a JSON array of feeds, skipping entries without a usable id.
///
/// One malformed entry should not hide every other subscription.
fn decode_feeds(body: &str) -> Result<Vec<Feed>, ApiError> {
    let raw: Vec<Value> = serde_json::from_str(body)?;
    let mut feeds = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<Feed>(value) {
            Ok(feed) => feeds.push(feed),
            Err(e) => tracing::warn!(error = %e, "Skipping malformed feed entry"),
        }
    }
    Ok(feeds)
}

/// Decode a JSON array of feed items, skipping entries that do not fit.
fn decode_articles(body: &str) -> Result<Vec<Article>, ApiError> {
    let raw: Vec<Value> = serde_json::from_str(body)?;
    let mut articles = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<Article>(value) {
            Ok(article) => articles.push(article),
            Err(e) => tracing::warn!(error = %e, "Skipping malformed feed item"),
        }
    }
    Ok(articles)
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ApiError::InvalidUtf8)
}
