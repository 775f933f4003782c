use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors produced by the Zeeguu transport.
///
/// The subscription manager never inspects the variant: any error is folded
/// into the same rollback path as a non-`OK` reply. The variants exist for
/// logging and for the status bar.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Insecure API base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

// ============================================================================
// Feeds
// ============================================================================

/// Server-side identity of a feed.
pub type FeedId = i64;

/// A feed as sent by the server.
///
/// Only `id` is interpreted. Everything else lands in `display` untouched so
/// it can be handed to whatever renders the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(deserialize_with = "deserialize_feed_id")]
    pub id: FeedId,
    #[serde(flatten)]
    pub display: Map<String, Value>,
}

impl Feed {
    /// Build a feed with only a title in its display payload.
    pub fn with_title(id: FeedId, title: &str) -> Self {
        let mut display = Map::new();
        display.insert("title".to_string(), Value::String(title.to_string()));
        Self { id, display }
    }

    fn display_str(&self, key: &str) -> Option<&str> {
        self.display.get(key).and_then(Value::as_str)
    }

    /// Feed title, or an empty string when the server sent none.
    pub fn title(&self) -> &str {
        self.display_str("title").unwrap_or("")
    }

    pub fn description(&self) -> Option<&str> {
        self.display_str("description")
    }

    pub fn language(&self) -> Option<&str> {
        self.display_str("language")
    }
}

/// Feed ids arrive as numbers from some endpoints and as strings from others.
/// Both are accepted; anything that is not a positive integer is rejected.
fn deserialize_feed_id<'de, D>(deserializer: D) -> Result<FeedId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    let id = match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n,
        RawId::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid feed id {s:?}: {e}")))?,
    };

    if id <= 0 {
        return Err(serde::de::Error::custom(format!(
            "feed id must be positive, got {id}"
        )));
    }
    Ok(id)
}

// ============================================================================
// Articles
// ============================================================================

/// One item of a feed as listed by the server.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Article {
    #[serde(deserialize_with = "deserialize_null_as_empty")]
    pub title: String,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub published: Option<String>,
    pub language: Option<String>,
}

/// Some items carry `"title": null`; treat that like a missing title.
fn deserialize_null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Replies
// ============================================================================

/// Raw body of a follow/unfollow call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply(String);

impl Reply {
    /// The literal success sentinel the server answers with.
    pub const OK: &'static str = "OK";

    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn body(&self) -> &str {
        &self.0
    }

    /// True iff the server answered `OK`, optionally JSON-quoted.
    pub fn is_ok(&self) -> bool {
        let trimmed = self.0.trim();
        let unquoted = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(trimmed);
        unquoted == Self::OK
    }
}
