//! Zeeguu API transport.
//!
//! - [`FeedApi`] is the seam the subscription manager and article list talk
//!   through; tests substitute in-memory fakes.
//! - [`ZeeguuClient`] is the HTTP implementation.

mod client;
mod types;

use std::future::Future;

pub use client::ZeeguuClient;
pub use types::{ApiError, Article, Feed, FeedId, Reply};

/// Operations the client needs from the Zeeguu server.
///
/// Returned futures must be `Send` so they can be driven from spawned tasks.
pub trait FeedApi: Send + Sync + 'static {
    /// All feeds the current session follows.
    fn feeds_being_followed(&self) -> impl Future<Output = Result<Vec<Feed>, ApiError>> + Send;

    /// Start following a feed. The server answers with a bare `OK` on success.
    fn follow_feed(&self, feed_id: FeedId) -> impl Future<Output = Result<Reply, ApiError>> + Send;

    /// Stop following a feed. The server answers with a bare `OK` on success.
    fn unfollow_feed(
        &self,
        feed_id: FeedId,
    ) -> impl Future<Output = Result<Reply, ApiError>> + Send;

    /// Recent items of one feed.
    fn feed_items(
        &self,
        feed_id: FeedId,
    ) -> impl Future<Output = Result<Vec<Article>, ApiError>> + Send;

    /// Feeds suggested for a language, used by the add-feed catalog.
    fn interesting_feeds(
        &self,
        language: &str,
    ) -> impl Future<Output = Result<Vec<Feed>, ApiError>> + Send;
}
