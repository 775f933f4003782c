use super::pending::InFlight;
use crate::api::{ApiError, Feed, FeedApi, FeedId, Reply};
use crate::articles::ArticleSink;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Completion of a request issued by [`SubscriptionList`].
///
/// Produced on a background task and handed back to the event loop, which
/// passes it to [`SubscriptionList::handle_event`].
#[derive(Debug)]
pub enum SubscriptionEvent {
    /// The followed-feeds listing came back.
    Loaded {
        generation: u64,
        result: Result<Vec<Feed>, ApiError>,
    },
    /// A follow request finished.
    Followed {
        feed: Feed,
        generation: u64,
        result: Result<Reply, ApiError>,
    },
    /// An unfollow request finished.
    Unfollowed {
        feed: Feed,
        generation: u64,
        result: Result<Reply, ApiError>,
    },
}

/// The subscribed feeds, their rendered rows, and the article list they drive.
///
/// Follow and unfollow are applied locally first and confirmed or reverted
/// when the server answers. Overlapping requests for one feed settle together
/// once the last of them completes; the newest one the server accepted
/// decides whether the feed stays.
pub struct SubscriptionList<A, L> {
    api: Arc<A>,
    events: mpsc::Sender<SubscriptionEvent>,
    articles: L,
    /// Rendered rows in insertion order. Same ids as `followed`.
    rows: Vec<Feed>,
    followed: HashSet<FeedId>,
    in_flight: InFlight,
    load_generation: u64,
    empty_prompt: bool,
}

impl<A: FeedApi, L: ArticleSink> SubscriptionList<A, L> {
    pub fn new(api: Arc<A>, articles: L, events: mpsc::Sender<SubscriptionEvent>) -> Self {
        Self {
            api,
            events,
            articles,
            rows: Vec::new(),
            followed: HashSet::new(),
            in_flight: InFlight::default(),
            load_generation: 0,
            empty_prompt: false,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn rows(&self) -> &[Feed] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Feed> {
        self.rows.get(index)
    }

    pub fn contains(&self, feed_id: FeedId) -> bool {
        self.followed.contains(&feed_id)
    }

    pub fn len(&self) -> usize {
        self.followed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.followed.is_empty()
    }

    /// Whether the "no feeds" prompt should be shown.
    pub fn shows_empty_prompt(&self) -> bool {
        self.empty_prompt
    }

    /// Whether a follow/unfollow for this feed is still waiting on the server.
    pub fn is_pending(&self, feed_id: FeedId) -> bool {
        self.in_flight.is_pending(feed_id)
    }

    pub fn articles(&self) -> &L {
        &self.articles
    }

    pub fn articles_mut(&mut self) -> &mut L {
        &mut self.articles
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Fetch the followed feeds from the server and add them.
    ///
    /// Only the most recent load is applied when several overlap.
    pub fn load(&mut self) {
        self.load_generation = self.load_generation.wrapping_add(1);
        let generation = self.load_generation;
        tracing::debug!(generation, "Loading followed feeds");

        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = api.feeds_being_followed().await;
            SubscriptionEvent::Loaded { generation, result }
        });
    }

    /// Remove every row and clear the article list. The server is untouched.
    ///
    /// Requests still in flight keep their per-feed entries and settle
    /// normally when they complete.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.followed.clear();
        self.articles.clear();
        self.update_empty_prompt();
    }

    /// Clear, then load from scratch.
    pub fn refresh(&mut self) {
        tracing::info!("Refreshing subscription list");
        self.clear();
        self.load();
    }

    /// Follow `feed`: show it immediately, ask the server, revert on failure.
    pub fn follow(&mut self, feed: Feed) {
        let generation = self.in_flight.begin(feed.id, self.contains(feed.id));
        let added = self.add_subscription(&feed);
        tracing::info!(feed_id = feed.id, added, generation, "Following feed");

        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = api.follow_feed(feed.id).await;
            SubscriptionEvent::Followed {
                feed,
                generation,
                result,
            }
        });
    }

    /// Unfollow `feed`: hide it immediately, ask the server, restore on failure.
    pub fn unfollow(&mut self, feed: Feed) {
        let generation = self.in_flight.begin(feed.id, self.contains(feed.id));
        self.remove(feed.id);
        tracing::info!(feed_id = feed.id, generation, "Unfollowing feed");

        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = api.unfollow_feed(feed.id).await;
            SubscriptionEvent::Unfollowed {
                feed,
                generation,
                result,
            }
        });
    }

    /// Apply a completed request to the local state.
    pub fn handle_event(&mut self, event: SubscriptionEvent) {
        match event {
            SubscriptionEvent::Loaded { generation, result } => {
                self.on_subscriptions_loaded(generation, result)
            }
            SubscriptionEvent::Followed {
                feed,
                generation,
                result,
            } => {
                let accepted = matches!(&result, Ok(reply) if reply.is_ok());
                if !accepted {
                    log_rejected("follow", feed.id, &result);
                }
                let Some(member) = self.in_flight.finish(feed.id, generation, accepted.then_some(true))
                else {
                    tracing::debug!(feed_id = feed.id, generation, "Follow reply recorded, newer request in flight");
                    return;
                };
                if member && accepted && self.contains(feed.id) {
                    self.articles.load(&feed);
                } else {
                    self.settle(&feed, member);
                }
            }
            SubscriptionEvent::Unfollowed {
                feed,
                generation,
                result,
            } => {
                let accepted = matches!(&result, Ok(reply) if reply.is_ok());
                if accepted {
                    tracing::debug!(feed_id = feed.id, "Unfollow confirmed");
                } else {
                    log_rejected("unfollow", feed.id, &result);
                }
                let Some(member) = self.in_flight.finish(feed.id, generation, accepted.then_some(false))
                else {
                    tracing::debug!(feed_id = feed.id, generation, "Unfollow reply recorded, newer request in flight");
                    return;
                };
                self.settle(&feed, member);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn on_subscriptions_loaded(&mut self, generation: u64, result: Result<Vec<Feed>, ApiError>) {
        if generation != self.load_generation {
            tracing::debug!(generation, latest = self.load_generation, "Ignoring superseded load");
            return;
        }

        let feeds = result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load followed feeds");
            Vec::new()
        });

        for feed in feeds {
            // The outstanding request for this feed decides its membership.
            if self.in_flight.is_pending(feed.id) {
                tracing::debug!(feed_id = feed.id, "Skipping feed with request in flight");
                continue;
            }
            if self.add_subscription(&feed) {
                self.articles.load(&feed);
            }
        }

        self.update_empty_prompt();
        tracing::info!(count = self.len(), "Subscription list loaded");
    }

    /// Success path of a follow: make sure the row exists and load articles.
    fn on_feed_followed(&mut self, feed: &Feed) {
        self.add_subscription(feed);
        self.articles.load(feed);
    }

    /// Bring the feed's row in line with its settled membership.
    fn settle(&mut self, feed: &Feed, member: bool) {
        match (member, self.contains(feed.id)) {
            (true, false) => self.on_feed_followed(feed),
            (false, true) => {
                self.remove(feed.id);
            }
            _ => {}
        }
    }

    /// Add a row for `feed` unless one exists. Returns whether it was added.
    fn add_subscription(&mut self, feed: &Feed) -> bool {
        if !self.followed.insert(feed.id) {
            return false;
        }
        self.rows.push(feed.clone());
        self.empty_prompt = false;
        true
    }

    /// Remove the row for `feed_id` and its articles. Returns whether it was present.
    fn remove(&mut self, feed_id: FeedId) -> bool {
        self.articles.remove(feed_id);
        let present = self.followed.remove(&feed_id);
        if !present {
            tracing::error!(feed_id, "Removed feed was not in the subscription list");
        }
        self.rows.retain(|row| row.id != feed_id);
        self.update_empty_prompt();
        present
    }

    fn update_empty_prompt(&mut self) {
        self.empty_prompt = self.followed.is_empty();
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = SubscriptionEvent> + Send + 'static,
    {
        let tx = self.events.clone();
        tokio::spawn(async move {
            let event = request.await;
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Failed to send subscription event (receiver dropped)");
            }
        });
    }
}

fn log_rejected(action: &str, feed_id: FeedId, outcome: &Result<Reply, ApiError>) {
    match outcome {
        Ok(reply) => {
            tracing::warn!(feed_id, action, reply = %reply.body(), "Server rejected request")
        }
        Err(e) => tracing::warn!(feed_id, action, error = %e, "Request failed"),
    }
}
