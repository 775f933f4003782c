//! Article list driven by the subscription manager.
//!
//! The manager only needs the [`ArticleSink`] contract: load a feed's
//! articles, drop them, or clear everything. [`ArticleList`] is the concrete
//! list shown in the articles panel; it fetches items on a background task
//! and applies the result when the matching [`ArticleEvent`] comes back.

use crate::api::{ApiError, Article, Feed, FeedApi, FeedId};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What the subscription manager asks of the article list.
pub trait ArticleSink {
    /// Show the articles of `feed`, replacing any already shown for it.
    fn load(&mut self, feed: &Feed);
    /// Drop the articles of one feed.
    fn remove(&mut self, feed_id: FeedId);
    /// Drop everything.
    fn clear(&mut self);
}

/// Completion of a background article fetch.
#[derive(Debug)]
pub enum ArticleEvent {
    Loaded {
        feed_id: FeedId,
        generation: u64,
        result: Result<Vec<Article>, ApiError>,
    },
}

/// Load state of one feed's articles.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticlesState {
    Loading,
    Loaded(Vec<Article>),
    Failed(String),
}

/// Articles of one feed, in the order feeds were loaded.
#[derive(Debug, Clone)]
pub struct FeedArticles {
    pub feed: Feed,
    pub state: ArticlesState,
    generation: u64,
}

pub struct ArticleList<A> {
    api: Arc<A>,
    events: mpsc::Sender<ArticleEvent>,
    feeds: Vec<FeedArticles>,
    generation: u64,
}

impl<A: FeedApi> ArticleList<A> {
    pub fn new(api: Arc<A>, events: mpsc::Sender<ArticleEvent>) -> Self {
        Self {
            api,
            events,
            feeds: Vec::new(),
            generation: 0,
        }
    }

    pub fn feeds(&self) -> &[FeedArticles] {
        &self.feeds
    }

    /// Loaded articles flattened across feeds, paired with their feed.
    pub fn articles(&self) -> impl Iterator<Item = (&Feed, &Article)> {
        self.feeds.iter().flat_map(|entry| {
            let articles: &[Article] = match &entry.state {
                ArticlesState::Loaded(articles) => articles,
                _ => &[],
            };
            articles.iter().map(move |a| (&entry.feed, a))
        })
    }

    pub fn article_count(&self) -> usize {
        self.articles().count()
    }

    pub fn is_loading(&self) -> bool {
        self.feeds
            .iter()
            .any(|entry| entry.state == ArticlesState::Loading)
    }

    /// Show only `feed`'s articles: drop every other feed and reload this one.
    pub fn show_only(&mut self, feed: &Feed) {
        tracing::debug!(feed_id = feed.id, "Showing a single feed");
        self.clear();
        self.load(feed);
    }

    /// Apply a finished fetch. Results for feeds that were removed or
    /// reloaded since the fetch started are dropped.
    pub fn handle_event(&mut self, event: ArticleEvent) {
        let ArticleEvent::Loaded {
            feed_id,
            generation,
            result,
        } = event;

        let Some(entry) = self
            .feeds
            .iter_mut()
            .find(|entry| entry.feed.id == feed_id && entry.generation == generation)
        else {
            tracing::debug!(feed_id, generation, "Dropping stale article load");
            return;
        };

        entry.state = match result {
            Ok(articles) => {
                tracing::debug!(feed_id, count = articles.len(), "Articles loaded");
                ArticlesState::Loaded(articles)
            }
            Err(e) => {
                tracing::warn!(feed_id, error = %e, "Failed to load articles");
                ArticlesState::Failed(e.to_string())
            }
        };
    }
}

impl<A: FeedApi> ArticleSink for ArticleList<A> {
    fn load(&mut self, feed: &Feed) {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;

        match self.feeds.iter_mut().find(|entry| entry.feed.id == feed.id) {
            Some(entry) => {
                entry.feed = feed.clone();
                entry.state = ArticlesState::Loading;
                entry.generation = generation;
            }
            None => self.feeds.push(FeedArticles {
                feed: feed.clone(),
                state: ArticlesState::Loading,
                generation,
            }),
        }

        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        let feed_id = feed.id;
        tokio::spawn(async move {
            let result = api.feed_items(feed_id).await;
            let event = ArticleEvent::Loaded {
                feed_id,
                generation,
                result,
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, feed_id, "Failed to send article load (receiver dropped)");
            }
        });
    }

    fn remove(&mut self, feed_id: FeedId) {
        self.feeds.retain(|entry| entry.feed.id != feed_id);
    }

    fn clear(&mut self) {
        self.feeds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Reply;
    use pretty_assertions::assert_eq;

    struct ItemsApi;

    impl FeedApi for ItemsApi {
        async fn feeds_being_followed(&self) -> Result<Vec<Feed>, ApiError> {
            Ok(Vec::new())
        }

        async fn follow_feed(&self, _feed_id: FeedId) -> Result<Reply, ApiError> {
            Ok(Reply::new("OK"))
        }

        async fn unfollow_feed(&self, _feed_id: FeedId) -> Result<Reply, ApiError> {
            Ok(Reply::new("OK"))
        }

        async fn feed_items(&self, feed_id: FeedId) -> Result<Vec<Article>, ApiError> {
            if feed_id == 404 {
                return Err(ApiError::HttpStatus(404));
            }
            Ok(vec![Article {
                title: format!("Article of {feed_id}"),
                ..Article::default()
            }])
        }

        async fn interesting_feeds(&self, _language: &str) -> Result<Vec<Feed>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn list() -> (ArticleList<ItemsApi>, mpsc::Receiver<ArticleEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (ArticleList::new(Arc::new(ItemsApi), tx), rx)
    }

    #[tokio::test]
    async fn test_load_then_event_fills_articles() {
        let (mut articles, mut rx) = list();
        articles.load(&Feed::with_title(1, "One"));
        assert!(articles.is_loading());

        articles.handle_event(rx.recv().await.unwrap());

        assert!(!articles.is_loading());
        let titles: Vec<_> = articles.articles().map(|(_, a)| a.title.clone()).collect();
        assert_eq!(titles, vec!["Article of 1".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_load_is_recorded() {
        let (mut articles, mut rx) = list();
        articles.load(&Feed::with_title(404, "Missing"));
        articles.handle_event(rx.recv().await.unwrap());

        assert!(matches!(articles.feeds()[0].state, ArticlesState::Failed(_)));
        assert_eq!(articles.article_count(), 0);
    }

    #[tokio::test]
    async fn test_reload_replaces_instead_of_duplicating() {
        let (mut articles, mut rx) = list();
        let feed = Feed::with_title(2, "Two");
        articles.load(&feed);
        articles.load(&feed);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        articles.handle_event(first);
        articles.handle_event(second);

        assert_eq!(articles.feeds().len(), 1);
        assert_eq!(articles.article_count(), 1);
    }

    #[tokio::test]
    async fn test_result_for_removed_feed_is_dropped() {
        let (mut articles, mut rx) = list();
        articles.load(&Feed::with_title(3, "Three"));
        articles.remove(3);

        articles.handle_event(rx.recv().await.unwrap());
        assert!(articles.feeds().is_empty());
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let (mut articles, mut rx) = list();
        articles.load(&Feed::with_title(1, "One"));
        articles.load(&Feed::with_title(2, "Two"));
        for _ in 0..2 {
            let event = rx.recv().await.unwrap();
            articles.handle_event(event);
        }
        assert_eq!(articles.article_count(), 2);

        articles.clear();
        assert_eq!(articles.article_count(), 0);
        assert!(articles.feeds().is_empty());
    }

    #[tokio::test]
    async fn test_show_only_replaces_other_feeds() {
        let (mut articles, mut rx) = list();
        articles.load(&Feed::with_title(1, "One"));
        let earlier = rx.recv().await.unwrap();

        articles.show_only(&Feed::with_title(2, "Two"));
        let ids: Vec<FeedId> = articles.feeds().iter().map(|f| f.feed.id).collect();
        assert_eq!(ids, vec![2]);
        assert!(articles.is_loading());

        // The fetch for the dropped feed no longer lands.
        articles.handle_event(earlier);
        articles.handle_event(rx.recv().await.unwrap());

        let titles: Vec<_> = articles.articles().map(|(_, a)| a.title.clone()).collect();
        assert_eq!(titles, vec!["Article of 2".to_string()]);
    }
}
