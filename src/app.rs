use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use zeeguu_feeds::api::{Article, Feed, ZeeguuClient};
use zeeguu_feeds::articles::ArticleList;
use zeeguu_feeds::speech::{CommandSpeaker, SpeechTrigger};
use zeeguu_feeds::subscription::SubscriptionList;

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(4);

pub type Articles = ArticleList<ZeeguuClient>;
pub type Subscriptions = SubscriptionList<ZeeguuClient, Articles>;

// ============================================================================
// Events
// ============================================================================

/// Events from background tasks that are not owned by the subscription list
/// or the article list.
pub enum AppEvent {
    /// Show only this feed's articles.
    FeedSelected(Feed),
    /// The add-feed catalog finished loading.
    CatalogLoaded(Result<Vec<Feed>, String>),
    /// A speech request finished.
    SpeechFinished(Result<(), String>),
}

// ============================================================================
// View State
// ============================================================================

/// Which panel receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Subscriptions,
    Articles,
}

/// Add-feed overlay.
pub enum CatalogState {
    Loading,
    Ready { feeds: Vec<Feed>, selected: usize },
    Failed(String),
}

pub struct App {
    pub api: Arc<ZeeguuClient>,
    pub subscriptions: Subscriptions,
    pub speech: SpeechTrigger,
    pub speaker: Arc<CommandSpeaker>,
    pub language: String,

    pub focus: Focus,
    pub selected_subscription: usize,
    pub selected_article: usize,
    pub catalog: Option<CatalogState>,
    /// Article row under the pointer when the speech gesture started.
    pub pressed_row: Option<usize>,

    /// Inner area of the articles panel and its scroll offset as last drawn.
    /// Used to map mouse positions to article rows.
    pub articles_area: Rect,
    pub articles_offset: usize,

    pub status: Option<(String, Instant)>,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(
        api: Arc<ZeeguuClient>,
        subscriptions: Subscriptions,
        speech: SpeechTrigger,
        speaker: CommandSpeaker,
        language: String,
    ) -> Self {
        Self {
            api,
            subscriptions,
            speech,
            speaker: Arc::new(speaker),
            language,
            focus: Focus::Subscriptions,
            selected_subscription: 0,
            selected_article: 0,
            catalog: None,
            pressed_row: None,
            articles_area: Rect::default(),
            articles_offset: 0,
            status: None,
            needs_redraw: true,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Drop the status message once it has been shown long enough.
    /// Returns true when something was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        match &self.status {
            Some((_, shown_at)) if shown_at.elapsed() >= STATUS_TTL => {
                self.status = None;
                true
            }
            _ => false,
        }
    }

    pub fn selected_feed(&self) -> Option<&Feed> {
        self.subscriptions.row(self.selected_subscription)
    }

    pub fn article_at(&self, index: usize) -> Option<(&Feed, &Article)> {
        self.subscriptions.articles().articles().nth(index)
    }

    pub fn article_count(&self) -> usize {
        self.subscriptions.articles().article_count()
    }

    /// Keep selections inside their lists after rows come and go.
    pub fn clamp_selection(&mut self) {
        let rows = self.subscriptions.rows().len();
        self.selected_subscription = self.selected_subscription.min(rows.saturating_sub(1));
        let articles = self.article_count();
        self.selected_article = self.selected_article.min(articles.saturating_sub(1));
    }

    /// Article index drawn at a terminal cell, if any.
    pub fn article_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.articles_area;
        let inside = column >= area.x
            && column < area.x.saturating_add(area.width)
            && row >= area.y
            && row < area.y.saturating_add(area.height);
        if !inside {
            return None;
        }

        let index = self.articles_offset + usize::from(row - area.y);
        (index < self.article_count()).then_some(index)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use zeeguu_feeds::articles::{ArticleEvent, ArticleSink};
    use tokio::sync::mpsc;

    /// An app whose client points at a closed local port.
    pub(crate) fn test_app() -> App {
        let api = Arc::new(
            ZeeguuClient::new("http://localhost:9", None, Duration::from_secs(1)).unwrap(),
        );
        let (article_tx, _article_rx) = mpsc::channel(4);
        let (sub_tx, _sub_rx) = mpsc::channel(4);
        let articles = ArticleList::new(Arc::clone(&api), article_tx);
        let subscriptions = SubscriptionList::new(Arc::clone(&api), articles, sub_tx);
        App::new(
            api,
            subscriptions,
            SpeechTrigger::new(Duration::from_millis(500), "de"),
            CommandSpeaker::new("true"),
            "de".to_string(),
        )
    }

    /// Show `titles` as the articles of a single feed.
    pub(crate) fn show_articles(app: &mut App, titles: &[&str]) {
        let feed = Feed::with_title(1, "Der Spiegel");
        let articles = app.subscriptions.articles_mut();
        articles.load(&feed);
        articles.handle_event(ArticleEvent::Loaded {
            feed_id: feed.id,
            generation: 1,
            result: Ok(titles
                .iter()
                .map(|t| Article {
                    title: t.to_string(),
                    ..Article::default()
                })
                .collect()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{show_articles, test_app};
    use super::*;

    #[tokio::test]
    async fn test_article_row_at_maps_rows() {
        let mut app = test_app();
        show_articles(&mut app, &["Eins", "Zwei"]);
        app.articles_area = Rect::new(10, 2, 30, 5);

        assert_eq!(app.article_row_at(12, 2), Some(0));
        assert_eq!(app.article_row_at(12, 3), Some(1));
        // Inside the area, past the last article
        assert_eq!(app.article_row_at(12, 4), None);

        app.articles_offset = 1;
        assert_eq!(app.article_row_at(12, 2), Some(1));
    }

    #[tokio::test]
    async fn test_article_row_at_outside_area() {
        let mut app = test_app();
        app.articles_area = Rect::new(10, 2, 30, 5);
        assert_eq!(app.article_row_at(0, 0), None);
        assert_eq!(app.article_row_at(40, 3), None);
        // Inside the area but no articles loaded
        assert_eq!(app.article_row_at(12, 3), None);
    }

    #[tokio::test]
    async fn test_clamp_selection_on_empty_lists() {
        let mut app = test_app();
        app.selected_subscription = 5;
        app.selected_article = 3;
        app.clamp_selection();
        assert_eq!(app.selected_subscription, 0);
        assert_eq!(app.selected_article, 0);
    }

    #[tokio::test]
    async fn test_status_expires() {
        tokio::time::pause();
        let mut app = test_app();
        app.set_status("Following Der Spiegel");
        assert!(!app.clear_expired_status());

        tokio::time::advance(STATUS_TTL + Duration::from_millis(1)).await;
        assert!(app.clear_expired_status());
        assert!(app.status.is_none());
    }
}
