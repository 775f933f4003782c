//! Handlers for events coming back from background tasks.

use crate::app::{App, AppEvent, CatalogState};
use zeeguu_feeds::articles::ArticleEvent;
use zeeguu_feeds::subscription::SubscriptionEvent;

pub(super) fn handle_subscription_event(app: &mut App, event: SubscriptionEvent) {
    // A rejected request shows up as a membership change after handling.
    let watched = match &event {
        SubscriptionEvent::Followed { feed, result, .. } => {
            let failed = !matches!(result, Ok(reply) if reply.is_ok());
            failed.then(|| (feed.id, feed.title().to_string(), "follow"))
        }
        SubscriptionEvent::Unfollowed { feed, result, .. } => {
            let failed = !matches!(result, Ok(reply) if reply.is_ok());
            failed.then(|| (feed.id, feed.title().to_string(), "unfollow"))
        }
        SubscriptionEvent::Loaded { .. } => None,
    };
    let before = watched
        .as_ref()
        .map(|(id, _, _)| app.subscriptions.contains(*id));

    app.subscriptions.handle_event(event);

    if let (Some((id, title, verb)), Some(before)) = (watched, before) {
        if app.subscriptions.contains(id) != before {
            app.set_status(format!("Could not {verb} {title}"));
        }
    }
    app.clamp_selection();
}

pub(super) fn handle_article_event(app: &mut App, event: ArticleEvent) {
    app.subscriptions.articles_mut().handle_event(event);
    app.clamp_selection();
}

pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::FeedSelected(feed) => {
            app.subscriptions.articles_mut().show_only(&feed);
            app.selected_article = 0;
            app.set_status(format!("Showing {}", feed.title()));
        }
        AppEvent::CatalogLoaded(result) => {
            // Closed while loading.
            if app.catalog.is_none() {
                return;
            }
            app.catalog = Some(match result {
                Ok(feeds) => CatalogState::Ready { feeds, selected: 0 },
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load feed catalog");
                    CatalogState::Failed(e)
                }
            });
        }
        AppEvent::SpeechFinished(Ok(())) => {}
        AppEvent::SpeechFinished(Err(e)) => {
            tracing::warn!(error = %e, "Speech failed");
            app.set_status(format!("Speech failed: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{show_articles, test_app};
    use pretty_assertions::assert_eq;
    use zeeguu_feeds::api::Feed;

    #[tokio::test]
    async fn test_feed_selected_shows_only_that_feed() {
        let mut app = test_app();
        show_articles(&mut app, &["Eins", "Zwei"]);
        app.selected_article = 1;

        handle_app_event(&mut app, AppEvent::FeedSelected(Feed::with_title(8, "Le Monde")));

        let ids: Vec<i64> = app
            .subscriptions
            .articles()
            .feeds()
            .iter()
            .map(|f| f.feed.id)
            .collect();
        assert_eq!(ids, vec![8]);
        assert_eq!(app.selected_article, 0);
        assert_eq!(app.article_count(), 0);
    }

    #[tokio::test]
    async fn test_catalog_result_ignored_after_close() {
        let mut app = test_app();
        handle_app_event(&mut app, AppEvent::CatalogLoaded(Ok(Vec::new())));
        assert!(app.catalog.is_none());
    }
}
