//! Keyboard and mouse handling.

use crate::app::{App, AppEvent, CatalogState, Focus};
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use zeeguu_feeds::api::{Feed, FeedApi};
use zeeguu_feeds::speech::{SpeechRequest, Speaker};

use super::loop_runner::Action;

/// Handle a key press.
pub(super) fn handle_key(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    if app.catalog.is_some() {
        handle_catalog_key(app, code, event_tx);
        return Action::Continue;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::Subscriptions => Focus::Articles,
                Focus::Articles => Focus::Subscriptions,
            };
        }
        KeyCode::Char('j') | KeyCode::Down => move_selection(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_selection(app, -1),
        KeyCode::Char('r') => {
            app.subscriptions.refresh();
            app.selected_subscription = 0;
            app.selected_article = 0;
            app.set_status("Refreshing...");
        }
        KeyCode::Char('a') => open_catalog(app, event_tx),
        KeyCode::Char('d') | KeyCode::Delete if app.focus == Focus::Subscriptions => {
            if let Some(feed) = app.selected_feed().cloned() {
                app.set_status(format!("Unfollowing {}", feed.title()));
                app.subscriptions.unfollow(feed);
                app.clamp_selection();
            }
        }
        KeyCode::Enter if app.focus == Focus::Subscriptions => {
            if let Some(feed) = app.selected_feed().cloned() {
                send_event(event_tx, AppEvent::FeedSelected(feed));
            }
        }
        _ => {}
    }
    Action::Continue
}

fn move_selection(app: &mut App, delta: isize) {
    let (selected, len) = match app.focus {
        Focus::Subscriptions => (
            &mut app.selected_subscription,
            app.subscriptions.rows().len(),
        ),
        Focus::Articles => {
            let len = app.subscriptions.articles().article_count();
            (&mut app.selected_article, len)
        }
    };
    if len == 0 {
        *selected = 0;
        return;
    }
    *selected = selected.saturating_add_signed(delta).min(len - 1);
}

// ============================================================================
// Add-feed catalog
// ============================================================================

fn open_catalog(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    app.catalog = Some(CatalogState::Loading);

    let api = Arc::clone(&app.api);
    let language = app.language.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api
            .interesting_feeds(&language)
            .await
            .map_err(|e| e.to_string());
        if let Err(e) = tx.send(AppEvent::CatalogLoaded(result)).await {
            tracing::warn!(error = %e, event = "CatalogLoaded", "Channel send failed (receiver dropped)");
        }
    });
}

fn handle_catalog_key(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    if matches!(code, KeyCode::Esc | KeyCode::Char('q')) {
        app.catalog = None;
        return;
    }

    let Some(CatalogState::Ready { feeds, selected }) = app.catalog.as_mut() else {
        return;
    };

    match code {
        KeyCode::Char('j') | KeyCode::Down => {
            *selected = (*selected + 1).min(feeds.len().saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            *selected = selected.saturating_sub(1);
        }
        KeyCode::Enter => {
            if let Some(feed) = feeds.get(*selected).cloned() {
                app.catalog = None;
                follow(app, feed);
            }
        }
        KeyCode::Char('o') => {
            if let Some(feed) = feeds.get(*selected).cloned() {
                send_event(event_tx, AppEvent::FeedSelected(feed));
            }
        }
        _ => {}
    }
}

fn follow(app: &mut App, feed: Feed) {
    if app.subscriptions.contains(feed.id) {
        app.set_status(format!("Already following {}", feed.title()));
    } else {
        app.set_status(format!("Following {}", feed.title()));
    }
    app.subscriptions.follow(feed);
}

fn send_event(event_tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    if let Err(e) = event_tx.try_send(event) {
        tracing::warn!(error = %e, "Failed to queue app event");
    }
}

// ============================================================================
// Press-to-speak
// ============================================================================

/// Feed mouse events on the articles panel through the speech gesture.
///
/// Pressing on an article row arms the gesture; moving off that row cancels
/// it; releasing on the same row speaks the row's title if held long enough.
pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent, event_tx: &mpsc::Sender<AppEvent>) {
    let under_pointer = app.article_row_at(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.speech.leave();
            app.pressed_row = under_pointer;
            if let Some(row) = under_pointer {
                app.speech.press(Instant::now());
                app.focus = Focus::Articles;
                app.selected_article = row;
                app.needs_redraw = true;
            }
        }
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            if app.pressed_row.is_some() && under_pointer != app.pressed_row {
                app.speech.leave();
                app.pressed_row = None;
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let pressed = app.pressed_row.take();
            match pressed.filter(|row| Some(*row) == under_pointer) {
                Some(row) => {
                    let Some(title) = app.article_at(row).map(|(_, a)| a.title.clone()) else {
                        app.speech.leave();
                        return;
                    };
                    if let Some(request) = app.speech.release_text(Instant::now(), &title) {
                        spawn_speech(app, request, event_tx);
                    }
                }
                None => app.speech.leave(),
            }
        }
        _ => {}
    }
}

fn spawn_speech(app: &mut App, request: SpeechRequest, event_tx: &mpsc::Sender<AppEvent>) {
    tracing::debug!(language = %request.language, "Press-to-speak");
    app.set_status(format!("Speaking: {}", request.text));

    let speaker = Arc::clone(&app.speaker);
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = speaker
            .speak(&request.text, &request.language)
            .await
            .map_err(|e| e.to_string());
        if let Err(e) = tx.send(AppEvent::SpeechFinished(result)).await {
            tracing::warn!(error = %e, event = "SpeechFinished", "Channel send failed (receiver dropped)");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{show_articles, test_app};
    use crossterm::event::KeyModifiers;
    use ratatui::layout::Rect;
    use std::time::Duration;


    fn mouse(kind: MouseEventKind, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: 45,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn app_with_rows() -> App {
        let mut app = test_app();
        show_articles(&mut app, &["Inflation a<b erwartet", "Wetter"]);
        // Panel starts at row 1: row 1 is article 0, row 2 is article 1.
        app.articles_area = Rect::new(40, 1, 60, 10);
        app
    }

    fn hold() -> Duration {
        Duration::from_millis(600)
    }

    #[tokio::test]
    async fn test_long_press_on_row_speaks_its_title() {
        tokio::time::pause();
        let (tx, _rx) = mpsc::channel(4);
        let mut app = app_with_rows();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 1), &tx);
        assert_eq!(app.pressed_row, Some(0));
        assert!(app.speech.is_pressed());

        tokio::time::advance(hold()).await;
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 1), &tx);

        let status = app.status.as_ref().map(|(msg, _)| msg.as_str());
        assert_eq!(status, Some("Speaking: Inflation a<b erwartet"));
        assert!(!app.speech.is_pressed());
    }

    #[tokio::test]
    async fn test_short_click_does_not_speak() {
        tokio::time::pause();
        let (tx, _rx) = mpsc::channel(4);
        let mut app = app_with_rows();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 2), &tx);
        assert_eq!(app.selected_article, 1);
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 2), &tx);

        assert!(app.status.is_none());
    }

    #[tokio::test]
    async fn test_drag_off_row_cancels() {
        tokio::time::pause();
        let (tx, _rx) = mpsc::channel(4);
        let mut app = app_with_rows();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 1), &tx);
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 2), &tx);
        assert!(!app.speech.is_pressed());
        assert_eq!(app.pressed_row, None);

        tokio::time::advance(hold()).await;
        // Back on the original row before letting go
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 1), &tx);
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 1), &tx);

        assert!(app.status.is_none());
    }

    #[tokio::test]
    async fn test_release_on_other_row_does_not_speak() {
        tokio::time::pause();
        let (tx, _rx) = mpsc::channel(4);
        let mut app = app_with_rows();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 1), &tx);
        tokio::time::advance(hold()).await;
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 2), &tx);

        assert!(app.status.is_none());
        assert!(!app.speech.is_pressed());
        assert_eq!(app.pressed_row, None);
    }

    #[tokio::test]
    async fn test_press_outside_articles_is_ignored() {
        let (tx, _rx) = mpsc::channel(4);
        let mut app = app_with_rows();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 0), &tx);
        assert_eq!(app.pressed_row, None);
        assert!(!app.speech.is_pressed());
    }
}
