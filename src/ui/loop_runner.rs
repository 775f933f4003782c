//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, subscription and article completions,
//! other background task events, and a periodic tick.

use crate::app::{App, AppEvent};
use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use zeeguu_feeds::articles::ArticleEvent;
use zeeguu_feeds::subscription::SubscriptionEvent;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::{handle_app_event, handle_article_event, handle_subscription_event};
use super::input::{handle_key, handle_mouse};
use super::render::render;

/// Result of handling an input event.
pub enum Action {
    Continue,
    Quit,
}

/// Receivers for everything background tasks report back.
pub struct Channels {
    pub subscription_rx: mpsc::Receiver<SubscriptionEvent>,
    pub article_rx: mpsc::Receiver<ArticleEvent>,
    pub event_tx: mpsc::Sender<AppEvent>,
    pub event_rx: mpsc::Receiver<AppEvent>,
}

/// Runs the TUI until the user quits or a shutdown signal arrives.
///
/// Installs a panic hook that restores terminal state before unwinding.
pub async fn run(app: &mut App, channels: Channels) -> Result<()> {
    let Channels {
        mut subscription_rx,
        mut article_rx,
        event_tx,
        mut event_rx,
    } = channels;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                let action = match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.needs_redraw = true;
                        handle_key(app, key.code, &event_tx)
                    }
                    Some(Ok(Event::Mouse(mouse))) => {
                        handle_mouse(app, mouse, &event_tx);
                        Action::Continue
                    }
                    Some(Ok(Event::Resize(_, _))) => {
                        app.needs_redraw = true;
                        Action::Continue
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Terminal event stream error");
                        Action::Continue
                    }
                    None => Action::Quit,
                    _ => Action::Continue,
                };
                if let Action::Quit = action {
                    break;
                }
            }

            Some(event) = subscription_rx.recv() => {
                app.needs_redraw = true;
                handle_subscription_event(app, event);
            }

            Some(event) = article_rx.recv() => {
                app.needs_redraw = true;
                handle_article_event(app, event);
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event);
            }

            _ = tick_interval.tick() => {
                if app.clear_expired_status() {
                    app.needs_redraw = true;
                }
            }
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}
