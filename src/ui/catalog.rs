use crate::app::{App, CatalogState};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use zeeguu_feeds::util::{single_line, truncate_to_width};

/// Render the add-feed overlay centered on screen.
pub fn render(f: &mut Frame, app: &App, state: &CatalogState) {
    let area = f.area();

    // Size: 70% of the screen, at most 80 columns
    let width = (area.width / 10 * 7).min(80);
    let height = (area.height / 10 * 7).max(5).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height);

    f.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Add feed ({}) ", app.language))
        .title_bottom(" (Enter) Follow  (o) Preview  (Esc) Close ");

    match state {
        CatalogState::Loading => {
            let paragraph = Paragraph::new("Loading feeds...")
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(paragraph, overlay);
        }
        CatalogState::Failed(e) => {
            let paragraph = Paragraph::new(format!("Could not load feeds:\n\n{}", single_line(e)))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Red))
                .block(block);
            f.render_widget(paragraph, overlay);
        }
        CatalogState::Ready { feeds, .. } if feeds.is_empty() => {
            let paragraph = Paragraph::new("No feeds available for this language")
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(paragraph, overlay);
        }
        CatalogState::Ready { feeds, selected } => {
            let max_width = usize::from(overlay.width.saturating_sub(4));
            let items: Vec<ListItem> = feeds
                .iter()
                .map(|feed| {
                    let marker = if app.subscriptions.contains(feed.id) {
                        Span::styled("✓ ", Style::default().fg(Color::Green))
                    } else {
                        Span::raw("  ")
                    };
                    let title = single_line(feed.title());
                    let title = truncate_to_width(&title, max_width).into_owned();
                    ListItem::new(Line::from(vec![marker, Span::raw(title)]))
                })
                .collect();

            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
            let mut list_state = ListState::default().with_selected(Some(*selected));
            f.render_stateful_widget(list, overlay, &mut list_state);
        }
    }
}
