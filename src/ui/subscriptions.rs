use crate::app::{App, Focus};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use zeeguu_feeds::util::{single_line, truncate_to_width};

/// Shown instead of the list when nothing is followed.
pub(super) const EMPTY_PROMPT: &str = "No feeds yet, press 'a' to add one";

/// Render the followed-feeds panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::Subscriptions;
    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!("Following ({})", app.subscriptions.len()));

    if app.subscriptions.shows_empty_prompt() {
        let prompt = Paragraph::new(EMPTY_PROMPT)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(prompt, area);
        return;
    }

    // Borders plus the two-cell pending marker
    let max_width = usize::from(area.width.saturating_sub(4));

    let items: Vec<ListItem> = app
        .subscriptions
        .rows()
        .iter()
        .enumerate()
        .map(|(i, feed)| {
            let title = single_line(feed.title());
            let title = truncate_to_width(&title, max_width).into_owned();

            let style = if i == app.selected_subscription {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };

            let marker = if app.subscriptions.is_pending(feed.id) {
                Span::styled("… ", Style::default().fg(Color::Yellow))
            } else {
                Span::raw("  ")
            };

            ListItem::new(Line::from(vec![marker, Span::styled(title, style)]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));

    f.render_widget(list, area);
}
