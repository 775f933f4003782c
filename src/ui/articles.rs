use crate::app::{App, Focus};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use zeeguu_feeds::articles::ArticlesState;
use zeeguu_feeds::util::{display_width, single_line, truncate_to_width};

/// Render the article list panel.
///
/// Records the drawn inner area and scroll offset on `app` so mouse
/// positions can be mapped back to article rows.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let is_focused = app.focus == Focus::Articles;
    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let article_list = app.subscriptions.articles();
    let title = if article_list.is_loading() {
        format!("Articles ({}) loading…", article_list.article_count())
    } else {
        format!("Articles ({})", article_list.article_count())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);
    let inner = block.inner(area);

    let width = usize::from(inner.width);
    let mut items: Vec<ListItem> = article_list
        .articles()
        .map(|(feed, article)| {
            let source = single_line(feed.title());
            let source_width = display_width(&source).min(width / 3);
            let source = truncate_to_width(&source, source_width).into_owned();

            let title_width = width.saturating_sub(display_width(&source) + 2);
            let title = single_line(&article.title);
            let title = truncate_to_width(&title, title_width).into_owned();

            ListItem::new(Line::from(vec![
                Span::raw(title),
                Span::styled(format!("  {source}"), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    // Failed feeds come after every article row so row indices stay aligned
    // with `ArticleList::articles`.
    let failures = article_list.feeds().iter().filter_map(|entry| match &entry.state {
        ArticlesState::Failed(e) => Some(ListItem::new(Line::from(Span::styled(
            format!("⚠ {}: {}", single_line(entry.feed.title()), single_line(e)),
            Style::default().fg(Color::Red),
        )))),
        _ => None,
    });
    items.extend(failures);

    if items.is_empty() {
        items.push(ListItem::new("No articles"));
    }

    let selected = (article_list.article_count() > 0).then_some(app.selected_article);
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default()
        .with_offset(app.articles_offset)
        .with_selected(selected);
    f.render_stateful_widget(list, area, &mut state);

    app.articles_area = inner;
    app.articles_offset = state.offset();
}
