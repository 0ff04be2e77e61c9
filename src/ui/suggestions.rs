use crate::app::{App, SuggestionState};
use crate::util::{strip_control_chars, truncate_to_width};
use chrono::Datelike;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the suggestion list: title, then first author and year.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Papers");
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = match &app.suggestions {
        SuggestionState::Idle => vec![ListItem::new(Span::styled(
            "Type an arXiv ID, URL or search terms",
            Style::default().fg(Color::DarkGray),
        ))],
        SuggestionState::NoResults { query } => {
            let query = strip_control_chars(query);
            vec![ListItem::new(Span::styled(
                truncate_to_width(&format!("No papers found for \"{}\"", query), width).into_owned(),
                Style::default().fg(Color::Yellow),
            ))]
        }
        SuggestionState::Results(articles) => articles
            .iter()
            .map(|article| {
                // SEC-001: Titles come from a remote feed
                let title = strip_control_chars(&article.title).replace(['\n', '\r', '\t'], " ");
                let title = truncate_to_width(&title, width).into_owned();

                let author = strip_control_chars(article.first_author()).into_owned();
                let author = if article.authors.len() > 1 {
                    format!("{} et al.", author)
                } else {
                    author
                };
                let byline = format!("{} · {}", author, article.published.year());

                ListItem::new(vec![
                    Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
                    Line::from(Span::styled(
                        truncate_to_width(&byline, width).into_owned(),
                        Style::default().fg(Color::Gray),
                    )),
                ])
            })
            .collect(),
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .highlight_symbol("> ");

    let selected = match app.suggestions {
        SuggestionState::Results(_) => Some(app.selected),
        _ => None,
    };
    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, area, &mut state);
}
