//! Render functions for the TUI.

use crate::app::App;
use crate::util::display_width;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use super::{status, suggestions};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 8;

const PLACEHOLDER: &str = "Enter a paper ID or URL";

pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // EDGE-001: Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_input(f, app, chunks[0]);
    suggestions::render(f, app, chunks[1]);
    status::render(f, app, chunks[2]);
}

/// Input line with a placeholder while empty. Long input keeps its tail visible.
fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title("arXiv");
    let inner_width = area.width.saturating_sub(2) as usize;

    let (text, cursor_col) = if app.input.is_empty() {
        (
            Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
            0,
        )
    } else {
        let visible = tail_to_width(&app.input, inner_width.saturating_sub(1));
        let col = display_width(visible);
        (Span::raw(visible), col)
    };

    f.render_widget(Paragraph::new(text).block(block), area);
    f.set_cursor_position(Position::new(
        area.x + 1 + cursor_col as u16,
        area.y + 1,
    ));
}

/// Longest suffix of `s` that fits in `max_width` columns.
fn tail_to_width(s: &str, max_width: usize) -> &str {
    let mut start = s.len();
    let mut used = 0;
    for (idx, c) in s.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width {
            break;
        }
        used += w;
        start = idx;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_to_width() {
        assert_eq!(tail_to_width("2005.11401", 20), "2005.11401");
        assert_eq!(tail_to_width("https://arxiv.org/abs/2005.11401", 10), "2005.11401");
        assert_eq!(tail_to_width("abc", 0), "");
    }
}
