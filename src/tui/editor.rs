//! SQL query editor pane with syntax highlighting.

use crate::app::{App, FocusPane};
use crate::highlight::{self, StyleId};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthStr;

/// Width of the line number gutter, including the trailing space.
const GUTTER: u16 = 4;

/// Terminal style for a highlight category.
pub fn style_for(style: StyleId) -> Style {
    match style {
        StyleId::Keyword => Style::default().fg(Color::Blue).bold(),
        StyleId::Number => Style::default().fg(Color::Rgb(255, 130, 0)),
        StyleId::DoubleQuoted => Style::default().fg(Color::Green),
        StyleId::SingleQuoted => Style::default().fg(Color::Gray),
        StyleId::Function => Style::default().fg(Color::LightBlue).italic(),
        StyleId::Comment => Style::default().fg(Color::Rgb(0, 160, 0)),
    }
}

/// First visible line so that the cursor row stays on screen.
fn first_visible_row(cursor_row: usize, height: usize) -> usize {
    cursor_row.saturating_sub(height.saturating_sub(1))
}

/// Draw the SQL editor pane.
pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == FocusPane::Editor;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" SQL Editor ")
        .border_style(border_style);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = app.editor.lines();
    let (cursor_row, cursor_col) = app.editor.cursor();
    let top = first_visible_row(cursor_row, inner.height as usize);

    if lines.len() == 1 && lines[0].is_empty() {
        let placeholder = Paragraph::new(Line::from(vec![
            Span::styled(format!("{:>3} ", 1), Style::default().fg(Color::DarkGray)),
            Span::styled("Sql statement...", Style::default().fg(Color::DarkGray)),
        ]));
        frame.render_widget(placeholder, inner);
    } else {
        let rendered: Vec<Line> = lines
            .iter()
            .enumerate()
            .skip(top)
            .take(inner.height as usize)
            .map(|(idx, text)| {
                let mut spans = vec![Span::styled(
                    format!("{:>3} ", idx + 1),
                    Style::default().fg(Color::DarkGray),
                )];
                let styled = app.highlights.line(idx).map(|h| h.spans.as_slice()).unwrap_or(&[]);
                for (range, style) in highlight::paint(text, styled) {
                    let piece = text[range].to_string();
                    spans.push(match style {
                        Some(s) => Span::styled(piece, style_for(s)),
                        None => Span::raw(piece),
                    });
                }
                Line::from(spans)
            })
            .collect();
        frame.render_widget(Paragraph::new(rendered), inner);
    }

    if focused && !app.show_help {
        let line = lines.get(cursor_row).map(String::as_str).unwrap_or("");
        let before: String = line.chars().take(cursor_col).collect();
        let x = inner.x + GUTTER + before.width() as u16;
        let y = inner.y + (cursor_row - top) as u16;
        if x < inner.right() && y < inner.bottom() {
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

/// Screen position of the editor cursor, used to anchor the autocomplete popup.
pub fn cursor_screen_position(app: &App, editor_area: Rect) -> (u16, u16) {
    let inner = Block::default().borders(Borders::ALL).inner(editor_area);
    let (row, col) = app.editor.cursor();
    let top = first_visible_row(row, inner.height as usize);
    let line = app.editor.lines().get(row).map(String::as_str).unwrap_or("");
    let before: String = line.chars().take(col).collect();
    (
        inner.x + GUTTER + before.width() as u16,
        inner.y + (row - top) as u16,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_visible_row_keeps_cursor_on_screen() {
        assert_eq!(first_visible_row(0, 10), 0);
        assert_eq!(first_visible_row(9, 10), 0);
        assert_eq!(first_visible_row(10, 10), 1);
        assert_eq!(first_visible_row(5, 0), 5);
    }

    #[test]
    fn test_comment_style_differs_from_keyword() {
        assert_ne!(style_for(StyleId::Comment), style_for(StyleId::Keyword));
    }
}
