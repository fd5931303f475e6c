//! Status bar showing the active database, timing, and row count.

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

/// Draw the status bar.
pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let left = match app.workspace.active() {
        Some(db) => format!(" {} | {} tables ", db.path.display(), db.tables.len()),
        None => " no database ".to_string(),
    };
    let right = if !app.result.columns().is_empty() {
        if app.show_timing {
            format!(
                " {} rows | {}ms ",
                app.result.total_rows(),
                app.result.elapsed_ms
            )
        } else {
            format!(" {} rows ", app.result.total_rows())
        }
    } else {
        String::new()
    };

    // Pad middle
    let total_width = area.width as usize;
    let padding = total_width.saturating_sub(left.width() + right.width());
    let status = format!("{}{}{}", left, " ".repeat(padding), right);

    let paragraph =
        Paragraph::new(status).style(Style::default().fg(Color::White).bg(Color::Rgb(49, 50, 68)));
    frame.render_widget(paragraph, area);
}
