//! Main UI layout and rendering.

use crate::app::{App, FocusPane};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::{editor, results, sidebar, statusbar};

/// Width of the explorer pane.
const SIDEBAR_WIDTH: u16 = 26;

/// Draw the entire TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    // Main layout: title bar, content, status bar, keybindings
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title bar
            Constraint::Min(5),    // content
            Constraint::Length(1), // status bar
            Constraint::Length(1), // key bindings
        ])
        .split(size);

    let title = match app.workspace.active() {
        Some(db) => format!(" 🐱 purr — {} ({})", db.name, db.path.display()),
        None => " 🐱 purr — no database open".to_string(),
    };
    let title =
        Paragraph::new(title).style(Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 46)));
    frame.render_widget(title, chunks[0]);

    // Content area: sidebar | (editor / results)
    let editor_area = if app.sidebar_visible {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(30)])
            .split(chunks[1]);

        sidebar::draw(frame, app, content_chunks[0]);
        draw_editor_results(frame, app, content_chunks[1])
    } else {
        draw_editor_results(frame, app, chunks[1])
    };

    statusbar::draw(frame, app, chunks[2]);

    let keys = Paragraph::new(key_hints(app)).style(
        Style::default()
            .fg(Color::DarkGray)
            .bg(Color::Rgb(30, 30, 46)),
    );
    frame.render_widget(keys, chunks[3]);

    if app.show_help {
        draw_help_overlay(frame, size);
    }

    if app.autocomplete.active && !app.autocomplete.suggestions.is_empty() {
        draw_autocomplete(frame, app, editor_area, size);
    }
}

/// Key binding hints for the focused pane.
fn key_hints(app: &App) -> &'static str {
    match app.focus {
        FocusPane::Sidebar => {
            " Enter: Use │ s: Select rows │ x: Drop │ n: New table │ r: Remove db │ e/c: Expand/Collapse │ F1: Help"
        }
        FocusPane::Results if app.result.result_sets.len() > 1 => {
            " ↑↓←→: Scroll │ [/]: Prev/Next Set │ Ctrl+T: Result/History │ Tab: Switch Pane │ F1: Help"
        }
        _ => {
            " Ctrl+Enter: Run │ Tab: Switch Pane │ Ctrl+T: Result/History │ Ctrl+D: Sidebar │ Ctrl+Q: Quit │ F1: Help"
        }
    }
}

/// Draw the editor and results split vertically, returning the editor area.
fn draw_editor_results(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45), // editor
            Constraint::Percentage(55), // results
        ])
        .split(area);

    editor::draw(frame, app, chunks[0]);
    results::draw(frame, app, chunks[1]);
    chunks[0]
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered_rect(64, 80, area);
    frame.render_widget(Clear, help_area);

    let help_text = [
        "🐱 purr — Key Bindings",
        "",
        "  Ctrl+Enter / F5    Execute editor (SQL or trailing \\command)",
        "  Tab                Cycle focus (Editor → Results → Explorer)",
        "  Ctrl+T             Switch Result / History tab",
        "  Ctrl+↑ / Ctrl+↓    Previous / next query from history",
        "  Ctrl+D             Toggle explorer",
        "  Ctrl+L             Clear editor",
        "  Ctrl+Q             Quit",
        "  F1                 Toggle this help",
        "",
        "  Results pane:",
        "    ↑/↓/←/→          Scroll results",
        "    [ / ]            Previous / next result set",
        "",
        "  Explorer:",
        "    Enter            Use database, expand/collapse",
        "    s                Select top rows of table",
        "    x                Drop table (loads statement into editor)",
        "    n                New table template",
        "    r                Remove database from explorer",
        "    e / c            Expand / collapse all",
        "",
        "  Type \\? and press Ctrl+Enter for slash commands.",
        "  Press F1 or Esc to close",
    ];

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 46)))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, help_area);
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Popup rectangle below the cursor, clamped to the screen.
fn popup_rect(cursor: (u16, u16), count: usize, width: u16, area: Rect) -> Rect {
    let height = count as u16 + 2;
    let x = cursor.0.min(area.width.saturating_sub(width));
    let y = (cursor.1 + 1).min(area.height.saturating_sub(height));
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Draw the autocomplete popup near the cursor.
fn draw_autocomplete(frame: &mut Frame, app: &App, editor_area: Rect, area: Rect) {
    let max_items = 8usize;
    let suggestions = &app.autocomplete.suggestions;
    let count = suggestions.len().min(max_items);
    if count == 0 {
        return;
    }

    // Keep the selection visible when it moves past the first page
    let first = app.autocomplete.selected.saturating_sub(max_items - 1);
    let width = suggestions
        .iter()
        .map(|s| s.chars().count() as u16 + 2)
        .max()
        .unwrap_or(0)
        .clamp(20, 40);

    let cursor = editor::cursor_screen_position(app, editor_area);
    let popup_area = popup_rect(cursor, count, width, area);

    frame.render_widget(Clear, popup_area);

    let items: Vec<Line> = suggestions
        .iter()
        .enumerate()
        .skip(first)
        .take(max_items)
        .map(|(i, word)| {
            if i == app.autocomplete.selected {
                Line::from(word.as_str()).style(Style::default().fg(Color::Black).bg(Color::Cyan))
            } else {
                Line::from(word.as_str()).style(Style::default().fg(Color::White))
            }
        })
        .collect();

    let popup = Paragraph::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .style(Style::default().bg(Color::Rgb(40, 40, 60))),
    );

    frame.render_widget(popup, popup_area);
}
