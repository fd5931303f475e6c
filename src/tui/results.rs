//! Result panel: tabular results and the activity log.

use crate::app::{App, FocusPane, LogLevel, ResultTab};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs};
use unicode_width::UnicodeWidthStr;

/// Widest a grid column gets before its content is clipped.
const MAX_COLUMN_WIDTH: usize = 40;

/// Draw the result panel.
pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let selected = match app.result_tab {
        ResultTab::Result => 0,
        ResultTab::History => 1,
    };
    let tabs = Tabs::new(vec![" Result ", " History "])
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).bold());
    frame.render_widget(tabs, chunks[0]);

    match app.result_tab {
        ResultTab::Result => draw_grid(frame, app, chunks[1]),
        ResultTab::History => draw_history(frame, app, chunks[1]),
    }
}

fn border_style(app: &App) -> Style {
    if app.focus == FocusPane::Results {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_grid(frame: &mut Frame, app: &App, area: Rect) {
    let result = &app.result;
    let set = app.current_result_set;
    let columns = result.columns_for(set);
    let rows = result.rows_for(set);

    // Title with row count and timing
    let title = if let Some(ref err) = result.error {
        format!(" Results — Error: {} ", err)
    } else if columns.is_empty() {
        " Results ".to_string()
    } else {
        let set_info = if result.result_sets.len() > 1 {
            format!(" (set {}/{})", set + 1, result.result_sets.len())
        } else {
            String::new()
        };
        if app.show_timing {
            format!(" Results — {} rows  {}ms{} ", rows.len(), result.elapsed_ms, set_info)
        } else {
            format!(" Results — {} rows{} ", rows.len(), set_info)
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(app));

    if columns.is_empty() {
        // No results yet
        let msg = if let Some(ref err) = result.error {
            err.clone()
        } else {
            "No results. Press Ctrl+Enter to run a query.".to_string()
        };
        let paragraph = Paragraph::new(msg)
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    }

    if app.expanded_mode {
        let lines = expanded_lines(columns, rows, app.result_scroll);
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    let visible_columns: Vec<usize> = (app.result_col_scroll..columns.len()).collect();

    // Build header
    let header_cells: Vec<Cell> = visible_columns
        .iter()
        .map(|&i| Cell::from(columns[i].as_str()).style(Style::default().fg(Color::Cyan).bold()))
        .collect();
    let header = Row::new(header_cells).height(1);

    // Build rows with scroll offset
    let visible_rows: Vec<Row> = rows
        .iter()
        .skip(app.result_scroll)
        .map(|row_data| {
            let cells: Vec<Cell> = visible_columns
                .iter()
                .map(|&i| Cell::from(row_data.get(i).map(String::as_str).unwrap_or("")))
                .collect();
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = visible_columns
        .iter()
        .map(|&i| Constraint::Length(column_width(columns, rows, i) as u16 + 2))
        .collect();

    let table = Table::new(visible_rows, &widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::Rgb(49, 50, 68)));

    frame.render_widget(table, area);
}

/// Column width from header and content, capped.
fn column_width(columns: &[String], rows: &[Vec<String>], i: usize) -> usize {
    let max_data = rows
        .iter()
        .map(|r| r.get(i).map(|s| s.width()).unwrap_or(0))
        .max()
        .unwrap_or(0);
    columns[i].width().max(max_data).min(MAX_COLUMN_WIDTH)
}

/// Vertical record layout, one `column | value` line per field.
fn expanded_lines<'a>(columns: &'a [String], rows: &'a [Vec<String>], skip: usize) -> Vec<Line<'a>> {
    let label_width = columns.iter().map(|c| c.width()).max().unwrap_or(0);
    let mut lines = Vec::new();
    for (n, row) in rows.iter().enumerate().skip(skip) {
        lines.push(Line::styled(
            format!("-[ RECORD {} ]-", n + 1),
            Style::default().fg(Color::Yellow),
        ));
        for (col, val) in columns.iter().zip(row) {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<width$}", col, width = label_width),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(" | "),
                Span::raw(val.as_str()),
            ]));
        }
    }
    lines
}

fn draw_history(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" History — {} entries ", app.log.len()))
        .border_style(border_style(app));

    let height = block.inner(area).height as usize;
    let skip = app.log.len().saturating_sub(height);
    let lines: Vec<Line> = app
        .log
        .iter()
        .skip(skip)
        .map(|entry| {
            let style = match entry.level {
                LogLevel::Info => Style::default().fg(Color::White),
                LogLevel::Error => Style::default().fg(Color::Red),
            };
            Line::styled(entry.message.as_str(), style)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_width_capped() {
        let columns = vec!["id".to_string()];
        let rows = vec![vec!["x".repeat(100)]];
        assert_eq!(column_width(&columns, &rows, 0), MAX_COLUMN_WIDTH);
    }

    #[test]
    fn test_expanded_lines_layout() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            vec!["1".to_string(), "a".to_string()],
            vec!["2".to_string(), "b".to_string()],
        ];
        let lines = expanded_lines(&columns, &rows, 1);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].to_string(), "-[ RECORD 2 ]-");
        assert_eq!(lines[1].to_string(), "id   | 2");
    }
}
