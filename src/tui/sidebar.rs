//! Database explorer sidebar pane.

use crate::app::{self, App, FocusPane, NodeKind};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Draw the database explorer.
pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == FocusPane::Sidebar;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Explorer ")
        .border_style(border_style);

    let flat = app::flatten_tree(&app.objects);
    if flat.is_empty() {
        let msg = Paragraph::new("  No database.\n  \\o <file> to open")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(msg, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let active = app.workspace.active_index();
    let height = inner.height as usize;
    let top = app.sidebar_selected.saturating_sub(height.saturating_sub(1));

    let lines: Vec<Line> = flat
        .iter()
        .enumerate()
        .skip(top)
        .take(height)
        .map(|(i, node)| {
            let indent = "  ".repeat(node.depth as usize);
            let icon = if !node.children.is_empty() {
                if node.expanded { "▾ " } else { "▸ " }
            } else {
                "  "
            };
            let style = if i == app.sidebar_selected && focused {
                Style::default().fg(Color::Cyan).bg(Color::Rgb(49, 50, 68))
            } else {
                match node.kind {
                    NodeKind::Database(idx) if Some(idx) == active => {
                        Style::default().fg(Color::Yellow).bold()
                    }
                    NodeKind::Database(_) => Style::default().fg(Color::Yellow),
                    NodeKind::Table { .. } => Style::default().fg(Color::White),
                }
            };
            Line::from(Span::styled(format!("{}{}{}", indent, icon, node.name), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
