//! Application state machine for the TUI.

use crate::commands::{self, CommandAction, SlashCommand};
use crate::config::Config;
use crate::db::Workspace;
use crate::db::query::{self, StatementOutcome, quote_ident};
use crate::error::PurrError;
use crate::highlight::{DocumentHighlights, Highlighter};
use crate::tui::autocomplete::Autocomplete;
use std::collections::VecDeque;
use std::path::Path;
use tracing::{info, warn};

/// Activity log entries kept before the oldest are dropped.
const MAX_LOG_ENTRIES: usize = 500;

/// Which pane currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    /// The SQL editor pane.
    Editor,
    /// The result panel (grid or history).
    Results,
    /// The database explorer sidebar.
    Sidebar,
}

/// Which tab of the result panel is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTab {
    /// Tabular results of the last select.
    Result,
    /// Activity log.
    History,
}

/// What an explorer node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Index into the workspace.
    Database(usize),
    /// A table of the database at this workspace index.
    Table { database: usize },
}

/// A node in the database explorer tree.
#[derive(Debug, Clone)]
pub struct ObjectNode {
    /// Display label.
    pub name: String,
    /// Full path for databases.
    pub detail: Option<String>,
    pub kind: NodeKind,
    /// Depth in the tree (0 = database, 1 = table).
    pub depth: u8,
    /// Whether this node is expanded.
    pub expanded: bool,
    pub children: Vec<ObjectNode>,
}

/// A single result set from a query.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// Column headers.
    pub columns: Vec<String>,
    /// Row data as strings.
    pub rows: Vec<Vec<String>>,
}

/// Query result data ready for display.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// All result sets from the query.
    pub result_sets: Vec<ResultSet>,
    /// Rows changed by the statement.
    pub affected_rows: u64,
    /// How long the query took, in milliseconds.
    pub elapsed_ms: u128,
    /// Optional error message.
    pub error: Option<String>,
}

impl QueryResult {
    /// Get columns of the current (or first) result set.
    pub fn columns(&self) -> &[String] {
        self.result_sets
            .first()
            .map(|rs| rs.columns.as_slice())
            .unwrap_or(&[])
    }

    /// Get rows of a specific result set.
    pub fn rows_for(&self, index: usize) -> &[Vec<String>] {
        self.result_sets
            .get(index)
            .map(|rs| rs.rows.as_slice())
            .unwrap_or(&[])
    }

    /// Get columns of a specific result set.
    pub fn columns_for(&self, index: usize) -> &[String] {
        self.result_sets
            .get(index)
            .map(|rs| rs.columns.as_slice())
            .unwrap_or(&[])
    }

    /// Total row count across all result sets.
    pub fn total_rows(&self) -> usize {
        self.result_sets.iter().map(|rs| rs.rows.len()).sum()
    }

    /// Helper to create a single-resultset QueryResult.
    pub fn single(columns: Vec<String>, rows: Vec<Vec<String>>, elapsed_ms: u128) -> Self {
        Self {
            result_sets: vec![ResultSet { columns, rows }],
            elapsed_ms,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// The main application state.
pub struct App {
    /// Which pane has focus.
    pub focus: FocusPane,
    /// Whether the sidebar is visible.
    pub sidebar_visible: bool,
    /// The SQL editor text area.
    pub editor: tui_textarea::TextArea<'static>,
    pub highlighter: Highlighter,
    /// Highlight cache for the editor lines.
    pub highlights: DocumentHighlights,
    /// Open databases.
    pub workspace: Workspace,
    /// Current query results.
    pub result: QueryResult,
    pub result_tab: ResultTab,
    /// Activity log, oldest first.
    pub log: VecDeque<LogEntry>,
    /// Database explorer tree.
    pub objects: Vec<ObjectNode>,
    /// Scroll offset in the results table (rows).
    pub result_scroll: usize,
    /// Horizontal scroll offset in the results table (columns).
    pub result_col_scroll: usize,
    /// Selected row in the flattened explorer.
    pub sidebar_selected: usize,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Query history.
    pub history: Vec<String>,
    /// Current position in history (None = current editor content).
    pub history_index: Option<usize>,
    /// Show help overlay.
    pub show_help: bool,
    /// Autocomplete state.
    pub autocomplete: Autocomplete,
    /// Which result set is currently displayed (for multi-resultset queries).
    pub current_result_set: usize,
    /// Expanded display mode (vertical record layout).
    pub expanded_mode: bool,
    /// Show query timing in results.
    pub show_timing: bool,
    /// Row limit for the explorer's select action.
    pub row_limit: usize,
}

impl App {
    /// Create a new App with default state.
    pub fn new(config: &Config) -> Self {
        let mut app = Self {
            focus: FocusPane::Editor,
            sidebar_visible: true,
            editor: new_editor(vec![String::new()]),
            highlighter: Highlighter::new(),
            highlights: DocumentHighlights::default(),
            workspace: Workspace::new(),
            result: QueryResult::default(),
            result_tab: ResultTab::Result,
            log: VecDeque::new(),
            objects: Vec::new(),
            result_scroll: 0,
            result_col_scroll: 0,
            sidebar_selected: 0,
            should_quit: false,
            history: Vec::new(),
            history_index: None,
            show_help: false,
            autocomplete: Autocomplete::default(),
            current_result_set: 0,
            expanded_mode: config.expanded,
            show_timing: config.timing,
            row_limit: config.row_limit,
        };
        app.refresh_highlights();
        app
    }

    /// Cycle focus to the next pane.
    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Editor => FocusPane::Results,
            FocusPane::Results => {
                if self.sidebar_visible {
                    FocusPane::Sidebar
                } else {
                    FocusPane::Editor
                }
            }
            FocusPane::Sidebar => FocusPane::Editor,
        };
    }

    /// Toggle sidebar visibility.
    pub fn toggle_sidebar(&mut self) {
        self.sidebar_visible = !self.sidebar_visible;
        if !self.sidebar_visible && self.focus == FocusPane::Sidebar {
            self.focus = FocusPane::Editor;
        }
    }

    pub fn toggle_result_tab(&mut self) {
        self.result_tab = match self.result_tab {
            ResultTab::Result => ResultTab::History,
            ResultTab::History => ResultTab::Result,
        };
    }

    /// Get the current editor content as a string.
    pub fn get_editor_text(&self) -> String {
        self.editor.lines().join("\n")
    }

    /// Clear the editor.
    pub fn clear_editor(&mut self) {
        self.editor = new_editor(vec![String::new()]);
        self.refresh_highlights();
    }

    /// Replace the editor content.
    pub fn set_editor_text(&mut self, text: &str) {
        let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
        let lines = if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        };
        self.editor = new_editor(lines);
        self.refresh_highlights();
    }

    /// Rescan edited lines for syntax highlighting.
    pub fn refresh_highlights(&mut self) {
        self.highlights.update(&self.highlighter, self.editor.lines());
    }

    /// Push current query to history and reset index.
    pub fn push_history(&mut self) {
        let text = self.get_editor_text();
        if !text.trim().is_empty() && self.history.last() != Some(&text) {
            self.history.push(text);
        }
        self.history_index = None;
    }

    /// Navigate history backward.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_index {
            None => self.history.len().saturating_sub(1),
            Some(i) => i.saturating_sub(1),
        };
        self.history_index = Some(idx);
        self.set_editor_text(&self.history[idx].clone());
    }

    /// Navigate history forward.
    pub fn history_next(&mut self) {
        if let Some(idx) = self.history_index {
            if idx + 1 < self.history.len() {
                let new_idx = idx + 1;
                self.history_index = Some(new_idx);
                self.set_editor_text(&self.history[new_idx].clone());
            } else {
                self.history_index = None;
                self.clear_editor();
            }
        }
    }

    /// Append to the activity log.
    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Info, message.into());
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Error, message.into());
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        if self.log.len() >= MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
        self.log.push_back(LogEntry { level, message });
    }

    /// Open (or create) a database file and show it in the explorer.
    pub fn open_database(&mut self, path: &Path) {
        match self.workspace.open(path) {
            Ok(db) => {
                let msg = format!("Opened {} ({} tables)", db.path.display(), db.tables.len());
                self.log_info(msg);
                self.rebuild_explorer();
                if let Some(idx) = self.workspace.active_index() {
                    if let Some(node) = self.objects.get_mut(idx) {
                        node.expanded = true;
                    }
                    self.sidebar_selected = self.flat_index_of_database(idx);
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to open database");
                self.fail(format!("Failed to open {}: {}", path.display(), e));
            }
        }
    }

    /// Run the editor content: a trailing slash command, or SQL.
    pub fn execute_editor(&mut self) {
        let text = self.get_editor_text();
        if text.trim().is_empty() {
            return;
        }
        self.push_history();
        match commands::split_trailing(&text) {
            (body, Some(cmd)) => self.run_command(&cmd, &body),
            (_, None) => self.run_sql(&text),
        }
    }

    /// Carry out a slash command. `body` is the editor text above the command line.
    pub fn run_command(&mut self, cmd: &SlashCommand, body: &str) {
        let action = commands::to_action(cmd, &self.workspace);
        let mut editor_text = if body.is_empty() {
            None
        } else {
            Some(body.to_string())
        };

        match action {
            CommandAction::ExecuteSql(sql) => self.run_sql(&sql),
            CommandAction::GeneratedSql(sql) => {
                editor_text = Some(sql);
                self.log_info("Generated CREATE TABLE statement. Press Ctrl+Enter to run it.");
                self.result_tab = ResultTab::History;
            }
            CommandAction::DisplayMessage { columns, rows } => {
                self.show_result(QueryResult::single(columns, rows, 0));
            }
            CommandAction::OpenDatabase(path) => self.open_database(&path),
            CommandAction::CloseDatabase(target) => match self.workspace.close(target.as_deref()) {
                Ok(db) => {
                    self.log_info(format!("Removed {} from the explorer", db.name));
                    self.rebuild_explorer();
                }
                Err(e) => self.fail(e.to_string()),
            },
            CommandAction::SwitchDatabase(target) => match self.workspace.switch(&target) {
                Ok(db) => {
                    let msg = format!("Switched to {}", db.name);
                    self.log_info(msg);
                    self.rebuild_explorer();
                }
                Err(e) => self.fail(e.to_string()),
            },
            CommandAction::SaveEditor(path) => match std::fs::write(&path, body) {
                Ok(()) => {
                    info!(path = %path.display(), bytes = body.len(), "saved editor");
                    self.log_info(format!("Saved {} bytes to {}", body.len(), path.display()));
                }
                Err(e) => self.fail(format!("Failed to save {}: {}", path.display(), e)),
            },
            CommandAction::LoadEditor(path) => match std::fs::read_to_string(&path) {
                Ok(text) => {
                    self.log_info(format!("Loaded {}", path.display()));
                    editor_text = Some(text);
                }
                Err(e) => self.fail(format!("Failed to load {}: {}", path.display(), e)),
            },
            CommandAction::Error(msg) => self.fail(msg),
            CommandAction::ToggleExpanded => {
                self.expanded_mode = !self.expanded_mode;
                let state = if self.expanded_mode { "ON" } else { "OFF" };
                self.log_info(format!("Expanded display is {}", state));
            }
            CommandAction::ToggleTiming => {
                self.show_timing = !self.show_timing;
                let state = if self.show_timing { "ON" } else { "OFF" };
                self.log_info(format!("Timing is {}", state));
            }
            CommandAction::Quit => self.should_quit = true,
        }

        if let Some(text) = editor_text {
            self.set_editor_text(&text);
        }
    }

    /// Execute SQL against the active database and route the feedback.
    pub fn run_sql(&mut self, sql: &str) {
        let Some(db) = self.workspace.active_mut() else {
            self.fail(PurrError::NoDatabase.to_string());
            return;
        };

        let (outcomes, failure) = match query::run_script(db, sql) {
            Ok(outcomes) => (outcomes, None),
            Err(f) => (f.completed, Some((f.sql, f.error))),
        };

        let mut tables_changed = false;
        for outcome in outcomes {
            tables_changed |= outcome.classification.kind.refreshes_tables();
            self.apply_outcome(outcome);
        }
        if let Some((statement, error)) = failure {
            self.result = QueryResult {
                error: Some(error.to_string()),
                ..Default::default()
            };
            self.log_error(format!("{}: {}", first_line(&statement), error));
            self.result_tab = ResultTab::History;
        }
        if tables_changed {
            self.rebuild_explorer();
        }
    }

    /// Grid for selects (and anything returning rows), log line for the rest.
    fn apply_outcome(&mut self, outcome: StatementOutcome) {
        let shows_grid = outcome.shows_grid();
        if let Some(message) = outcome.classification.message {
            let line = if self.show_timing {
                format!("{} ({}ms)", message, outcome.result.elapsed_ms)
            } else {
                message
            };
            self.log_info(line);
            if !shows_grid {
                self.result_tab = ResultTab::History;
            }
        }
        if shows_grid {
            self.show_result(outcome.result);
        }
    }

    fn show_result(&mut self, result: QueryResult) {
        self.result = result;
        self.result_scroll = 0;
        self.result_col_scroll = 0;
        self.current_result_set = 0;
        self.result_tab = ResultTab::Result;
    }

    /// Report an error in the result pane and the log.
    fn fail(&mut self, message: String) {
        self.result = QueryResult {
            error: Some(message.clone()),
            ..Default::default()
        };
        self.log_error(message);
        self.result_tab = ResultTab::History;
    }

    /// Scroll results down.
    pub fn scroll_results_down(&mut self) {
        let row_count = self.result.rows_for(self.current_result_set).len();
        if self.result_scroll + 1 < row_count {
            self.result_scroll += 1;
        }
    }

    /// Scroll results up.
    pub fn scroll_results_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }

    /// Scroll results right (horizontal).
    pub fn scroll_results_right(&mut self) {
        let col_count = self.result.columns_for(self.current_result_set).len();
        if col_count > 0 && self.result_col_scroll + 1 < col_count {
            self.result_col_scroll += 1;
        }
    }

    /// Scroll results left (horizontal).
    pub fn scroll_results_left(&mut self) {
        self.result_col_scroll = self.result_col_scroll.saturating_sub(1);
    }

    /// Move the explorer selection down.
    pub fn scroll_sidebar_down(&mut self) {
        let len = flatten_tree(&self.objects).len();
        if self.sidebar_selected + 1 < len {
            self.sidebar_selected += 1;
        }
    }

    /// Move the explorer selection up.
    pub fn scroll_sidebar_up(&mut self) {
        self.sidebar_selected = self.sidebar_selected.saturating_sub(1);
    }

    /// Navigate to the next result set.
    pub fn next_result_set(&mut self) {
        if self.current_result_set + 1 < self.result.result_sets.len() {
            self.current_result_set += 1;
            self.result_scroll = 0;
            self.result_col_scroll = 0;
        }
    }

    /// Navigate to the previous result set.
    pub fn prev_result_set(&mut self) {
        if self.current_result_set > 0 {
            self.current_result_set -= 1;
            self.result_scroll = 0;
            self.result_col_scroll = 0;
        }
    }

    /// Rebuild the explorer from the workspace, keeping expanded databases expanded.
    pub fn rebuild_explorer(&mut self) {
        let expanded: Vec<String> = self
            .objects
            .iter()
            .filter(|n| n.expanded)
            .filter_map(|n| n.detail.clone())
            .collect();

        self.objects = self
            .workspace
            .databases()
            .iter()
            .enumerate()
            .map(|(i, db)| {
                let path = db.path.display().to_string();
                ObjectNode {
                    name: db.name.clone(),
                    expanded: expanded.contains(&path),
                    detail: Some(path),
                    kind: NodeKind::Database(i),
                    depth: 0,
                    children: db
                        .tables
                        .iter()
                        .map(|t| ObjectNode {
                            name: t.clone(),
                            detail: None,
                            kind: NodeKind::Table { database: i },
                            depth: 1,
                            expanded: false,
                            children: Vec::new(),
                        })
                        .collect(),
                }
            })
            .collect();

        let len = flatten_tree(&self.objects).len();
        self.sidebar_selected = self.sidebar_selected.min(len.saturating_sub(1));
    }

    fn flat_index_of_database(&self, idx: usize) -> usize {
        flatten_tree(&self.objects)
            .iter()
            .position(|n| n.kind == NodeKind::Database(idx))
            .unwrap_or(0)
    }

    /// The explorer node under the selection.
    pub fn selected_node(&self) -> Option<&ObjectNode> {
        get_flat_node(&self.objects, self.sidebar_selected)
    }

    /// Toggle expand/collapse on the selected sidebar node.
    pub fn toggle_sidebar_node(&mut self) {
        if let Some(node) = get_flat_node_mut(&mut self.objects, self.sidebar_selected) {
            node.expanded = !node.expanded;
        }
    }

    /// Enter on the explorer: activate the database and expand or collapse it.
    pub fn activate_selected(&mut self) {
        let Some(kind) = self.selected_node().map(|n| n.kind) else {
            return;
        };
        match kind {
            NodeKind::Database(idx) => {
                self.workspace.set_active(idx);
                self.toggle_sidebar_node();
            }
            NodeKind::Table { database } => self.workspace.set_active(database),
        }
    }

    /// Run `SELECT * ... LIMIT n` for the selected table.
    pub fn select_top_rows(&mut self) {
        let Some((database, table)) = self.selected_table() else {
            return;
        };
        self.workspace.set_active(database);
        let sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(&table), self.row_limit);
        self.set_editor_text(&sql);
        self.run_sql(&sql);
    }

    /// Put a DROP TABLE for the selected table into the editor for review.
    pub fn prepare_drop_table(&mut self) {
        let Some((database, table)) = self.selected_table() else {
            return;
        };
        self.workspace.set_active(database);
        self.set_editor_text(&format!("DROP TABLE {}", quote_ident(&table)));
        self.focus = FocusPane::Editor;
        self.log_info(format!("Press Ctrl+Enter to drop table {}", table));
    }

    /// Put a `\create` template for the selected database into the editor.
    pub fn prepare_create_table(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        let database = match node.kind {
            NodeKind::Database(i) => i,
            NodeKind::Table { database } => database,
        };
        self.workspace.set_active(database);
        self.set_editor_text("\\create new_table id:integer:pk:ai name:text:nn");
        self.focus = FocusPane::Editor;
    }

    /// Remove the selected database from the workspace.
    pub fn remove_selected_database(&mut self) {
        let Some(NodeKind::Database(idx)) = self.selected_node().map(|n| n.kind) else {
            return;
        };
        self.run_command(&SlashCommand::Close(Some((idx + 1).to_string())), "");
    }

    pub fn expand_all(&mut self) {
        set_expanded(&mut self.objects, true);
    }

    pub fn collapse_all(&mut self) {
        set_expanded(&mut self.objects, false);
        let len = flatten_tree(&self.objects).len();
        self.sidebar_selected = self.sidebar_selected.min(len.saturating_sub(1));
    }

    fn selected_table(&self) -> Option<(usize, String)> {
        let node = self.selected_node()?;
        match node.kind {
            NodeKind::Table { database } => Some((database, node.name.clone())),
            NodeKind::Database(_) => None,
        }
    }
}

fn new_editor(lines: Vec<String>) -> tui_textarea::TextArea<'static> {
    let mut editor = tui_textarea::TextArea::new(lines);
    editor.set_cursor_line_style(ratatui::style::Style::default());
    editor
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or_default()
}

fn set_expanded(nodes: &mut [ObjectNode], expanded: bool) {
    for node in nodes {
        if !node.children.is_empty() {
            node.expanded = expanded;
        }
        set_expanded(&mut node.children, expanded);
    }
}

/// Get the node at the given flat index in the tree.
fn get_flat_node(nodes: &[ObjectNode], target: usize) -> Option<&ObjectNode> {
    flatten_tree(nodes).into_iter().nth(target)
}

/// Get a mutable reference to the node at the given flat index in the tree.
fn get_flat_node_mut(nodes: &mut [ObjectNode], target: usize) -> Option<&mut ObjectNode> {
    let mut idx = 0;
    get_flat_node_mut_inner(nodes, target, &mut idx)
}

fn get_flat_node_mut_inner<'a>(
    nodes: &'a mut [ObjectNode],
    target: usize,
    idx: &mut usize,
) -> Option<&'a mut ObjectNode> {
    for node in nodes.iter_mut() {
        if *idx == target {
            return Some(node);
        }
        *idx += 1;
        if node.expanded
            && let Some(found) = get_flat_node_mut_inner(&mut node.children, target, idx)
        {
            return Some(found);
        }
    }
    None
}

/// Flatten the visible part of the tree in display order.
pub fn flatten_tree(nodes: &[ObjectNode]) -> Vec<&ObjectNode> {
    let mut out = Vec::new();
    flatten_tree_inner(nodes, &mut out);
    out
}

fn flatten_tree_inner<'a>(nodes: &'a [ObjectNode], out: &mut Vec<&'a ObjectNode>) {
    for node in nodes {
        out.push(node);
        if node.expanded {
            flatten_tree_inner(&node.children, out);
        }
    }
}
