//! Slash command parser and SQL generation for psql-style commands.

use crate::db::Workspace;
use crate::db::query::quote_ident;
use crate::schema::{ColumnSpec, TableSpec};
use std::path::PathBuf;

/// Parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    /// `\d` — list all tables and views.
    ListAll,
    /// `\d <table>` — describe a table's columns.
    Describe(String),
    /// `\dt` — list tables only.
    ListTables,
    /// `\dv` — list views only.
    ListViews,
    /// `\di` — list indexes.
    ListIndexes,
    /// `\l` — list open databases.
    ListDatabases,
    /// `\o <file>` — open or create a database file.
    Open(PathBuf),
    /// `\close [name]` — remove a database from the explorer.
    Close(Option<String>),
    /// `\c <name|index>` — switch the active database.
    UseDatabase(String),
    /// `\create [--if-not-exists] <table> <col:type[:pk][:ai][:nn]>...`
    CreateTable(Vec<String>),
    /// `\w <file>` — save the editor to a file.
    Write(PathBuf),
    /// `\i <file>` — load a SQL file into the editor.
    Include(PathBuf),
    /// `\conninfo` — show the active database.
    ConnInfo,
    /// `\x` — toggle expanded display.
    ToggleExpanded,
    /// `\timing` — toggle query timing display.
    ToggleTiming,
    /// `\?` — show help.
    Help,
    /// `\q` — quit.
    Quit,
}

/// Result of handling a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// Execute this SQL and display results.
    ExecuteSql(String),
    /// A generated statement: shown in the editor for review, executed directly in CLI mode.
    GeneratedSql(String),
    /// Display a message in the results pane (columns + rows).
    DisplayMessage {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    OpenDatabase(PathBuf),
    CloseDatabase(Option<String>),
    SwitchDatabase(String),
    SaveEditor(PathBuf),
    LoadEditor(PathBuf),
    /// The command could not be turned into an action.
    Error(String),
    /// Toggle expanded mode.
    ToggleExpanded,
    /// Toggle timing mode.
    ToggleTiming,
    /// Quit the application.
    Quit,
}

/// Parse input text into a slash command. Returns `None` if not a slash command.
pub fn parse(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('\\') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, char::is_whitespace).collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

    match cmd {
        "\\d" => match arg {
            Some(table) => Some(SlashCommand::Describe(table.to_string())),
            None => Some(SlashCommand::ListAll),
        },
        "\\dt" => Some(SlashCommand::ListTables),
        "\\dv" => Some(SlashCommand::ListViews),
        "\\di" => Some(SlashCommand::ListIndexes),
        "\\l" => Some(SlashCommand::ListDatabases),
        "\\o" => arg.map(|p| SlashCommand::Open(PathBuf::from(p))),
        "\\close" => Some(SlashCommand::Close(arg.map(str::to_string))),
        "\\c" => arg.map(|db| SlashCommand::UseDatabase(db.to_string())),
        "\\create" => arg.map(|a| {
            SlashCommand::CreateTable(a.split_whitespace().map(str::to_string).collect())
        }),
        "\\w" => arg.map(|p| SlashCommand::Write(PathBuf::from(p))),
        "\\i" => arg.map(|p| SlashCommand::Include(PathBuf::from(p))),
        "\\conninfo" => Some(SlashCommand::ConnInfo),
        "\\x" => Some(SlashCommand::ToggleExpanded),
        "\\timing" => Some(SlashCommand::ToggleTiming),
        "\\?" => Some(SlashCommand::Help),
        "\\q" => Some(SlashCommand::Quit),
        _ => None,
    }
}

/// Split editor text into a body and a slash command on its last non-empty line.
///
/// Lets `\w file` save the text above it.
pub fn split_trailing(text: &str) -> (String, Option<SlashCommand>) {
    let lines: Vec<&str> = text.lines().collect();
    let Some(last) = lines.iter().rposition(|l| !l.trim().is_empty()) else {
        return (String::new(), None);
    };
    match parse(lines[last]) {
        Some(cmd) => (lines[..last].join("\n").trim_end().to_string(), Some(cmd)),
        None => (text.to_string(), None),
    }
}

/// Build a CREATE TABLE statement from `\create` arguments.
fn create_table_sql(args: &[String]) -> Result<String, String> {
    let mut table = TableSpec::default();
    let mut rest = args.iter();
    for arg in rest.by_ref() {
        if arg == "--if-not-exists" {
            table.if_not_exists = true;
        } else {
            table.name = arg.clone();
            break;
        }
    }
    for arg in rest {
        table
            .columns
            .push(ColumnSpec::parse(arg).map_err(|e| e.to_string())?);
    }
    table.generate().map_err(|e| e.to_string())
}

/// Generate the action for a slash command.
pub fn to_action(cmd: &SlashCommand, workspace: &Workspace) -> CommandAction {
    match cmd {
        SlashCommand::ListAll => CommandAction::ExecuteSql(
            "SELECT type, name FROM sqlite_master WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' ORDER BY type, name".to_string(),
        ),
        SlashCommand::Describe(table) => {
            CommandAction::ExecuteSql(format!("PRAGMA table_info({})", quote_ident(table)))
        }
        SlashCommand::ListTables => CommandAction::ExecuteSql(
            "SELECT name, sql FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name".to_string(),
        ),
        SlashCommand::ListViews => CommandAction::ExecuteSql(
            "SELECT name, sql FROM sqlite_master WHERE type = 'view' ORDER BY name".to_string(),
        ),
        SlashCommand::ListIndexes => CommandAction::ExecuteSql(
            "SELECT tbl_name AS table_name, name AS index_name, sql FROM sqlite_master WHERE type = 'index' ORDER BY tbl_name, name".to_string(),
        ),
        SlashCommand::ListDatabases => {
            let active = workspace.active_index();
            CommandAction::DisplayMessage {
                columns: vec![
                    "#".to_string(),
                    "Name".to_string(),
                    "Path".to_string(),
                    "Tables".to_string(),
                ],
                rows: workspace
                    .databases()
                    .iter()
                    .enumerate()
                    .map(|(i, db)| {
                        let marker = if Some(i) == active { "*" } else { "" };
                        vec![
                            format!("{}{}", i + 1, marker),
                            db.name.clone(),
                            db.path.display().to_string(),
                            db.tables.len().to_string(),
                        ]
                    })
                    .collect(),
            }
        }
        SlashCommand::Open(path) => CommandAction::OpenDatabase(path.clone()),
        SlashCommand::Close(target) => CommandAction::CloseDatabase(target.clone()),
        SlashCommand::UseDatabase(db) => CommandAction::SwitchDatabase(db.clone()),
        SlashCommand::CreateTable(args) => match create_table_sql(args) {
            Ok(sql) => CommandAction::GeneratedSql(sql),
            Err(e) => CommandAction::Error(e),
        },
        SlashCommand::Write(path) => CommandAction::SaveEditor(path.clone()),
        SlashCommand::Include(path) => CommandAction::LoadEditor(path.clone()),
        SlashCommand::ConnInfo => match workspace.active() {
            Some(db) => CommandAction::DisplayMessage {
                columns: vec!["Property".to_string(), "Value".to_string()],
                rows: vec![
                    vec!["Database".to_string(), db.name.clone()],
                    vec!["Path".to_string(), db.path.display().to_string()],
                    vec!["Tables".to_string(), db.tables.len().to_string()],
                ],
            },
            None => CommandAction::Error("no database is open".to_string()),
        },
        SlashCommand::ToggleExpanded => CommandAction::ToggleExpanded,
        SlashCommand::ToggleTiming => CommandAction::ToggleTiming,
        SlashCommand::Help => CommandAction::DisplayMessage {
            columns: vec!["Command".to_string(), "Description".to_string()],
            rows: HELP
                .iter()
                .map(|(c, d)| vec![c.to_string(), d.to_string()])
                .collect(),
        },
        SlashCommand::Quit => CommandAction::Quit,
    }
}

const HELP: &[(&str, &str)] = &[
    ("\\d", "List all tables and views"),
    ("\\d <table>", "Describe table columns"),
    ("\\dt", "List tables only"),
    ("\\dv", "List views only"),
    ("\\di", "List indexes"),
    ("\\l", "List open databases"),
    ("\\o <file>", "Open or create a database file"),
    ("\\close [db]", "Remove a database from the explorer"),
    ("\\c <db>", "Switch active database (name or number)"),
    (
        "\\create [--if-not-exists] <t> <col:type[:pk][:ai][:nn]>...",
        "Generate a CREATE TABLE statement",
    ),
    ("\\w <file>", "Save the text above this line to a file"),
    ("\\i <file>", "Load a SQL file into the editor"),
    ("\\conninfo", "Show active database"),
    ("\\x", "Toggle expanded display"),
    ("\\timing", "Toggle query timing display"),
    ("\\?", "Show this help"),
    ("\\q", "Quit"),
];
