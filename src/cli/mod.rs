//! Non-interactive CLI mode for scripting and piped input.

use crate::Args;
use crate::app::ResultSet;
use crate::commands::{self, CommandAction};
use crate::config::Config;
use crate::db::{Workspace, query};
use crate::error::{PurrError, Result};
use serde_json::{Map, Value};
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

/// How result sets are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = PurrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(PurrError::Config(format!(
                "unknown output format '{}' (expected table, csv or json)",
                other
            ))),
        }
    }
}

/// Whether to keep reading input after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run purr in CLI mode. Returns `false` when a statement failed.
pub fn run(args: Args, config: Config) -> Result<bool> {
    let format: OutputFormat = args.format.parse()?;

    let mut workspace = Workspace::new();
    for path in &config.databases {
        workspace.open(path)?;
    }
    if workspace.is_empty() {
        workspace.open_in_memory()?;
    }
    workspace.set_active(0);

    let out: Box<dyn Write> = match args.output {
        Some(ref path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(io::stdout()),
    };
    let mut session = Session::new(workspace, io::BufWriter::new(out), format, &config);

    // Determine SQL source
    let script = if let Some(ref sql) = args.command {
        Some(sql.clone())
    } else if let Some(ref input_file) = args.input {
        Some(std::fs::read_to_string(input_file)?)
    } else if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().lock().read_to_string(&mut buf)?;
        Some(buf)
    } else {
        None
    };

    let ok = match script {
        Some(text) => match session.run_script(&text) {
            Ok(_) => true,
            Err(e) => {
                eprintln!("Error: {}", e);
                false
            }
        },
        None => {
            session.repl(io::stdin().lock())?;
            true
        }
    };
    session.out.flush()?;
    Ok(ok)
}

/// A CLI session: open databases, output settings and the output sink.
pub struct Session<W: Write> {
    pub workspace: Workspace,
    pub out: W,
    pub format: OutputFormat,
    pub expanded: bool,
    pub timing: bool,
    /// Canonical paths of the `\i` files currently being run.
    includes: Vec<PathBuf>,
}

impl<W: Write> Session<W> {
    pub fn new(workspace: Workspace, out: W, format: OutputFormat, config: &Config) -> Self {
        Self {
            workspace,
            out,
            format,
            expanded: config.expanded,
            timing: config.timing,
            includes: Vec::new(),
        }
    }

    /// Run a whole script. Lines starting with `\` are slash commands; the SQL
    /// between them runs statement by statement. Stops at the first error.
    pub fn run_script(&mut self, text: &str) -> Result<Flow> {
        let mut pending = String::new();
        for line in text.lines() {
            if line.trim_start().starts_with('\\') {
                self.run_sql(&std::mem::take(&mut pending))?;
                if self.run_command(line.trim())? == Flow::Quit {
                    return Ok(Flow::Quit);
                }
            } else {
                pending.push_str(line);
                pending.push('\n');
            }
        }
        self.run_sql(&pending)?;
        Ok(Flow::Continue)
    }

    /// Line-by-line REPL. SQL runs once a line ends with `;`.
    pub fn repl(&mut self, mut input: impl BufRead) -> Result<()> {
        let mut stdout = io::stdout();
        let mut pending = String::new();

        loop {
            let prompt = if pending.is_empty() { "purr> " } else { "  ...> " };
            write!(stdout, "{}", prompt)?;
            stdout.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break; // EOF
            }

            let trimmed = line.trim();
            if pending.is_empty() && trimmed.is_empty() {
                continue;
            }
            if pending.is_empty()
                && (trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit"))
            {
                break;
            }

            let outcome = if trimmed.starts_with('\\') {
                self.run_command(trimmed)
            } else {
                pending.push_str(&line);
                if trimmed.ends_with(';') {
                    self.run_sql(&std::mem::take(&mut pending))
                        .map(|_| Flow::Continue)
                } else {
                    Ok(Flow::Continue)
                }
            };
            self.out.flush()?;

            match outcome {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        if !pending.trim().is_empty()
            && let Err(e) = self.run_sql(&pending)
        {
            eprintln!("Error: {}", e);
        }
        Ok(())
    }

    /// Execute SQL against the active database and print each outcome.
    pub fn run_sql(&mut self, sql: &str) -> Result<()> {
        if sql.trim().is_empty() {
            return Ok(());
        }
        let db = self.workspace.active_mut().ok_or(PurrError::NoDatabase)?;
        let (outcomes, failure) = match query::run_script(db, sql) {
            Ok(outcomes) => (outcomes, None),
            Err(f) => (f.completed, Some(f.error)),
        };

        for outcome in &outcomes {
            debug!(sql = %outcome.sql, kind = ?outcome.classification.kind, "statement done");
            if outcome.shows_grid() {
                for set in &outcome.result.result_sets {
                    self.print_set(set)?;
                }
            }
            if let Some(ref message) = outcome.classification.message {
                self.print_message(message)?;
            }
            if self.timing {
                self.print_message(&format!("Time: {} ms", outcome.result.elapsed_ms))?;
            }
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Carry out one slash command line.
    pub fn run_command(&mut self, line: &str) -> Result<Flow> {
        let Some(cmd) = commands::parse(line) else {
            return Err(PurrError::Command(format!("unknown command: {}", line)));
        };
        match commands::to_action(&cmd, &self.workspace) {
            CommandAction::ExecuteSql(sql) | CommandAction::GeneratedSql(sql) => {
                self.run_sql(&sql)?
            }
            CommandAction::DisplayMessage { columns, rows } => {
                self.print_set(&ResultSet { columns, rows })?
            }
            CommandAction::OpenDatabase(path) => {
                let db = self.workspace.open(&path)?;
                let msg = format!("Opened {} ({} tables)", db.path.display(), db.tables.len());
                self.print_message(&msg)?;
            }
            CommandAction::CloseDatabase(target) => {
                let db = self.workspace.close(target.as_deref())?;
                self.print_message(&format!("Closed {}", db.name))?;
            }
            CommandAction::SwitchDatabase(target) => {
                let name = self.workspace.switch(&target)?.name.clone();
                self.print_message(&format!("Switched to {}", name))?;
            }
            CommandAction::LoadEditor(path) => return self.include(&path),
            CommandAction::SaveEditor(_) => {
                return Err(PurrError::Command(
                    "\\w is only available in the editor".to_string(),
                ));
            }
            CommandAction::Error(msg) => return Err(PurrError::Command(msg)),
            CommandAction::ToggleExpanded => {
                self.expanded = !self.expanded;
                let state = if self.expanded { "on" } else { "off" };
                self.print_message(&format!("Expanded display is {}.", state))?;
            }
            CommandAction::ToggleTiming => {
                self.timing = !self.timing;
                let state = if self.timing { "on" } else { "off" };
                self.print_message(&format!("Timing is {}.", state))?;
            }
            CommandAction::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Run a `\\i` file. A file already on the include stack is a cycle.
    fn include(&mut self, path: &Path) -> Result<Flow> {
        let canonical = path.canonicalize()?;
        if self.includes.contains(&canonical) {
            return Err(PurrError::Command(format!(
                "\\i {}: file includes itself",
                path.display()
            )));
        }
        info!(path = %path.display(), depth = self.includes.len(), "including script");
        let text = std::fs::read_to_string(&canonical)?;
        self.includes.push(canonical);
        let flow = self.run_script(&text);
        self.includes.pop();
        flow
    }

    /// Status lines go with the table output, and to stderr when the output
    /// must stay machine readable.
    fn print_message(&mut self, message: &str) -> Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(self.out, "{}", message)?,
            OutputFormat::Csv | OutputFormat::Json => eprintln!("{}", message),
        }
        Ok(())
    }

    fn print_set(&mut self, set: &ResultSet) -> Result<()> {
        match self.format {
            OutputFormat::Csv => print_csv(&mut self.out, set),
            OutputFormat::Json => print_json(&mut self.out, set),
            OutputFormat::Table if self.expanded => print_expanded(&mut self.out, set),
            OutputFormat::Table => print_table(&mut self.out, set),
        }
    }
}

/// Print a result set as an ASCII table.
fn print_table(writer: &mut dyn Write, set: &ResultSet) -> Result<()> {
    // Calculate column widths
    let widths: Vec<usize> = set
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let max_data = set
                .rows
                .iter()
                .map(|r| r.get(i).map(|s| s.width()).unwrap_or(0))
                .max()
                .unwrap_or(0);
            col.width().max(max_data)
        })
        .collect();

    // Header
    let header: Vec<String> = set
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(c, *w))
        .collect();
    writeln!(writer, "{}", header.join(" | ").trim_end())?;

    // Separator
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(writer, "{}", sep.join("-+-"))?;

    // Data rows
    for row in &set.rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(val, w)| pad(val, *w))
            .collect();
        writeln!(writer, "{}", cells.join(" | ").trim_end())?;
    }

    let noun = if set.rows.len() == 1 { "row" } else { "rows" };
    writeln!(writer, "({} {})", set.rows.len(), noun)?;
    Ok(())
}

/// Left-align to a display width.
fn pad(text: &str, width: usize) -> String {
    format!("{}{}", text, " ".repeat(width.saturating_sub(text.width())))
}

/// Print one `column | value` line per field, records separated by a header.
fn print_expanded(writer: &mut dyn Write, set: &ResultSet) -> Result<()> {
    let label_width = set.columns.iter().map(|c| c.width()).max().unwrap_or(0);
    for (n, row) in set.rows.iter().enumerate() {
        writeln!(writer, "-[ RECORD {} ]-", n + 1)?;
        for (col, val) in set.columns.iter().zip(row) {
            writeln!(writer, "{} | {}", pad(col, label_width), val)?;
        }
    }
    if set.rows.is_empty() {
        writeln!(writer, "(0 rows)")?;
    }
    Ok(())
}

/// Print a result set as CSV.
fn print_csv(writer: &mut dyn Write, set: &ResultSet) -> Result<()> {
    let header: Vec<String> = set.columns.iter().map(|c| csv_field(c)).collect();
    writeln!(writer, "{}", header.join(","))?;
    for row in &set.rows {
        let escaped: Vec<String> = row.iter().map(|v| csv_field(v)).collect();
        writeln!(writer, "{}", escaped.join(","))?;
    }
    Ok(())
}

fn csv_field(v: &str) -> String {
    if v.contains(',') || v.contains('"') || v.contains('\n') {
        format!("\"{}\"", v.replace('"', "\"\""))
    } else {
        v.to_string()
    }
}

/// Print a result set as a JSON array of objects keyed by column name.
fn print_json(writer: &mut dyn Write, set: &ResultSet) -> Result<()> {
    let records: Vec<Value> = set
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = set
                .columns
                .iter()
                .zip(row)
                .map(|(col, val)| (col.clone(), Value::String(val.clone())))
                .collect();
            Value::Object(object)
        })
        .collect();
    let text = serde_json::to_string_pretty(&records).map_err(io::Error::from)?;
    writeln!(writer, "{}", text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session(format: OutputFormat) -> Session<Vec<u8>> {
        let mut workspace = Workspace::new();
        workspace.open_in_memory().unwrap();
        Session::new(workspace, Vec::new(), format, &Config::default())
    }

    fn output(session: &Session<Vec<u8>>) -> String {
        String::from_utf8(session.out.clone()).unwrap()
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_script_prints_messages_and_table() {
        let mut s = session(OutputFormat::Table);
        s.run_script(
            "create table t(id integer, name text);\ninsert into t values (1, 'a'), (2, 'b');\nselect * from t;",
        )
        .unwrap();
        assert_eq!(
            output(&s),
            "Table created: 0 rows affected\n\
             Succeed: 2 rows affected\n\
             id | name\n\
             ---+-----\n\
             1  | a\n\
             2  | b\n\
             (2 rows)\n"
        );
    }

    #[test]
    fn test_script_stops_at_error() {
        let mut s = session(OutputFormat::Table);
        let err = s
            .run_script("create table t(x); select * from missing; insert into t values (1);")
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
        let count: i64 = s
            .workspace
            .active()
            .unwrap()
            .conn
            .query_row("select count(*) from t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_slash_commands_in_script() {
        let mut s = session(OutputFormat::Table);
        s.run_script("\\create people id:integer:pk name:text\n\\dt").unwrap();
        let out = output(&s);
        assert!(out.starts_with("Table created: 0 rows affected\n"));
        assert!(out.contains("people"));
    }

    #[test]
    fn test_quit_stops_script() {
        let mut s = session(OutputFormat::Table);
        let flow = s.run_script("\\q\ncreate table t(x);").unwrap();
        assert_eq!(flow, Flow::Quit);
        assert!(s.workspace.active().unwrap().tables.is_empty());
    }

    #[test]
    fn test_csv_output_escapes() {
        let mut s = session(OutputFormat::Csv);
        s.run_sql("select 'a,b' as v, 'say \"hi\"' as w").unwrap();
        assert_eq!(output(&s), "v,w\n\"a,b\",\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_json_output() {
        let mut s = session(OutputFormat::Json);
        s.run_sql("select 1 as n, null as z").unwrap();
        let value: Value = serde_json::from_str(&output(&s)).unwrap();
        assert_eq!(value, serde_json::json!([{ "n": "1", "z": "NULL" }]));
    }

    #[test]
    fn test_expanded_toggle() {
        let mut s = session(OutputFormat::Table);
        s.run_command("\\x").unwrap();
        s.run_sql("select 1 as id, 'x' as label").unwrap();
        assert_eq!(
            output(&s),
            "Expanded display is on.\n-[ RECORD 1 ]-\nid    | 1\nlabel | x\n"
        );
    }

    #[test]
    fn test_include_cycle_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let own = dir.path().join("self.sql");
        std::fs::write(&own, format!("select 1;\n\\i {}\n", own.display())).unwrap();
        let mut s = session(OutputFormat::Csv);
        let err = s.run_command(&format!("\\i {}", own.display())).unwrap_err();
        assert!(matches!(err, PurrError::Command(_)));
        assert!(err.to_string().contains("includes itself"));
        assert!(s.includes.is_empty());
    }

    #[test]
    fn test_mutual_includes_detected() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.sql");
        let b = dir.path().join("b.sql");
        std::fs::write(&a, format!("\\i {}\n", b.display())).unwrap();
        std::fs::write(&b, format!("\\i {}\n", a.display())).unwrap();
        let mut s = session(OutputFormat::Table);
        assert!(s.run_command(&format!("\\i {}", a.display())).is_err());
    }

    #[test]
    fn test_same_file_included_twice_in_sequence() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("one.sql");
        std::fs::write(&file, "select 1 as n;\n").unwrap();
        let mut s = session(OutputFormat::Csv);
        let line = format!("\\i {}", file.display());
        s.run_script(&format!("{}\n{}", line, line)).unwrap();
        assert_eq!(output(&s), "n\n1\nn\n1\n");
    }

    #[test]
    fn test_unknown_command_error() {
        let mut s = session(OutputFormat::Table);
        let err = s.run_command("\\nope").unwrap_err();
        assert!(matches!(err, PurrError::Command(_)));
        assert_eq!(err.to_string(), "unknown command: \\nope");
    }

    #[test]
    fn test_trailing_comment_script_succeeds() {
        let mut s = session(OutputFormat::Table);
        s.run_script("select 1 as a; -- done").unwrap();
        assert_eq!(output(&s), "a\n-\n1\n(1 row)\n");
    }

    #[test]
    fn test_write_rejected_outside_editor() {
        let mut s = session(OutputFormat::Table);
        assert!(s.run_command("\\w out.sql").is_err());
    }

    #[test]
    fn test_repl_runs_on_semicolon() {
        let mut s = session(OutputFormat::Table);
        let input = "create table t(x)\n;\ninsert into t values (7);\nquit\n";
        s.repl(input.as_bytes()).unwrap();
        assert_eq!(
            output(&s),
            "Table created: 0 rows affected\nSucceed: 1 rows affected\n"
        );
    }
}
