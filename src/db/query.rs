//! Query execution and result formatting.

use crate::app::{QueryResult, ResultSet};
use crate::classify::{self, Classification, QueryKind};
use crate::db::Database;
use crate::error::Result;
use crate::script;
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use std::time::Instant;
use tracing::{debug, warn};

/// Execute a single SQL statement and return structured results.
///
/// Text holding only comments is a no-op with no rows affected.
pub fn execute_query(conn: &Connection, sql: &str) -> Result<QueryResult> {
    if script::split_statements(sql).is_empty() {
        return Ok(QueryResult::default());
    }
    let start = Instant::now();
    let changes_before = total_changes(conn)?;

    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut result = QueryResult::default();
    if columns.is_empty() {
        stmt.execute([])?;
    } else {
        let column_count = columns.len();
        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                cells.push(format_value(row.get_ref(i)?));
            }
            rows.push(cells);
        }
        result.result_sets.push(ResultSet { columns, rows });
    }
    drop(stmt);

    result.affected_rows = total_changes(conn)?.saturating_sub(changes_before);
    result.elapsed_ms = start.elapsed().as_millis();
    debug!(
        rows = result.total_rows(),
        affected = result.affected_rows,
        elapsed_ms = result.elapsed_ms as u64,
        "statement executed"
    );
    Ok(result)
}

/// SQLite's running count of rows changed by INSERT/UPDATE/DELETE.
fn total_changes(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT total_changes()", [], |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

/// Format a SQLite value into a display string.
pub fn format_value(val: ValueRef<'_>) -> String {
    match val {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("0x{}", hex_encode(b)),
    }
}

/// Simple hex encoding for binary data.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// User tables of a database, sorted by name.
pub fn fetch_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tables)
}

/// Quote an identifier for SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Result of one statement of a script.
#[derive(Debug, Clone)]
pub struct StatementOutcome {
    pub sql: String,
    pub classification: Classification,
    pub result: QueryResult,
}

/// A script run that stopped at a failing statement.
#[derive(Debug)]
pub struct ScriptFailure {
    /// Statements that completed before the failure.
    pub completed: Vec<StatementOutcome>,
    pub sql: String,
    pub error: crate::error::PurrError,
}

/// Run every statement in `sql` against `db` in order.
///
/// Stops at the first error. The table list is refreshed after CREATE/DROP.
pub fn run_script(
    db: &mut Database,
    sql: &str,
) -> std::result::Result<Vec<StatementOutcome>, ScriptFailure> {
    let mut outcomes = Vec::new();
    for statement in script::split_statements(sql) {
        let result = match execute_query(&db.conn, &statement) {
            Ok(result) => result,
            Err(error) => {
                warn!(database = %db.name, %error, "statement failed");
                return Err(ScriptFailure {
                    completed: outcomes,
                    sql: statement,
                    error,
                });
            }
        };
        let classification = classify::classify(&statement, result.affected_rows);
        if classification.kind.refreshes_tables()
            && let Err(error) = db.refresh_tables()
        {
            warn!(database = %db.name, %error, "failed to refresh tables");
        }
        outcomes.push(StatementOutcome {
            sql: statement,
            classification,
            result,
        });
    }
    Ok(outcomes)
}

impl StatementOutcome {
    /// Whether the grid, rather than only the log, should show this outcome.
    pub fn shows_grid(&self) -> bool {
        self.classification.kind == QueryKind::Select || !self.result.result_sets.is_empty()
    }
}
