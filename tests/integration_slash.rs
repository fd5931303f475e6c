//! Integration tests for slash commands against real SQLite files.

use purr::commands::{self, CommandAction};
use purr::db::{Workspace, query};
use tempfile::TempDir;

/// Helper: a workspace with one database holding a small schema.
fn workspace(dir: &TempDir) -> Workspace {
    let mut ws = Workspace::new();
    let db = ws.open(&dir.path().join("shop.db")).unwrap();
    query::run_script(
        db,
        "create table customers(id integer primary key, name text not null);
         create view named as select name from customers;
         create index idx_name on customers(name);
         insert into customers(name) values ('ann'), ('bob');",
    )
    .unwrap();
    ws
}

/// Helper: run a slash command that maps to SQL, returning (columns, rows).
fn run_command(ws: &Workspace, input: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let cmd = commands::parse(input).unwrap();
    let CommandAction::ExecuteSql(sql) = commands::to_action(&cmd, ws) else {
        panic!("{} did not produce SQL", input);
    };
    let result = query::execute_query(&ws.active().unwrap().conn, &sql).unwrap();
    let set = result.result_sets.into_iter().next().unwrap_or_default();
    (set.columns, set.rows)
}

#[test]
fn test_slash_d_list_all() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir);
    let (cols, rows) = run_command(&ws, "\\d");
    assert_eq!(cols, vec!["type", "name"]);
    assert_eq!(
        rows,
        vec![
            vec!["table".to_string(), "customers".to_string()],
            vec!["view".to_string(), "named".to_string()],
        ]
    );
}

#[test]
fn test_slash_d_describe_table() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir);
    let (cols, rows) = run_command(&ws, "\\d customers");
    assert!(cols.contains(&"name".to_string()));
    assert!(cols.contains(&"type".to_string()));
    assert!(cols.contains(&"notnull".to_string()));
    let names: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
    assert_eq!(names, vec!["id", "name"]);
}

#[test]
fn test_slash_dt_dv_di() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir);

    let (_, tables) = run_command(&ws, "\\dt");
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0][0], "customers");

    let (_, views) = run_command(&ws, "\\dv");
    assert_eq!(views[0][0], "named");

    let (cols, indexes) = run_command(&ws, "\\di");
    assert_eq!(cols[0], "table_name");
    assert!(indexes.iter().any(|r| r[1] == "idx_name"));
}

#[test]
fn test_slash_l_lists_open_databases() {
    let dir = TempDir::new().unwrap();
    let mut ws = workspace(&dir);
    ws.open(&dir.path().join("other.db")).unwrap();

    let cmd = commands::parse("\\l").unwrap();
    let CommandAction::DisplayMessage { columns, rows } = commands::to_action(&cmd, &ws) else {
        panic!("expected a message");
    };
    assert_eq!(columns[1], "Name");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "2*");
    assert_eq!(rows[0][3], "1");
}

#[test]
fn test_slash_c_switches_active_database() {
    let dir = TempDir::new().unwrap();
    let mut ws = workspace(&dir);
    ws.open(&dir.path().join("other.db")).unwrap();

    let cmd = commands::parse("\\c shop.db").unwrap();
    let CommandAction::SwitchDatabase(target) = commands::to_action(&cmd, &ws) else {
        panic!("expected a switch");
    };
    assert_eq!(ws.switch(&target).unwrap().name, "shop.db");

    let (_, rows) = run_command(&ws, "\\dt");
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_slash_create_generates_runnable_sql() {
    let dir = TempDir::new().unwrap();
    let mut ws = workspace(&dir);

    let cmd = commands::parse("\\create orders id:integer:pk:ai total:real:nn").unwrap();
    let CommandAction::GeneratedSql(sql) = commands::to_action(&cmd, &ws) else {
        panic!("expected generated SQL");
    };
    let outcomes = query::run_script(ws.active_mut().unwrap(), &sql).unwrap();
    assert_eq!(
        outcomes[0].classification.message.as_deref(),
        Some("Table created: 0 rows affected")
    );
    assert_eq!(ws.active().unwrap().tables, vec!["customers", "orders"]);
}

#[test]
fn test_slash_create_rejects_bad_column() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir);
    let cmd = commands::parse("\\create orders id:money").unwrap();
    assert!(matches!(
        commands::to_action(&cmd, &ws),
        CommandAction::Error(_)
    ));
}

#[test]
fn test_drop_table_refreshes_tables() {
    let dir = TempDir::new().unwrap();
    let mut ws = workspace(&dir);
    let outcomes =
        query::run_script(ws.active_mut().unwrap(), "drop view named; drop table customers")
            .unwrap();
    assert_eq!(
        outcomes[1].classification.message.as_deref(),
        Some("Table deleted: 0 rows affected")
    );
    assert!(ws.active().unwrap().tables.is_empty());
}

#[test]
fn test_reopen_sees_persisted_rows() {
    let dir = TempDir::new().unwrap();
    drop(workspace(&dir));

    let mut ws = Workspace::new();
    let db = ws.open(&dir.path().join("shop.db")).unwrap();
    assert_eq!(db.tables, vec!["customers"]);
    let result = query::execute_query(&db.conn, "select count(*) from customers").unwrap();
    assert_eq!(result.result_sets[0].rows, vec![vec!["2".to_string()]]);
}
