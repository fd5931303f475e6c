//! End-to-end tests of the `purr` binary in CLI mode.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn purr() -> Command {
    let mut cmd = Command::cargo_bin("purr").unwrap();
    cmd.env_remove("PURR_LOG");
    cmd
}

#[test]
fn test_command_runs_script_against_file() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("test.db");

    purr()
        .arg(&db)
        .arg("-c")
        .arg("create table t(x int); insert into t values (1), (2); select * from t")
        .assert()
        .success()
        .stdout(predicate::str::contains("Table created: 0 rows affected"))
        .stdout(predicate::str::contains("Succeed: 2 rows affected"))
        .stdout(predicate::str::contains("(2 rows)"));

    assert!(db.exists());
}

#[test]
fn test_piped_stdin_uses_memory_database() {
    purr()
        .write_stdin("select 40 + 2 as answer;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("answer"))
        .stdout(predicate::str::contains("42"));
}

#[test]
fn test_csv_format() {
    purr()
        .args(["--cli", "--format", "csv", "-c", "select 1 as a, 'x,y' as b"])
        .assert()
        .success()
        .stdout("a,b\n1,\"x,y\"\n");
}

#[test]
fn test_json_format_keeps_messages_off_stdout() {
    purr()
        .args([
            "--format",
            "json",
            "-c",
            "create table t(n); insert into t values (5); select n from t",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"n\": \"5\""))
        .stdout(predicate::str::contains("Succeed").not())
        .stderr(predicate::str::contains("Succeed: 1 rows affected"));
}

#[test]
fn test_input_file_with_slash_commands() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("setup.sql");
    std::fs::write(
        &script,
        "\\create pets id:integer:pk name:text:nn\ninsert into pets(name) values ('rex');\n\\dt\n",
    )
    .unwrap();

    purr()
        .arg(dir.path().join("pets.db"))
        .arg("-i")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Table created: 0 rows affected"))
        .stdout(predicate::str::contains("pets"));
}

#[test]
fn test_output_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.csv");

    purr()
        .args(["--format", "csv", "-c", "select 'hi' as greeting", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout("");

    assert_eq!(std::fs::read_to_string(out).unwrap(), "greeting\nhi\n");
}

#[test]
fn test_trailing_comment_succeeds() {
    purr()
        .args(["-c", "select 1 as a; -- done"])
        .assert()
        .success()
        .stdout("a\n-\n1\n(1 row)\n")
        .stderr(predicate::str::contains("Error").not());
}

#[test]
fn test_self_include_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("loop.sql");
    std::fs::write(&script, format!("\\i {}\n", script.display())).unwrap();

    purr()
        .arg("-i")
        .arg(&script)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("includes itself"));
}

#[test]
fn test_error_exits_nonzero() {
    purr()
        .args(["-c", "select * from nowhere; select 1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such table: nowhere"));
}

#[test]
fn test_unknown_format_rejected() {
    purr()
        .args(["--format", "xml", "-c", "select 1"])
        .assert()
        .failure();
}
