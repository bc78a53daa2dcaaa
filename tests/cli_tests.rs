use std::{fs, path::Path};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

fn sixdegrees() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sixdegrees"));
    cmd.env_remove("SIXDEGREES_LOG");
    cmd
}

fn write_group(dir: &Path, file: &str, group: &str, members: &[&str]) {
    let members: Vec<serde_json::Value> = members
        .iter()
        .map(|name| serde_json::json!({ "name": name }))
        .collect();
    let doc = serde_json::json!({ "group": { "name": group }, "members": members });
    fs::write(dir.join(file), doc.to_string()).expect("write group");
}

/// A database with R-F1-A-F2-B plus the disconnected pair C and D.
fn prepared_db() -> (TempDir, String) {
    let dir = tempdir().expect("tempdir");
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).expect("docs dir");
    write_group(&docs, "1.json", "F1", &["R", "A"]);
    write_group(&docs, "2.json", "F2", &["A", "B"]);
    write_group(&docs, "3.json", "F3", &["C", "D"]);
    let db = dir.path().join("degrees.db").to_str().expect("utf8").to_string();
    sixdegrees()
        .args(["--db", &db, "--root", "R", "ingest"])
        .arg(&docs)
        .assert()
        .success();
    (dir, db)
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run");
    assert!(output.status.success(), "{output:?}");
    String::from_utf8(output.stdout).expect("utf8")
}

#[test]
fn test_cli_exits_with_success_on_help() {
    let output = sixdegrees().arg("--help").output().expect("run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage: sixdegrees"));
}

#[test]
fn test_cli_status_command() {
    let out = stdout_of(sixdegrees().arg("status"));
    assert!(out.contains("people=0"), "{out}");
    assert!(out.contains("root=unset"), "{out}");
}

#[test]
fn test_cli_usage_errors_exit_with_two() {
    sixdegrees().arg("--bogus").assert().code(2);
    sixdegrees().arg("find").assert().code(2);
    sixdegrees().args(["--batch-size", "none", "status"]).assert().code(2);
}

#[test]
fn test_cli_find_prints_path() {
    let (_dir, db) = prepared_db();
    let out = stdout_of(sixdegrees().args(["--db", &db, "--root", "R", "find", "b"]));
    assert!(out.contains("B is 2 degrees of separation away."), "{out}");
    assert!(out.contains("R was in F1 with A."), "{out}");
    assert!(out.contains("A was in F2 with B."), "{out}");

    let root = stdout_of(sixdegrees().args(["--db", &db, "--root", "R", "find", "R"]));
    assert!(root.contains("is the root person"), "{root}");
    let missing = stdout_of(sixdegrees().args(["--db", &db, "--root", "R", "find", "Nobody"]));
    assert!(missing.contains("No person named Nobody."), "{missing}");
    let apart = stdout_of(sixdegrees().args(["--db", &db, "--root", "R", "find", "C"]));
    assert!(apart.contains("not connected"), "{apart}");
}

#[test]
fn test_cli_cache_and_unreachable() {
    let (_dir, db) = prepared_db();
    let summary = stdout_of(sixdegrees().args(["--db", &db, "--root", "R", "--cache", "find-all"]));
    assert!(summary.contains("people=3"), "{summary}");

    let status = stdout_of(sixdegrees().args(["--db", &db, "status"]));
    assert!(status.contains("cached_results=3"), "{status}");
    assert!(status.contains("root=R"), "{status}");

    let unreachable = stdout_of(sixdegrees().args(["--db", &db, "--root", "R", "unreachable"]));
    assert!(unreachable.contains("F3: C, D"), "{unreachable}");
}

#[test]
fn test_cli_reports_malformed_ingest() {
    let dir = tempdir().expect("tempdir");
    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{ nope").expect("write");
    sixdegrees().arg("ingest").arg(&bad).assert().code(1);
}

#[test]
fn test_cli_ingest_replace_swaps_contents() {
    let (dir, db) = prepared_db();
    let fresh = dir.path().join("fresh");
    fs::create_dir(&fresh).expect("fresh dir");
    write_group(&fresh, "1.json", "Only", &["R", "Z"]);
    let out = stdout_of(
        sixdegrees()
            .args(["--db", &db, "--root", "R", "ingest", "--replace"])
            .arg(&fresh),
    );
    assert!(out.contains("replaced store"), "{out}");

    let status = stdout_of(sixdegrees().args(["--db", &db, "status"]));
    assert!(status.contains("people=2 groups=1 memberships=2"), "{status}");
    assert!(status.contains("root=R"), "{status}");
    let gone = stdout_of(sixdegrees().args(["--db", &db, "--root", "R", "find", "B"]));
    assert!(gone.contains("No person named B."), "{gone}");
}
