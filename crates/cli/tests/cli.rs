//! End-to-end tests of the `pipeline-board` binary against a seeded
//! workspace.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::{tempdir, TempDir};

fn pipeline_board(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pipeline-board").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

fn seeded_workspace() -> TempDir {
    let dir = tempdir().unwrap();
    pipeline_board(&dir).arg("init").assert().success();
    dir
}

fn json_output(dir: &TempDir, args: &[&str]) -> Value {
    let output = pipeline_board(dir).args(args).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let dir = seeded_workspace();
    assert!(dir.path().join(".pipeline-board/config.toml").exists());
    assert!(dir.path().join(".pipeline-board/data/quotes.yaml").exists());

    pipeline_board(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    pipeline_board(&dir).args(["init", "--force"]).assert().success();
}

#[test]
fn test_commands_require_a_workspace() {
    let dir = tempdir().unwrap();
    pipeline_board(&dir)
        .args(["board", "quote"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pipeline-board init"));
}

#[test]
fn test_headless_commands_log_to_stderr_with_rust_log() {
    let dir = seeded_workspace();
    let output = pipeline_board(&dir)
        .args(["board", "quote", "--json"])
        .env("RUST_LOG", "debug")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("board loaded"));
    // Logs never mix into the JSON on stdout.
    serde_json::from_slice::<Value>(&output.stdout).unwrap();

    pipeline_board(&dir)
        .args(["board", "quote"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("board loaded").not());
}

#[test]
fn test_unknown_kind_is_a_usage_error() {
    let dir = seeded_workspace();
    pipeline_board(&dir)
        .args(["board", "invoice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown entity kind"));
}

#[test]
fn test_board_json_has_grouped_columns() {
    let dir = seeded_workspace();
    let board = json_output(&dir, &["board", "quote", "--json"]);

    let groups = board["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0]["name"], "Elaboración");
    assert_eq!(groups[0]["columns"][0]["stage"]["stage"], "Borrador");
}

#[test]
fn test_move_commits_and_is_listed() {
    let dir = seeded_workspace();

    pipeline_board(&dir)
        .args(["move", "prospect", "p-001", "Contactado"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Etapa cambiada de \"Nuevo\" a \"Contactado\""));

    let rows = json_output(&dir, &["list", "prospect", "--filter", "p-001", "--json"]);
    assert_eq!(rows[0]["entity"]["stage"], "Contactado");

    let history = json_output(&dir, &["history", "prospect", "--json"]);
    assert_eq!(history[0]["entity_title"], "Distribuidora Altamira");
}

#[test]
fn test_guard_rejection_fails_without_changes() {
    let dir = seeded_workspace();

    pipeline_board(&dir)
        .args(["move", "sales-order", "so-002", "Entregada"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entrega(s) sin completar"));

    let rows = json_output(&dir, &["list", "sales-order", "--filter", "so-002", "--json"]);
    assert_eq!(rows[0]["entity"]["stage"], "En Tránsito");
}

#[test]
fn test_same_stage_move_is_a_no_op() {
    let dir = seeded_workspace();
    pipeline_board(&dir)
        .args(["move", "prospect", "p-001", "Nuevo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ya está"));
}
