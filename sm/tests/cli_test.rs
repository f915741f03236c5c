//! CLI tests for the sm binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PLOTS_SCENARIO: &str = r#"
name: plots
session:
  session-id: abc123
steps:
  - action: open
    name: plots
    params: { zoom: 2 }
  - action: dispatch-event
    event-type: plots_changed
    data: { id: 1 }
  - action: dispatch-command
    id: zoomIn
  - action: register
    name: plots
  - action: flush
    name: plots
"#;

/// sm with its log file and config lookup confined to `dir`
fn sm(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sm").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_DATA_HOME", dir.join("data"))
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .env("NO_COLOR", "1");
    cmd
}

fn write_scenario(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("scenario.yml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_run_text_report() {
    let dir = TempDir::new().unwrap();
    let scenario = write_scenario(dir.path(), PLOTS_SCENARIO);

    sm(dir.path())
        .arg("run")
        .arg(&scenario)
        .assert()
        .success()
        .stdout(predicate::str::contains("Scenario: plots"))
        .stdout(predicate::str::contains("startup params"))
        .stdout(predicate::str::contains("event plots_changed"))
        .stdout(predicate::str::contains("Commands dropped:     1"));
}

#[test]
fn test_run_json_report() {
    let dir = TempDir::new().unwrap();
    let scenario = write_scenario(dir.path(), PLOTS_SCENARIO);

    let output = sm(dir.path())
        .args(["run", "--format", "json"])
        .arg(&scenario)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["scenario"], "plots");
    assert_eq!(report["metrics"]["events_buffered"], 1);
    let inbox = report["satellites"][0]["inbox"].as_array().unwrap();
    assert_eq!(inbox[0]["op"], "set-session-snapshot");
    assert_eq!(inbox[1]["op"], "set-startup-params");
    assert_eq!(inbox[2]["op"], "dispatch-event");
    assert_eq!(inbox.len(), 3);
}

#[test]
fn test_check_valid_scenario() {
    let dir = TempDir::new().unwrap();
    let scenario = write_scenario(dir.path(), PLOTS_SCENARIO);

    sm(dir.path())
        .arg("check")
        .arg(&scenario)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid (5 steps)"));
}

#[test]
fn test_check_rejects_register_before_open() {
    let dir = TempDir::new().unwrap();
    let scenario = write_scenario(dir.path(), "name: bad\nsteps:\n  - action: register\n    name: plots\n");

    sm(dir.path())
        .arg("check")
        .arg(&scenario)
        .assert()
        .failure()
        .stderr(predicate::str::contains("never opened"));
}

#[test]
fn test_config_uses_local_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".satellite-manager.yml"),
        "platform:\n  kind: native-shell\nmanager:\n  open-timeout-secs: 30\n",
    )
    .unwrap();

    sm(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: native-shell"))
        .stdout(predicate::str::contains("open-timeout-secs: 30"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();

    sm(dir.path())
        .args(["--config", "nope.yml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
