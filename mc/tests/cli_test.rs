//! CLI tests for the migconfig binary
//!
//! Every run gets its own data, config and working directories so logs and config files
//! never leak between tests or into the user's home.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn testdata(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
        .display()
        .to_string()
}

fn migconfig(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("migconfig").expect("binary should build");
    cmd.current_dir(home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_transform_prints_configs_and_keeps_stderr_empty() {
    let home = TempDir::new().unwrap();
    let output = migconfig(&home)
        .args(["transform", &testdata("scenario_a.yaml")])
        .assert()
        .success()
        .stderr(predicate::str::is_empty())
        .get_output()
        .clone();

    let configs = stdout_json(&output);
    assert_eq!(configs[0]["sourceConfig"]["name"], "s1");
    assert_eq!(configs[0]["targetConfig"]["name"], "t1");
    assert!(configs[0].get("snapshotExtractAndLoadConfigs").is_none());

    let log = home.path().join("data").join("migconfig").join("logs").join("migconfig.log");
    assert!(log.exists(), "log file should be created under the data dir");
}

#[test]
fn test_transform_reads_stdin() {
    let home = TempDir::new().unwrap();
    let doc = std::fs::read_to_string(testdata("scenario_a.yaml")).unwrap();
    migconfig(&home)
        .arg("transform")
        .write_stdin(doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"s1\""));
}

#[test]
fn test_transform_resolves_localstack_literal_address() {
    let home = TempDir::new().unwrap();
    let output = migconfig(&home)
        .args(["transform", &testdata("full.yaml"), "--pretty"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty())
        .get_output()
        .clone();

    let configs = stdout_json(&output);
    let repo = &configs[0]["snapshotExtractAndLoadConfigs"][0]["snapshotConfig"]["repoConfig"];
    assert_eq!(repo["endpoint"], "http://127.0.0.1:4566");
    assert_eq!(repo["useLocalStack"], true);
    assert!(String::from_utf8_lossy(&output.stdout).contains("\n  "));
}

#[test]
fn test_validation_failure_text_output() {
    let home = TempDir::new().unwrap();
    migconfig(&home)
        .args(["transform", &testdata("invalid.yaml")])
        .assert()
        .code(4)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("validation failed"))
        .stderr(predicate::str::contains("at sourceClusters.s1.colour\n  Unrecognized key: \"colour\""))
        .stderr(predicate::str::contains("at targetClusters.t1.endpoint\n  Required"));
}

#[test]
fn test_validation_failure_json_output() {
    let home = TempDir::new().unwrap();
    let output = migconfig(&home)
        .args(["transform", &testdata("invalid.yaml"), "--error-format", "json"])
        .assert()
        .code(4)
        .stdout(predicate::str::is_empty())
        .get_output()
        .clone();

    let violations: Value = serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
    let violations = violations.as_array().unwrap();
    assert!(violations.len() >= 4);
    assert!(violations.iter().any(|v| {
        v["path"] == serde_json::json!(["migrationConfigs", 0, "toTarget"])
            && v["message"] == "Target cluster 't2' is not defined in targetClusters"
    }));
}

#[test]
fn test_exit_codes_by_failure_kind() {
    let home = TempDir::new().unwrap();
    migconfig(&home)
        .args(["transform", &testdata("malformed.yaml")])
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty());
    migconfig(&home)
        .args(["transform", &testdata("duplicates.yaml")])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("s1 => t1"));
    migconfig(&home)
        .args(["transform", &testdata("missing_repo.yaml")])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Snapshot repo 'archive' is not defined on source cluster 's1'"));
    migconfig(&home)
        .args(["transform", &testdata("no_such_file.yaml")])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_lock_schema_prints_json_schema() {
    let home = TempDir::new().unwrap();
    let output = migconfig(&home)
        .args(["lock-schema", &testdata("scenario_a.yaml")])
        .assert()
        .success()
        .stderr(predicate::str::is_empty())
        .get_output()
        .clone();

    let locked = stdout_json(&output);
    assert_eq!(locked["$schema"], "https://json-schema.org/draft/2020-12/schema");
    assert_eq!(
        locked["properties"]["targetClusters"]["properties"]["t1"]["properties"]["endpoint"]["const"],
        "https://b:9200"
    );
}

#[test]
fn test_schema_prints_general_schema() {
    let home = TempDir::new().unwrap();
    let output = migconfig(&home)
        .args(["schema", "--schema", "parameterized-output"])
        .assert()
        .success()
        .get_output()
        .clone();

    let schema = stdout_json(&output);
    assert_eq!(schema["type"], "array");
    assert_eq!(schema["items"]["additionalProperties"], false);
}

#[test]
fn test_latches_prints_counts() {
    let home = TempDir::new().unwrap();
    let output = migconfig(&home)
        .args(["latches", &testdata("full.yaml")])
        .assert()
        .success()
        .get_output()
        .clone();

    assert_eq!(stdout_json(&output), serde_json::json!({ "search": 3 }));
}

#[test]
fn test_config_file_enables_pretty_output() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".migconfig.yml"), "output:\n  pretty: true\n").unwrap();
    migconfig(&home)
        .args(["transform", &testdata("scenario_a.yaml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  {"));
}

#[test]
fn test_bad_explicit_config_is_runtime_error() {
    let home = TempDir::new().unwrap();
    migconfig(&home)
        .args(["--config", "/nonexistent/migconfig.yml", "schema"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}
