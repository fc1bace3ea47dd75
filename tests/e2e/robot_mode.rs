//! Robot-mode end-to-end tests.

use chrono::TimeDelta;
use predicates::prelude::*;

use crate::common::init_test_logging;
use crate::common::sandbox::{MISSING_PROGRAM, Sandbox, parse_json};

#[test]
fn robot_quick_start_outputs_json() {
    init_test_logging();
    let sandbox = Sandbox::new();
    let assert = sandbox.command().arg("--robot").assert().success();

    let json = parse_json(&assert.get_output().stdout);
    assert_eq!(json["tool"], "wcm");
    assert!(json.get("lifecycle").is_some());
    assert_eq!(json["exit_codes"]["utility_reported_errors"], 2);
}

#[test]
fn robot_version_outputs_json() {
    let sandbox = Sandbox::new();
    let assert = sandbox
        .command()
        .args(["version", "--format=json"])
        .assert()
        .success();

    let json = parse_json(&assert.get_output().stdout);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json.get("git_sha").is_some());
}

#[test]
fn robot_detach_with_empty_state_is_nothing_to_detach() {
    let sandbox = Sandbox::new();
    let assert = sandbox
        .command()
        .args(["--robot", "detach"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());

    let json = parse_json(&assert.get_output().stderr);
    assert_eq!(json["error"], true);
    assert_eq!(json["message"], "Nothing to detach");
    assert_eq!(json["recoverable"], true);
    assert!(json["suggestion"].is_string());
    assert!(sandbox.read_journal().is_empty(), "no command may run");
}

#[test]
fn robot_detach_last_binding_reports_utility_failure() {
    let sandbox = Sandbox::new();
    sandbox.write_state(&[("0403:6001:A1", Some("1-2"), TimeDelta::minutes(5))]);

    let assert = sandbox
        .command()
        .args(["--robot", "detach"])
        .assert()
        .code(2);

    let json = parse_json(&assert.get_output().stdout);
    assert_eq!(json["ok"], false);
    assert_eq!(json["outcome"]["action"], "detach");
    assert_eq!(json["outcome"]["busid"], "1-2");
    assert_eq!(json["failures"].as_array().map(Vec::len), Some(2));
    assert!(json["outcome"].get("fell_back").is_none());

    // The record is reconciled even though the utility could not be started
    let state = sandbox.read_state();
    assert_eq!(state["0403:6001:A1"]["last_busid"], serde_json::Value::Null);
    assert_eq!(state["0403:6001:A1"]["last_action"], "detached");

    let journal = sandbox.read_journal();
    assert!(journal.contains(&format!("CMD: {MISSING_PROGRAM} detach --busid 1-2")));
    assert!(journal.contains(&format!("CMD: {MISSING_PROGRAM} unbind --busid 1-2")));
    assert!(journal.contains("RUN ERROR: "));
}

#[test]
fn robot_detach_of_missing_port_marks_fallback() {
    let sandbox = Sandbox::new();
    sandbox.write_state(&[("0403:6001:A1", Some("1-2"), TimeDelta::minutes(5))]);

    let assert = sandbox
        .command()
        .args(["--robot", "detach", "WCM-TEST-NO-SUCH-PORT"])
        .assert()
        .code(2);

    let json = parse_json(&assert.get_output().stdout);
    assert_eq!(json["outcome"]["port"], "WCM-TEST-NO-SUCH-PORT");
    assert_eq!(json["outcome"]["fell_back"], true);
    assert_eq!(json["outcome"]["identity_key"], "0403:6001:A1");
}

#[test]
fn robot_state_prunes_stale_records_at_startup() {
    let sandbox = Sandbox::new();
    sandbox.write_state(&[
        ("0403:6001:A1", Some("1-2"), TimeDelta::hours(1)),
        ("10C4:EA60:NOSN", None, TimeDelta::days(10)),
    ]);

    let assert = sandbox
        .command()
        .args(["--robot", "state"])
        .assert()
        .success();

    let json = parse_json(&assert.get_output().stdout);
    assert_eq!(json["summary"]["total"], 1);
    assert_eq!(json["summary"]["bound"], 1);
    assert_eq!(json["records"][0]["key"], "0403:6001:A1");

    let state = sandbox.read_state();
    assert!(state.get("10C4:EA60:NOSN").is_none());
}

#[test]
fn robot_prune_with_days() {
    let sandbox = Sandbox::new();
    sandbox.write_state(&[
        ("0403:6001:A1", Some("1-2"), TimeDelta::hours(1)),
        ("0403:6001:B2", None, TimeDelta::days(4)),
    ]);

    let assert = sandbox
        .command()
        .args(["--robot", "prune", "--days", "3"])
        .assert()
        .success();

    let json = parse_json(&assert.get_output().stdout);
    assert_eq!(json["retention_days"], 3);
    assert_eq!(json["records"], serde_json::json!(["0403:6001:B2"]));
    assert_eq!(json["journal_lines"], 0);
    assert!(sandbox.read_state().get("0403:6001:A1").is_some());
}

#[test]
fn robot_attach_unknown_port_fails() {
    let sandbox = Sandbox::new();
    let assert = sandbox
        .command()
        .args(["--robot", "attach", "WCM-TEST-NO-SUCH-PORT"])
        .assert()
        .code(1);

    let json = parse_json(&assert.get_output().stderr);
    assert_eq!(json["error"], true);
    assert!(sandbox.read_journal().is_empty());
}

#[test]
fn robot_config_shows_sandbox_paths() {
    let sandbox = Sandbox::new();
    let assert = sandbox
        .command()
        .args(["--robot", "config"])
        .assert()
        .success();

    let json = parse_json(&assert.get_output().stdout);
    assert_eq!(json["config"]["usbipd"]["program"], MISSING_PROGRAM);
    assert_eq!(
        json["state_path"],
        sandbox.state_path().display().to_string()
    );
}

#[test]
fn robot_state_file_flag_overrides_config() {
    let sandbox = Sandbox::new();
    let other = sandbox.path().join("other_state.json");
    let assert = sandbox
        .command()
        .args(["--robot", "config", "--state-file"])
        .arg(&other)
        .assert()
        .success();

    let json = parse_json(&assert.get_output().stdout);
    assert_eq!(json["state_path"], other.display().to_string());
}

#[test]
fn robot_log_tails_journal() {
    let sandbox = Sandbox::new();
    sandbox.write_state(&[("0403:6001:A1", Some("1-2"), TimeDelta::minutes(5))]);
    sandbox.command().arg("detach").assert().code(2);

    let assert = sandbox
        .command()
        .args(["--robot", "log", "--lines", "2"])
        .assert()
        .success();

    let json = parse_json(&assert.get_output().stdout);
    let lines = json["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].as_str().unwrap().contains("CMD: "));
}

#[test]
fn init_refuses_to_overwrite() {
    let sandbox = Sandbox::new();
    let fresh = sandbox.path().join("fresh/config.toml");

    sandbox
        .command()
        .args(["--robot", "init", "--config"])
        .arg(&fresh)
        .assert()
        .success();
    assert!(fresh.exists());

    sandbox
        .command()
        .args(["--robot", "init", "--config"])
        .arg(&fresh)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    sandbox
        .command()
        .args(["--robot", "init", "--force", "--config"])
        .arg(&fresh)
        .assert()
        .success();
}

#[test]
fn unparsable_config_is_reported() {
    let sandbox = Sandbox::new();
    std::fs::write(sandbox.config_path(), "[state\n").unwrap();

    sandbox
        .command()
        .args(["--robot", "state"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration parse error"));
}
