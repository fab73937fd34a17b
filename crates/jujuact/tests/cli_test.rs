//! Integration tests for the `jujuact` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without a controller; the action commands run against an in-process
//! WebSocket controller on a loopback port.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use futures_util::{SinkExt, StreamExt};
use predicates::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// ── Helpers ─────────────────────────────────────────────────────────

const SECRET: &str = "its-a-secret";

/// Build a [`Command`] for the `jujuact` binary with env isolation.
///
/// Clears all `JUJUACT_*` env vars and points the config file at `config`
/// so tests never touch the user's real configuration.
fn jujuact_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("jujuact");
    cmd.env("HOME", "/tmp/jujuact-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/jujuact-cli-test-nonexistent")
        .env("JUJUACT_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("JUJU_API_ADDRESSES")
        .env_remove("JUJUACT_PROFILE")
        .env_remove("JUJUACT_ENDPOINT")
        .env_remove("JUJUACT_USER")
        .env_remove("JUJUACT_PASSWORD")
        .env_remove("JUJUACT_OUTPUT")
        .env_remove("JUJUACT_INSECURE")
        .env_remove("JUJUACT_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// A scratch directory and the (not yet existing) config file inside it.
fn scratch() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Fake controller ─────────────────────────────────────────────────

/// Serve a controller on a loopback port from a background thread and
/// return its `ws://` URL.
fn spawn_controller() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    while let Some(Ok(msg)) = ws.next().await {
                        let Message::Text(text) = msg else { continue };
                        let request: Value = serde_json::from_str(text.as_str()).unwrap();
                        let reply = respond(&request);
                        if ws.send(Message::text(reply.to_string())).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
    });

    format!("ws://{addr}/")
}

fn ok(id: u64, response: Value) -> Value {
    json!({ "RequestId": id, "Response": response })
}

fn fail(id: u64, message: &str, code: &str) -> Value {
    json!({ "RequestId": id, "Error": message, "ErrorCode": code, "Response": {} })
}

fn status() -> Value {
    json!({
        "EnvironmentName": "local",
        "Services": {
            "redmine": {
                "Charm": "cs:trusty/redmine-2",
                "Exposed": true,
                "Units": {
                    "redmine/0": {
                        "AgentState": "started",
                        "Machine": "1",
                        "PublicAddress": "10.0.3.10",
                        "Subordinates": {
                            "nrpe/0": { "AgentState": "started" }
                        }
                    }
                }
            },
            "nrpe": {
                "Charm": "cs:trusty/nrpe-4",
                "Units": null,
                "SubordinateTo": ["redmine"]
            }
        },
        "Actions": [
            {
                "action": { "tag": "action-1", "receiver": "unit-redmine-0", "name": "backup" },
                "status": "completed",
                "output": { "path": "/var/backups/redmine.tgz" }
            },
            {
                "action": { "tag": "action-2", "receiver": "unit-redmine-0", "name": "backup" },
                "status": "failed",
                "message": "disk full"
            }
        ]
    })
}

fn charm_actions() -> Value {
    json!({
        "results": [{
            "servicetag": "service-redmine",
            "actions": {
                "ActionSpecs": {
                    "backup": {
                        "Description": "Archive the redmine files",
                        "Params": {
                            "title": "backup",
                            "description": "Archive the redmine files",
                            "properties": {
                                "days": { "type": "integer", "default": 7 },
                                "dest": { "type": "string" }
                            }
                        }
                    }
                }
            }
        }]
    })
}

/// Canned replies keyed on `Type.Request`.
fn respond(request: &Value) -> Value {
    let id = request["RequestId"].as_u64().unwrap();
    let facade = request["Type"].as_str().unwrap_or_default();
    let method = request["Request"].as_str().unwrap_or_default();
    let params = &request["Params"];

    match (facade, method) {
        ("Admin", "Login") if params["Password"] == SECRET => ok(id, json!({})),
        ("Admin", "Login") => fail(id, "invalid entity name or password", "unauthorized access"),
        ("Client", "FullStatus") => ok(id, status()),
        ("Client", "GetAnnotations") => ok(id, json!({ "Annotations": { "owner": "ops" } })),
        ("Action", "ServicesCharmActions") => ok(id, charm_actions()),
        ("Action", "Enqueue") => {
            let results: Vec<Value> = params["Actions"]
                .as_array()
                .cloned()
                .unwrap_or_default()
                .iter()
                .map(|a| {
                    json!({
                        "action": {
                            "tag": "action-42",
                            "receiver": a["Receiver"],
                            "name": a["Name"],
                            "parameters": a["Parameters"]
                        },
                        "status": "pending"
                    })
                })
                .collect();
            ok(id, json!({ "results": results }))
        }
        ("Action", "ListAll") => {
            let actions: Vec<Value> = params["Entities"]
                .as_array()
                .cloned()
                .unwrap_or_default()
                .iter()
                .map(|e| {
                    json!({
                        "receiver": e["Tag"],
                        "actions": [{
                            "action": { "tag": "action-1", "receiver": e["Tag"], "name": "backup" },
                            "status": "completed"
                        }]
                    })
                })
                .collect();
            ok(id, json!({ "actions": actions }))
        }
        ("Action", "Cancel") => {
            let tag = params["Entities"][0]["Tag"].clone();
            ok(id, json!({ "results": [{ "action": { "tag": tag }, "status": "cancelled" }] }))
        }
        _ => fail(id, "not implemented", "not implemented"),
    }
}

/// `jujuact` aimed at the fake controller with the right password.
fn against(endpoint: &str, config: &Path) -> assert_cmd::Command {
    let mut cmd = jujuact_cmd(config);
    cmd.args(["--endpoint", endpoint, "--password", SECRET]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, config) = scratch();
    let output = jujuact_cmd(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config).arg("--help").assert().success().stdout(
        predicate::str::contains("Juju actions")
            .and(predicate::str::contains("run"))
            .and(predicate::str::contains("specs"))
            .and(predicate::str::contains("cancel")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("jujuact"));
}

#[test]
fn test_completions_zsh() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Argument errors ─────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let (_dir, config) = scratch();
    let output = jujuact_cmd(&config).arg("foobar").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("foobar"));
}

#[test]
fn test_run_requires_receivers() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config).args(["run", "backup"]).assert().code(2);
}

#[test]
fn test_run_param_needs_key_value() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["run", "backup", "redmine/0", "-P", "novalue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("key=value"));
}

// ── Connection resolution ───────────────────────────────────────────

#[test]
fn test_status_without_controller_is_no_config() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No controller configured"));
}

#[test]
fn test_malformed_endpoint_is_usage_error() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["-e", "not a url", "--password", "x", "status"])
        .assert()
        .code(2);
}

#[test]
fn test_unreachable_controller_is_connection_error() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["-e", "ws://127.0.0.1:1/", "--password", "x", "status"])
        .assert()
        .code(7);
}

#[test]
fn test_unknown_profile() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["--profile", "prod", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("prod"));
}

#[test]
fn test_unparseable_config_file_is_reported() {
    let (_dir, config) = scratch();
    std::fs::write(
        &config,
        "[profiles.default]\nendpoint = \"ws://127.0.0.1:1/\"\ntimeout = \"not-a-number\"\n",
    )
    .unwrap();

    let output = jujuact_cmd(&config).arg("status").output().unwrap();
    let text = combined_output(&output);
    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("config loading failed"), "{text}");
    assert!(!text.contains("No controller configured"), "{text}");
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_without_file() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_set_then_show() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["config", "set", "addresses", "10.0.3.1:17070"])
        .assert()
        .success();
    jujuact_cmd(&config)
        .args(["config", "set", "user", "ops"])
        .assert()
        .success();

    jujuact_cmd(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.default]")
                .and(predicate::str::contains("10.0.3.1:17070"))
                .and(predicate::str::contains("user = \"ops\"")),
        );
}

#[test]
fn test_config_set_rejects_unknown_key_and_password() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["config", "set", "colour", "red"])
        .assert()
        .code(2);
    jujuact_cmd(&config)
        .args(["config", "set", "password", "hunter2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("set-password"));
}

#[test]
fn test_config_use_and_profiles() {
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["--profile", "lab", "config", "set", "timeout", "5"])
        .assert()
        .success();
    jujuact_cmd(&config)
        .args(["--profile", "prod", "config", "set", "timeout", "5"])
        .assert()
        .success();

    jujuact_cmd(&config).args(["config", "use", "prod"]).assert().success();
    jujuact_cmd(&config)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prod *").and(predicate::str::contains("lab")));

    jujuact_cmd(&config)
        .args(["config", "use", "staging"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("staging"));
}

// ── Against a controller ────────────────────────────────────────────

#[test]
fn test_wrong_password_is_auth_error() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    jujuact_cmd(&config)
        .args(["-e", &endpoint, "--password", "nope", "status"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn test_status_lists_services() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    against(&endpoint, &config)
        .args(["-o", "plain", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("redmine").and(predicate::str::contains("nrpe")));
}

#[test]
fn test_profile_from_config_file() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    std::fs::write(
        &config,
        format!(
            "default_profile = \"lab\"\n\n[profiles.lab]\nendpoint = \"{endpoint}\"\npassword = \"{SECRET}\"\n"
        ),
    )
    .unwrap();

    jujuact_cmd(&config)
        .args(["-o", "plain", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("redmine"));
}

#[test]
fn test_units_include_subordinates() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    against(&endpoint, &config)
        .args(["-o", "plain", "units"])
        .assert()
        .success()
        .stdout(predicate::str::contains("redmine/0").and(predicate::str::contains("nrpe/0")));

    against(&endpoint, &config)
        .args(["units", "wordpress"])
        .assert()
        .code(4);
}

#[test]
fn test_specs_show_declared_actions() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    against(&endpoint, &config)
        .args(["-o", "plain", "specs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("redmine backup"));
}

#[test]
fn test_run_sends_string_params() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    let output = against(&endpoint, &config)
        .args(["-o", "json", "run", "backup", "redmine/0", "-P", "days=3"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let record: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["tag"], "action-42");
    assert_eq!(record["status"], "pending");
    assert_eq!(record["data"]["action"]["receiver"], "unit-redmine-0");
    assert_eq!(record["data"]["action"]["parameters"]["days"], "3");
}

#[test]
fn test_run_with_service_coerces_params() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    let output = against(&endpoint, &config)
        .args([
            "-o", "json", "run", "backup", "unit-redmine-0", "-s", "redmine", "-P", "days=3",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let record: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["data"]["action"]["parameters"]["days"], 3);
}

#[test]
fn test_run_with_service_rejects_bad_param_and_unknown_action() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    against(&endpoint, &config)
        .args(["run", "backup", "redmine/0", "-s", "redmine", "-P", "days=soon"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("days"));

    against(&endpoint, &config)
        .args(["run", "restore", "redmine/0", "-s", "redmine"])
        .assert()
        .code(4);
}

#[test]
fn test_show_found_and_missing() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    against(&endpoint, &config)
        .args(["show", "action-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed").and(predicate::str::contains("backup")));

    against(&endpoint, &config)
        .args(["show", "action-99"])
        .assert()
        .code(4);
}

#[test]
fn test_wait_reports_failed_action() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    against(&endpoint, &config)
        .args(["wait", "2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("disk full"));

    against(&endpoint, &config)
        .args(["-o", "plain", "wait", "action-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("action-1"));
}

#[test]
fn test_list_actions_for_service() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    against(&endpoint, &config)
        .args(["list", "--service", "redmine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unit-redmine-0").and(predicate::str::contains("action-1")));
}

#[test]
fn test_cancel_needs_confirmation() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    against(&endpoint, &config)
        .args(["cancel", "action-42"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));

    against(&endpoint, &config)
        .args(["-y", "-o", "plain", "cancel", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"));
}

#[test]
fn test_annotations() {
    let endpoint = spawn_controller();
    let (_dir, config) = scratch();
    against(&endpoint, &config)
        .args(["-o", "plain", "annotations", "redmine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("owner=ops"));
}
