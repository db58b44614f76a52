//! Integration tests for the `panelctl` binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling, all without a live panel.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `panelctl` binary with env isolation.
///
/// Clears all `PANEL_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn panelctl() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("panelctl");
    cmd.env("HOME", "/tmp/panelctl-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/panelctl-test-nonexistent")
        .env_remove("PANEL_PROFILE")
        .env_remove("PANEL_URL")
        .env_remove("PANEL_SESSION")
        .env_remove("PANEL_OUTPUT")
        .env_remove("PANEL_INSECURE")
        .env_remove("PANEL_TIMEOUT")
        .env_remove("PANEL_DUCKDNS_TOKEN");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = panelctl().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    panelctl().arg("--help").assert().success().stdout(
        predicate::str::contains("proxy panel")
            .and(predicate::str::contains("overview"))
            .and(predicate::str::contains("layers"))
            .and(predicate::str::contains("service")),
    );
}

#[test]
fn test_version_flag() {
    panelctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("panelctl"));
}

#[test]
fn test_layers_switch_help_lists_switch_options() {
    panelctl()
        .args(["layers", "switch", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--domain")
                .and(predicate::str::contains("--email"))
                .and(predicate::str::contains("--no-wait"))
                .and(predicate::str::contains("--no-ack")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    panelctl()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    panelctl()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = panelctl().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_switch_requires_layer_argument() {
    panelctl()
        .args(["layers", "switch"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_overview_without_panel_configured() {
    let output = panelctl().arg("overview").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("No panel configured"),
        "Expected missing-config error:\n{text}"
    );
}

#[test]
fn test_url_without_session_is_auth_error() {
    let output = panelctl()
        .args(["--url", "https://203.0.113.7:8443", "layers", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("No session configured"));
}

#[test]
fn test_non_http_url_is_rejected() {
    let output = panelctl()
        .args(["--url", "ftp://203.0.113.7", "--session", "tok", "overview"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_profile() {
    let output = panelctl()
        .args(["--profile", "nope", "bandwidth"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("Profile 'nope' not found"));
}

// ── Config management ───────────────────────────────────────────────

#[test]
fn test_config_set_then_show_masks_session() {
    let dir = tempfile::tempdir().unwrap();
    let config_home = dir.path().to_str().unwrap();

    for (key, value) in [("url", "https://203.0.113.7:8443"), ("session", "secret-token")] {
        panelctl()
            .env("XDG_CONFIG_HOME", config_home)
            .args(["config", "set", key, value])
            .assert()
            .success();
    }

    panelctl()
        .env("XDG_CONFIG_HOME", config_home)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));

    panelctl()
        .env("XDG_CONFIG_HOME", config_home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://203.0.113.7:8443")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("secret-token").not()),
        );
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    panelctl()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "set", "password", "x"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_service_restart_needs_yes_without_terminal() {
    let output = panelctl()
        .args([
            "--url",
            "http://127.0.0.1:9",
            "--session",
            "tok",
            "service",
            "restart",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("requires confirmation"));
}
