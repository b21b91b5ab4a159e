//! Smoke tests for the `hearth` binary.
//!
//! Verifies the binary starts, responds to CLI flags, and drives a full
//! offline session over stdin without requiring a persistence server.

use std::io::Write;
use std::process::{Command, Stdio};

fn hearth() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hearth"))
}

/// Run the binary offline, feed it `commands` on stdin, return its output.
fn run_offline(commands: &str) -> std::process::Output {
    let mut child = hearth()
        .arg("--offline")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn hearth");
    child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(commands.as_bytes())
        .expect("failed to write commands");
    child.wait_with_output().expect("failed to wait for hearth")
}

// ── Help / basic CLI ──────────────────────────────────────────────────────────

#[test]
fn binary_responds_to_help() {
    let output = hearth().arg("--help").output().expect("failed to execute hearth");
    assert!(output.status.success(), "hearth --help should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hearth"), "help output should mention hearth");
    assert!(stdout.contains("--offline"), "help output should list --offline");
    assert!(stdout.contains("--base-url"), "help output should list --base-url");
}

#[test]
fn unknown_flag_exits_nonzero() {
    let output = hearth()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute hearth");
    assert!(!output.status.success(), "unknown flag should exit non-zero");
}

#[test]
fn missing_config_file_fails_cleanly() {
    let output = hearth()
        .args(["--offline", "--config", "/nonexistent/hearth.toml"])
        .output()
        .expect("failed to execute hearth");
    assert!(
        !output.status.success(),
        "hearth should fail when the config file does not exist"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("hearth.toml") || stderr.contains("config"),
        "error message should mention the config file: {stderr}"
    );
}

// ── Offline session over stdin ────────────────────────────────────────────────

#[test]
fn offline_quit_exits_cleanly() {
    let output = run_offline("quit\n");
    assert!(
        output.status.success(),
        "offline quit should exit 0\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("0 widgets mounted"),
        "fresh offline store starts empty: {stdout}"
    );
}

#[test]
fn offline_create_and_list() {
    let output = run_offline("create clock\ntypes\nlist\nquit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("created clock_"), "create should echo the new id: {stdout}");
    assert!(stdout.contains("clock"), "types should list clock: {stdout}");
    assert!(stdout.contains("mounted"), "list should show the mounted instance: {stdout}");
}

#[test]
fn offline_create_of_unknown_type_reports_error() {
    let output = run_offline("create mystery\nquit\n");
    assert!(output.status.success(), "a failed create must not kill the session");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("create failed"),
        "unknown type should report a create failure: {stderr}"
    );
}

#[test]
fn stdin_eof_shuts_down() {
    let output = run_offline("");
    assert!(
        output.status.success(),
        "EOF on stdin should exit 0\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}
