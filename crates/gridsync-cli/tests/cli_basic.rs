//! Basic CLI tests.
//!
//! Network-free commands only: help output, completions, config path.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "gridsync-cli", "--"])
        .args(args)
        .env("GRIDSYNC_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help_lists_subcommands() {
    let (stdout, _, code) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("sync"));
    assert!(stdout.contains("schedule"));
    assert!(stdout.contains("auth"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_sync_help_documents_dry_run() {
    let (stdout, _, code) = run_cli(&["sync", "--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("--include-past"));
}

#[test]
fn test_config_path_prints_a_toml_path() {
    let (stdout, _, code) = run_cli(&["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
}

#[test]
fn test_completions_generate() {
    let (stdout, _, code) = run_cli(&["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("gridsync"));
}
