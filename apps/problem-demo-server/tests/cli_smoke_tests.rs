#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the problem-demo-server binary.

use std::io::Write;
use std::process::{Command, Stdio};

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_problem-demo-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute problem-demo-server")
}

#[test]
fn test_cli_help_command() {
    let output = run(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
}

#[test]
fn test_print_config_applies_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "problems:\n  docs_path: /errors/{{code}}").unwrap();

    let path = file.path().to_string_lossy().to_string();
    let output = run(&["--config", &path, "--port", "9123", "--print-config"]);
    assert!(output.status.success());

    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["server"]["port"], 9123);
    assert_eq!(config["problems"]["docs_path"], "/errors/{code}");
}

#[test]
fn test_missing_config_file_fails() {
    let output = run(&["--config", "/definitely/not/here.yaml", "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file does not exist"));
}

#[test]
fn test_check_command_succeeds_with_defaults() {
    let output = run(&["check"]);
    assert!(output.status.success());
}
