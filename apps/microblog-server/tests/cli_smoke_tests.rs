//! CLI smoke tests for the microblog-server binary
//!
//! These tests verify that the CLI commands work correctly, including
//! configuration validation, help output, migrations and reindexing.

use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Helper to run the microblog-server binary with given arguments
fn run_microblog_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_microblog-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute microblog-server")
}

/// Write a config whose home_dir lives inside `dir`.
fn write_config(dir: &Path, body: &str) -> String {
    let home = dir.join("home").to_string_lossy().replace('\\', "/");
    let content = format!(
        r#"
server:
  home_dir: "{home}"

logging:
  default:
    console_level: "off"
    file: "logs/microblog.log"
    file_level: info
{body}"#
    );
    let path = dir.join("config.yaml");
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_string_lossy().to_string()
}

#[test]
fn test_cli_help_command() {
    let output = run_microblog_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("microblog-server"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("migrate"), "Should contain 'migrate' subcommand");
    assert!(stdout.contains("reindex"), "Should contain 'reindex' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_microblog_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("microblog-server"));
    assert!(stdout.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_microblog_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should report the unknown command: {stderr}");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_microblog_server(&["-c", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "Should mention missing file: {stderr}");
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_microblog_server(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
}

#[test]
fn test_cli_check_accepts_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        temp_dir.path(),
        r#"
database:
  url: "sqlite://database/microblog.db"

modules:
  microblog:
    posts_per_page: 10
    search:
      backend: memory
"#,
    );

    let output = run_microblog_server(&["--config", &config, "check"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "STDOUT: {stdout}\nSTDERR: {stderr}");
    assert!(stdout.contains("Configuration check passed"));
}

#[test]
fn test_cli_check_rejects_unknown_module_keys() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        temp_dir.path(),
        r#"
modules:
  microblog:
    posts_per_pgae: 10
"#,
    );

    let output = run_microblog_server(&["--config", &config, "check"]);
    assert!(!output.status.success(), "Typos in module config must fail");
}

#[test]
fn test_cli_check_rejects_elasticsearch_without_url() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        temp_dir.path(),
        r#"
modules:
  microblog:
    search:
      backend: elasticsearch
"#,
    );

    let output = run_microblog_server(&["--config", &config, "check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("search.url"), "{stderr}");
}

#[test]
fn test_cli_migrate_creates_sqlite_file_under_home() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        temp_dir.path(),
        r#"
database:
  url: "sqlite://database/microblog.db"
"#,
    );

    let output = run_microblog_server(&["--config", &config, "migrate"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "migrate failed: {stderr}");
    assert!(temp_dir
        .path()
        .join("home/database/microblog.db")
        .exists());

    // Re-running is a no-op.
    let again = run_microblog_server(&["--config", &config, "migrate"]);
    assert!(again.status.success());
}

#[test]
fn test_cli_reindex_with_mock_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        temp_dir.path(),
        r#"
database:
  url: "postgresql://localhost/nonexistent"

modules:
  microblog:
    search:
      backend: memory
"#,
    );

    let output = run_microblog_server(&["--config", &config, "--mock", "reindex"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "STDOUT: {stdout}\nSTDERR: {stderr}");
    assert!(stdout.contains(r#""users":0"#), "{stdout}");
    assert!(stdout.contains(r#""posts":0"#), "{stdout}");
}

#[test]
fn test_cli_print_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        temp_dir.path(),
        r#"
modules:
  microblog:
    secret_key: "from-file"
"#,
    );

    let output = run_microblog_server(&["--config", &config, "--print-config"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("from-file"));
}

#[test]
fn test_cli_subcommand_help() {
    for sub in ["check", "migrate", "reindex"] {
        let output = run_microblog_server(&[sub, "--help"]);
        assert!(output.status.success(), "{sub} --help should succeed");
    }
}
