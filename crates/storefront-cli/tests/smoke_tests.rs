//! Smoke tests for the storefront-e2e CLI
//!
//! These tests verify basic CLI functionality works correctly.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the storefront-e2e binary, isolated from the caller's env
fn storefront() -> Command {
    let mut cmd = Command::cargo_bin("storefront-e2e").expect("storefront-e2e binary should exist");
    for var in ["RUST_LOG", "LOG_LEVEL", "STOREFRONT_URL", "CHROMIUM_PATH", "STOREFRONT_HEADED"] {
        cmd.env_remove(var);
    }
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    storefront()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    storefront()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("shopping cart"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_shows_help() {
    storefront().assert().failure();
}

#[test]
fn test_run_subcommand_help() {
    storefront()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fake"))
        .stdout(predicate::str::contains("--no-sandbox"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_shows_defaults() {
    storefront()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "base_url: https://automation-interview.vercel.app/",
        ))
        .stdout(predicate::str::contains("log_level: INFO"));
}

#[test]
fn test_config_reads_file_and_env() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storefront.yaml");
    fs::write(&path, "base_url: http://file.test/\nwait:\n  timeout_ms: 1234\n").unwrap();

    storefront()
        .args(["config", "--config"])
        .arg(&path)
        .env("LOG_LEVEL", "debug")
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url: http://file.test/"))
        .stdout(predicate::str::contains("timeout_ms: 1234"))
        .stdout(predicate::str::contains("log_level: DEBUG"));
}

#[test]
fn test_config_missing_file_fails() {
    storefront()
        .args(["config", "--config", "/nonexistent/storefront.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_config_bad_env_fails() {
    storefront()
        .arg("config")
        .env("LOG_LEVEL", "chatty")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown log level"));
}

// ============================================================================
// Run Command Tests
// ============================================================================

#[test]
fn test_run_fake_passes() {
    storefront()
        .args(["run", "--fake", "--color", "never"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS shopping cart scenario passed"))
        .stdout(predicate::str::contains("$95.90"))
        .stderr(predicate::str::contains("open storefront: started"));
}

#[test]
fn test_run_fake_quiet() {
    storefront()
        .args(["-q", "run", "--fake"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("started").not());
}

#[test]
fn test_run_fake_bad_url_fails() {
    storefront()
        .args(["run", "--fake", "--color", "never", "--url", "ftp://store.test/"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"))
        .stderr(predicate::str::contains("Navigation to ftp://store.test/ failed"))
        .stderr(predicate::str::contains("ERROR"));
}
