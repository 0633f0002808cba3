//! CLI parsing tests for the xrefcache command
//!
//! Tests that verify CLI argument parsing works correctly.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the xrefcache binary, isolated from user config
#[allow(deprecated)]
fn xrefcache(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("xrefcache").expect("Failed to find xrefcache binary");
    cmd.env("HOME", home.path())
        .env_remove("XREFCACHE_CONFIG")
        .env_remove("XREFCACHE_API_URL")
        .env_remove("XREFCACHE_API_KEY")
        .current_dir(home.path());
    cmd
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_shows_all_commands() {
    let home = TempDir::new().unwrap();
    xrefcache(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("entity"))
        .stdout(predicate::str::contains("collection"))
        .stdout(predicate::str::contains("index"))
        .stdout(predicate::str::contains("xref"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    xrefcache(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("xrefcache"));
}

#[test]
fn test_global_options_in_help() {
    let home = TempDir::new().unwrap();
    xrefcache(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--api-url"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--quiet"));
}

// ============================================================================
// Command Argument Tests
// ============================================================================

#[test]
fn test_xref_help() {
    let home = TempDir::new().unwrap();
    xrefcache(&home)
        .args(["xref", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--pages"))
        .stdout(predicate::str::contains("--output"));
}

#[test]
fn test_xref_requires_both_collections() {
    let home = TempDir::new().unwrap();
    xrefcache(&home).args(["xref", "12"]).assert().failure();
}

#[test]
fn test_entity_requires_id() {
    let home = TempDir::new().unwrap();
    xrefcache(&home).arg("entity").assert().failure();
}

#[test]
fn test_invalid_output_format_rejected() {
    let home = TempDir::new().unwrap();
    xrefcache(&home)
        .args(["entity", "e1", "--output", "yaml"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_api_url_is_reported() {
    let home = TempDir::new().unwrap();
    xrefcache(&home)
        .args(["--api-url", "notaurl", "entity", "e1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("api.url"));
}

#[test]
fn test_missing_config_file_is_reported() {
    let home = TempDir::new().unwrap();
    xrefcache(&home)
        .args(["--config", "missing.toml", "entity", "e1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_init_and_path() {
    let home = TempDir::new().unwrap();

    xrefcache(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));

    xrefcache(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
    assert!(home.path().join(".xrefcache/config.toml").exists());

    xrefcache(&home)
        .args(["config", "path", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"local_exists\": true"));
}

#[test]
fn test_config_show_applies_overrides() {
    let home = TempDir::new().unwrap();
    xrefcache(&home)
        .args([
            "--api-url",
            "https://aleph.example.org",
            "config",
            "show",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://aleph.example.org"))
        .stdout(predicate::str::contains("page_limit = 50"));
}

#[test]
fn test_config_show_reads_explicit_file() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("custom.toml"),
        "[api]\nurl = \"https://custom.example.org\"\npage_limit = 5\n",
    )
    .unwrap();

    xrefcache(&home)
        .args(["--config", "custom.toml", "config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://custom.example.org"))
        .stdout(predicate::str::contains("\"page_limit\": 5"));
}

#[test]
fn test_broken_config_reported_once_and_path_still_works() {
    let home = TempDir::new().unwrap();
    std::fs::create_dir_all(home.path().join(".xrefcache")).unwrap();
    std::fs::write(home.path().join(".xrefcache/config.toml"), "[api\nurl = ").unwrap();

    xrefcache(&home)
        .args(["entity", "e1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration").count(1));

    xrefcache(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exists"));
}
