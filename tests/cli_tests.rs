use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn journalist_cmd() -> Command {
    let mut cmd = Command::cargo_bin("journalist").unwrap();
    cmd.env_remove("JOURNALIST_DB_PATH")
        .env_remove("JOURNALIST_CONFIG")
        .env_remove("QUAILY_API_KEY")
        .env_remove("OPENAI_API_KEY");
    cmd
}

fn write_config(dir: &TempDir) -> PathBuf {
    let db_path = dir.path().join("journalist.db");
    let out_dir = dir.path().join("out");
    let yaml = format!(
        r#"
storage:
  path: {db}
newsletters:
  output_dir: {out}
  min_items: 2
  channels:
    - name: v2ex_daily
      source: v2ex
      nodes: [apple]
"#,
        db = db_path.display(),
        out = out_dir.display()
    );

    let path = dir.path().join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

fn config_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_help_lists_commands() {
    journalist_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("debug-parse"));
}

#[test]
fn test_generate_help_shows_flags() {
    journalist_cmd()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--respect-skips"))
        .stdout(predicate::str::contains("--publish"));
}

#[test]
fn test_debug_parse_prints_keys_and_body_size() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("daily-20240501.md");
    std::fs::write(&file, "---\ntitle: Digest\nslug: daily-20240501\n---\nHello\n").unwrap();

    journalist_cmd()
        .arg("debug-parse")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Frontmatter keys: title, slug"))
        .stdout(predicate::str::contains("Body length: 6 bytes"));
}

#[test]
fn test_debug_parse_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    journalist_cmd()
        .arg("debug-parse")
        .arg(dir.path().join("missing.md"))
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();

    journalist_cmd()
        .args(["--config", &config_arg(&dir.path().join("nope.yaml")), "store", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_store_stats_on_fresh_database() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    journalist_cmd()
        .args(["--config", &config_arg(&config), "store", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Items:            0"))
        .stdout(predicate::str::contains("Skip markers:     0"));
}

#[test]
fn test_store_purge_rejects_bad_retention() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    journalist_cmd()
        .args(["--config", &config_arg(&config), "store", "purge", "--retention", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid duration"));
}

#[test]
fn test_generate_unknown_channel_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    journalist_cmd()
        .args(["--config", &config_arg(&config), "generate", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Channel not found: nope"));
}

#[test]
fn test_generate_with_empty_store_reports_not_enough_items() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    journalist_cmd()
        .args(["--config", &config_arg(&config), "generate", "v2ex_daily"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not enough items: 0 available, 2 required"));

    assert!(!dir.path().join("out").join("v2ex_daily").exists());
}

#[test]
fn test_config_from_environment_variable() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    journalist_cmd()
        .env("JOURNALIST_CONFIG", &config)
        .args(["store", "purge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 rows."));
}
