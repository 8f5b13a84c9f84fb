//! Integration tests for the finblog CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command isolated from the user's configuration and API key
fn finblog(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("finblog").unwrap();
    cmd.current_dir(temp.path())
        .env("FINBLOG_HOME", temp.path().join("home"))
        .env_remove("GEMINI_API_KEY")
        .env_remove("FINBLOG_BOOKS_DIR")
        .env_remove("FINBLOG_OUTPUT_DIR")
        .env_remove("FINBLOG_CACHE_DIR")
        .env_remove("FINBLOG_RECENCY_WINDOW")
        .env("RUST_LOG", "warn");
    cmd
}

fn seed_ledger(temp: &TempDir) {
    let home = temp.path().join("home");
    fs::create_dir_all(&home).unwrap();
    fs::write(
        home.join("ledger.json"),
        r#"{
  "version": 1,
  "records": [
    {"date": "2026-01-15", "topic": "Finnish Greetings", "slug": "finnish-greetings", "created_at": "2026-01-14T08:00:00Z"},
    {"date": "2026-01-16", "topic": "Sauna Culture", "slug": "sauna-culture", "created_at": "2026-01-15T08:00:00Z"}
  ]
}"#,
    )
    .unwrap();
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("finblog").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("extract-books"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("topics"))
        .stdout(predicate::str::contains("vocab-card"));
}

#[test]
fn test_generate_help() {
    let mut cmd = Command::cargo_bin("finblog").unwrap();
    cmd.args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--date"))
        .stdout(predicate::str::contains("--days"))
        .stdout(predicate::str::contains("--topic"))
        .stdout(predicate::str::contains("--image-prompt"));
}

#[test]
fn test_generate_without_api_key_is_config_error() {
    let temp = TempDir::new().unwrap();
    finblog(&temp)
        .arg("generate")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ConfigError"))
        .stderr(predicate::str::contains("GEMINI_API_KEY"));

    assert!(!temp.path().join("home/ledger.json").exists());
}

#[test]
fn test_generate_invalid_date() {
    let temp = TempDir::new().unwrap();
    finblog(&temp)
        .args(["generate", "--date", "15.1.2026"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("expected YYYY-MM-DD"));
}

#[test]
fn test_vocab_card_without_api_key() {
    let temp = TempDir::new().unwrap();
    finblog(&temp)
        .args(["vocab-card", "--word", "kissa", "--translation", "cat"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ConfigError"));
}

#[test]
fn test_topics_list_empty() {
    let temp = TempDir::new().unwrap();
    finblog(&temp)
        .args(["topics", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No topics recorded yet"));
}

#[test]
fn test_topics_list_and_next() {
    let temp = TempDir::new().unwrap();
    seed_ledger(&temp);

    finblog(&temp)
        .args(["topics", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-01-15"))
        .stdout(predicate::str::contains("Sauna Culture"))
        .stdout(predicate::str::contains("finnish-greetings"));

    finblog(&temp)
        .arg("topics")
        .assert()
        .success()
        .stdout(predicate::str::contains("Next date:  2026-01-17"))
        .stdout(predicate::str::contains("Next topic: Numbers and Counting"));
}

#[test]
fn test_malformed_ledger_fails() {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("home");
    fs::create_dir_all(&home).unwrap();
    fs::write(home.join("ledger.json"), "{ not json").unwrap();

    finblog(&temp)
        .args(["topics", "--list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("PersistenceError"));
}

#[test]
fn test_extract_books_empty_dir() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("home/books")).unwrap();

    finblog(&temp)
        .arg("extract-books")
        .assert()
        .success()
        .stdout(predicate::str::contains("No PDFs found"));
}

#[test]
fn test_config_masks_api_key() {
    let temp = TempDir::new().unwrap();
    finblog(&temp)
        .env("GEMINI_API_KEY", "AIzaSecretValue1234")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("****1234"))
        .stdout(predicate::str::contains("AIzaSecret").not());
}
