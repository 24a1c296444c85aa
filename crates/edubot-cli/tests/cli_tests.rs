//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A command isolated from the user's config and API keys.
fn edubot(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("edubot").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("EDUBOT_OPENAI_KEY");
    cmd
}

fn mock_config(dir: &Path, response: &str) {
    std::fs::write(
        dir.join("edubot.toml"),
        format!(
            "default_provider = \"mock\"\n\n[providers.mock]\ntype = \"mock\"\nresponse = \"{response}\"\n"
        ),
    )
    .unwrap();
}

fn record(dir: &Path, level: &str, questions: &str, minutes: &str) {
    edubot(dir)
        .args(["progress", "record", "--student-id", "s1", "--board", "CBSE"])
        .args(["--class-level", "5", "--subject", "Math", "--topic", "Fractions"])
        .args(["--understanding-level", level])
        .args(["--questions-asked", questions, "--time-spent", minutes])
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress updated for s1"));
}

#[test]
fn validate_passing_text() {
    let dir = TempDir::new().unwrap();
    edubot(dir.path())
        .args(["validate", "--text", "This is fine."])
        .assert()
        .success()
        .stdout(predicate::str::contains("content_length"))
        .stdout(predicate::str::contains("Response valid."));
}

#[test]
fn validate_short_text_fails() {
    let dir = TempDir::new().unwrap();
    edubot(dir.path())
        .args(["validate", "--text", "Hi"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("too short"))
        .stdout(predicate::str::contains("complete sentence"))
        .stderr(predicate::str::contains("2 validation rule(s) failed"));
}

#[test]
fn validate_denylist_from_flag() {
    let dir = TempDir::new().unwrap();
    edubot(dir.path())
        .args(["validate", "--text", "This is a Silly answer.", "--denylist", "silly,rude"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("inappropriate content"));
}

#[test]
fn validate_denylist_from_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("edubot.toml"),
        "[validation]\ndenylist = [\"bad_word1\"]\n",
    )
    .unwrap();
    edubot(dir.path())
        .args(["validate", "--text", "Contains BAD_WORD1 here."])
        .assert()
        .failure()
        .stdout(predicate::str::contains("inappropriate content"));
}

#[test]
fn validate_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("answer.txt");
    std::fs::write(&path, "Leaves are green because of chlorophyll.").unwrap();
    edubot(dir.path())
        .arg("validate")
        .arg("--file")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Response valid."));
}

#[test]
fn validate_requires_input() {
    let dir = TempDir::new().unwrap();
    edubot(dir.path()).arg("validate").assert().failure();
}

#[test]
fn progress_accumulates_across_runs() {
    let dir = TempDir::new().unwrap();
    record(dir.path(), "3", "2", "10");
    record(dir.path(), "4", "1", "5");

    let output = edubot(dir.path())
        .args(["progress", "show", "--student-id", "s1", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let record: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let math = &record["subjects"]["Math"];
    assert_eq!(math["total_time_spent"], 15);
    assert_eq!(math["total_questions_asked"], 3);
    assert_eq!(math["topics"]["Fractions"]["understanding_level"], 4);
    assert_eq!(math["topics"]["Fractions"]["time_spent"], 5);
    assert_eq!(record["board"], "CBSE");
}

#[test]
fn progress_table_output() {
    let dir = TempDir::new().unwrap();
    record(dir.path(), "3", "2", "10");

    edubot(dir.path())
        .args(["progress", "show", "--student-id", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Student: s1 (board CBSE, class 5)"))
        .stdout(predicate::str::contains("Fractions"))
        .stdout(predicate::str::contains("(total)"));
}

#[test]
fn progress_unknown_student() {
    let dir = TempDir::new().unwrap();
    edubot(dir.path())
        .args(["progress", "show", "--student-id", "unknown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("student not found: unknown"));
}

#[test]
fn progress_rejects_out_of_range_level() {
    let dir = TempDir::new().unwrap();
    edubot(dir.path())
        .args(["progress", "record", "--student-id", "s1", "--board", "CBSE"])
        .args(["--class-level", "5", "--subject", "Math", "--topic", "Fractions"])
        .args(["--understanding-level", "6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("understanding_level"));
    assert!(!dir.path().join("edubot-progress.json").exists());
}

#[test]
fn chat_with_mock_provider() {
    let dir = TempDir::new().unwrap();
    mock_config(dir.path(), "Rain is water falling from clouds.");

    edubot(dir.path())
        .args(["chat", "--message", "What is rain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rain is water falling from clouds."));
}

#[test]
fn chat_apologizes_for_invalid_answer() {
    let dir = TempDir::new().unwrap();
    mock_config(dir.path(), "Hi");

    edubot(dir.path())
        .args(["chat", "--message", "Say hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("I apologize"))
        .stderr(predicate::str::contains("too short"));
}

#[test]
fn chat_json_output() {
    let dir = TempDir::new().unwrap();
    mock_config(dir.path(), "Four.");

    let output = edubot(dir.path())
        .args(["chat", "--message", "2 + 2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let reply: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(reply["response"], "Four.");
    assert_eq!(reply["validation"]["is_valid"], true);
}

#[test]
fn chat_without_provider_fails() {
    let dir = TempDir::new().unwrap();
    edubot(dir.path())
        .args(["chat", "--message", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'openai' is not configured"));
}

#[test]
fn explain_with_mock_provider() {
    let dir = TempDir::new().unwrap();
    mock_config(dir.path(), "A noun names a person, place or thing.");

    edubot(dir.path())
        .args(["explain", "--topic", "Grammar", "--question", "What is a noun?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("names a person"));
}

#[test]
fn list_models_with_mock() {
    let dir = TempDir::new().unwrap();
    mock_config(dir.path(), "unused");

    edubot(dir.path())
        .arg("list-models")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: mock (default)"))
        .stdout(predicate::str::contains("mock-model"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    edubot(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created edubot.toml"));

    assert!(dir.path().join("edubot.toml").exists());

    // The generated config must load.
    edubot(dir.path())
        .args(["validate", "--text", "This is fine."])
        .assert()
        .success();
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    edubot(dir.path()).arg("init").assert().success();

    edubot(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    edubot(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Educational chat backend"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    edubot(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edubot"));
}
