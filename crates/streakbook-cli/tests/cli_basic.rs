//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory on the
//! local backend.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_streakbook"))
        .args(args)
        .env("STREAKBOOK_HOME", home)
        .env("STREAKBOOK_PASSWORD", "hunter22")
        .env_remove("STREAKBOOK_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is JSON")
}

fn signed_up() -> TempDir {
    let home = TempDir::new().unwrap();
    let (code, stdout, stderr) = run_cli(
        home.path(),
        &["auth", "signup", "ada@example.com", "--name", "Ada"],
    );
    assert_eq!(code, 0, "signup failed: {stderr}");
    assert!(stdout.contains("ada@example.com"));
    home
}

#[test]
fn test_help() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("exercise"));
    assert!(stdout.contains("med"));
}

#[test]
fn test_commands_require_sign_in() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["exercise", "list"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not signed in"));
}

#[test]
fn test_categories_work_signed_out() {
    let home = TempDir::new().unwrap();
    let value = run_json(home.path(), &["exercise", "categories", "--json"]);
    let categories = value["categories"].as_array().unwrap();
    assert!(categories.iter().any(|c| c == "Two Pointers"));
    assert!(value["tags"].as_array().unwrap().iter().any(|t| t == "BFS"));
}

#[test]
fn test_auth_status_and_logout() {
    let home = signed_up();
    let status = run_json(home.path(), &["auth", "status", "--json"]);
    assert_eq!(status["signed_in"], true);
    assert_eq!(status["user"]["name"], "Ada");
    assert_eq!(status["backend"], "sqlite");

    let (code, stdout, _) = run_cli(home.path(), &["auth", "logout"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Signed out"));
    assert!(!home.path().join("session.json").exists());

    let status = run_json(home.path(), &["auth", "status", "--json"]);
    assert_eq!(status["signed_in"], false);

    let (code, _, _) = run_cli(home.path(), &["auth", "login", "ada@example.com"]);
    assert_eq!(code, 0);
}

#[test]
fn test_wrong_password_is_rejected() {
    let home = signed_up();
    let output = Command::new(env!("CARGO_BIN_EXE_streakbook"))
        .args(["auth", "login", "ada@example.com", "--password", "wrong-one"])
        .env("STREAKBOOK_HOME", home.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: "));
}

#[test]
fn test_exercise_flow_updates_streak() {
    let home = signed_up();
    let added = run_json(
        home.path(),
        &[
            "exercise",
            "add",
            "1",
            "--title",
            "Two Sum",
            "--link",
            "https://leetcode.com/problems/two-sum/",
            "--category",
            "array & hashing",
            "--tags",
            "Hash Map,Sorting",
            "--json",
        ],
    );
    assert_eq!(added["problem"]["leetcode_number"], 1);
    assert_eq!(added["exercise"]["primary_category"], "Array & Hashing");
    assert_eq!(added["streak"]["change"], "started");
    assert_eq!(added["streak"]["state"]["streak_count"], 1);

    // same problem twice
    let (code, _, stderr) = run_cli(
        home.path(),
        &["exercise", "add", "1", "--title", "Two Sum", "--link", "x"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("already in your solved list"));

    // second problem on the same day leaves the streak alone
    let (code, stdout, _) = run_cli(
        home.path(),
        &[
            "exercise",
            "add",
            "20",
            "--title",
            "Valid Parentheses",
            "--link",
            "y",
            "--category",
            "Stack",
        ],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("streak stays at 1"));

    let page = run_json(home.path(), &["exercise", "list", "--json"]);
    assert_eq!(page["total_count"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);

    let stats = run_json(home.path(), &["stats", "--json"]);
    assert_eq!(stats["total_exercises"], 2);
    assert_eq!(stats["current_streak"], 1);
}

#[test]
fn test_exercise_edit_and_delete() {
    let home = signed_up();
    let added = run_json(
        home.path(),
        &["exercise", "add", "42", "--title", "Trapping Rain", "--link", "z", "--json"],
    );
    let id = added["exercise"]["id"].as_i64().unwrap().to_string();

    let (code, _, stderr) = run_cli(
        home.path(),
        &["exercise", "edit", &id, "--title", "Trapping Rain Water", "--notes", "two pointers"],
    );
    assert_eq!(code, 0, "{stderr}");

    let shown = run_json(home.path(), &["exercise", "show", &id, "--json"]);
    assert_eq!(shown["title"], "Trapping Rain Water");
    assert_eq!(shown["notes"], "two pointers");
    assert_eq!(shown["leetcode_number"], 42);

    let (code, _, _) = run_cli(home.path(), &["exercise", "delete", &id]);
    assert_eq!(code, 0);
    let (code, _, stderr) = run_cli(home.path(), &["exercise", "show", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Not found"), "{stderr}");
}

#[test]
fn test_invalid_exercise_input() {
    let home = signed_up();
    let (code, _, stderr) = run_cli(
        home.path(),
        &["exercise", "add", "7", "--title", "T", "--link", "l", "--category", "Cooking"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("Cooking"));

    let (code, _, _) = run_cli(
        home.path(),
        &["exercise", "add", "7", "--title", "T", "--link", "l", "--date", "2999-01-01"],
    );
    assert_eq!(code, 1);
}

#[test]
fn test_medication_flow() {
    let home = signed_up();
    let (code, stdout, _) = run_cli(home.path(), &["med", "random"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("empty"));

    let added = run_json(
        home.path(),
        &["med", "add", "Metformin", "--description", "biguanide", "--json"],
    );
    let id = added["id"].as_i64().unwrap().to_string();
    assert_eq!(added["description"], "biguanide");

    let (code, _, _) = run_cli(home.path(), &["med", "edit", &id, "--name", "Metformin XR"]);
    assert_eq!(code, 0);

    let random = run_json(home.path(), &["med", "random", "--json"]);
    assert_eq!(random["name"], "Metformin XR");
    assert_eq!(random["description"], "biguanide");

    let page = run_json(home.path(), &["med", "list", "--json"]);
    assert_eq!(page["total_count"], 1);

    let (code, _, _) = run_cli(home.path(), &["med", "delete", &id]);
    assert_eq!(code, 0);
    let page = run_json(home.path(), &["med", "list", "--json"]);
    assert_eq!(page["total_count"], 0);
}

#[test]
fn test_profile_rename() {
    let home = signed_up();
    let (code, _, _) = run_cli(home.path(), &["profile", "rename", "Ada L."]);
    assert_eq!(code, 0);
    let profile = run_json(home.path(), &["profile", "show", "--json"]);
    assert_eq!(profile["name"], "Ada L.");
    assert_eq!(profile["streak_count"], 0);
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "store.exercises_per_page"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "10");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "store.exercises_per_page", "5"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "store.exercises_per_page"]);
    assert_eq!(stdout.trim(), "5");

    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));

    let (code, stdout, _) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("streakbook"));
}
