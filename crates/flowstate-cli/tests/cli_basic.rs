//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary config
//! directory so nothing touches the user's real settings.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(dir, args, "")
}

fn run_cli_with_input(dir: &TempDir, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_flowstate"))
        .args(args)
        .env("FLOWSTATE_CONFIG_DIR", dir.path())
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_config_get_default() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "get", "timer.focus_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1500");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["config", "set", "timer.break_duration", "600"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&dir, &["config", "get", "timer.break_duration"]);
    assert_eq!(stdout.trim(), "600");
}

#[test]
fn test_config_set_clears_numeric_optional() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["config", "set", "music.shuffle_seed", "42"]);
    assert_eq!(code, 0);
    let (stdout, stderr, code) = run_cli(&dir, &["config", "set", "music.shuffle_seed", "null"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(stdout.trim(), "music.shuffle_seed = null");
}

#[test]
fn test_config_set_out_of_range_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "set", "timer.focus_duration", "30"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("timer.focus_duration"));
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "get", "timer.nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown config key"));
}

#[test]
fn test_config_list_is_json() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "list"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["ui"]["theme"], "midnight");
}

#[test]
fn test_tracks_toggle_round_trip() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["tracks", "toggle", "focus/rainfall.mp3"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("disabled"));

    let (stdout, _, _) = run_cli(&dir, &["tracks", "list"]);
    assert!(stdout.contains("[ ] focus/rainfall.mp3"));
    assert!(stdout.contains("[x] focus/deep-space.mp3"));

    let (stdout, _, _) = run_cli(&dir, &["tracks", "toggle", "focus/rainfall.mp3"]);
    assert!(stdout.contains("enabled"));
}

#[test]
fn test_tracks_toggle_unknown_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["tracks", "toggle", "focus/missing.mp3"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown track"));
}

#[test]
fn test_theme_next_cycles() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, _) = run_cli(&dir, &["theme", "show"]);
    assert!(stdout.contains("Midnight"));
    let (stdout, _, code) = run_cli(&dir, &["theme", "next"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Sunrise"));
    let (stdout, _, _) = run_cli(&dir, &["config", "get", "ui.theme"]);
    assert_eq!(stdout.trim(), "sunrise");
}

#[test]
fn test_run_json_session() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli_with_input(
        &dir,
        &["run", "--json", "--silent", "--category", "4"],
        "s\nm\ns\nq\n",
    );
    assert_eq!(code, 0, "stderr: {stderr}");

    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let types: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();

    assert_eq!(types.first(), Some(&"StateSnapshot"));
    assert!(types.contains(&"TimerStarted"));
    assert!(types.contains(&"MusicToggled"));
    assert!(types.contains(&"TimerPaused"));
    assert_eq!(events[0]["category_id"], 4);
    assert_eq!(events[0]["mode"], "focus");
}

#[test]
fn test_run_finish_needs_running_focus() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli_with_input(&dir, &["run", "--json", "--silent"], "f\nq\n");
    assert_eq!(code, 0);
    assert!(stderr.contains("finished early"));
}

#[test]
fn test_run_finish_prompt_reports_other_input_as_no() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) =
        run_cli_with_input(&dir, &["run", "--json", "--silent"], "s\nf\ns\nq\n");
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("Took `s` as no"));
    assert!(!stdout.contains("TimerPaused"));
    assert!(!stdout.contains("SessionDiscarded"));
}
