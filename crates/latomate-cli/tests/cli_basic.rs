//! Basic CLI E2E tests.
//!
//! Each test drives the built binary against its own temporary data
//! directory, so tests never touch the user's store or each other.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_latomate"))
        .args(args)
        .env("LATOMATE_DATA_DIR", dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?} printed non-JSON ({e}): {stdout}"))
}

/// Fresh data directory with desktop notifications off.
fn data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "notifications.desktop", "false"]);
    assert_eq!(code, 0, "config set failed: {stderr}");
    dir
}

#[test]
fn test_config_list_and_get() {
    let dir = data_dir();
    let config = run_json(dir.path(), &["config", "list"]);
    assert_eq!(config["watch"]["tick_interval_ms"], 1000);
    assert_eq!(config["notifications"]["desktop"], false);

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "watch.reset_confirm_window_ms"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2000");

    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "watch.bogus"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_idle_status() {
    let dir = data_dir();
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["type"], "state_snapshot");
    assert_eq!(status["state"], "idle");
    assert_eq!(status["session_type"], "work");
    assert_eq!(status["display"], "25:00");
    assert_eq!(status["badge"], "");
}

#[test]
fn test_start_pause_resume_reset() {
    let dir = data_dir();
    let started = run_json(
        dir.path(),
        &["timer", "start", "--minutes", "10", "--tag", "writing"],
    );
    assert_eq!(started["type"], "session_started");
    assert_eq!(started["duration_secs"], 600);
    assert_eq!(started["tags"][0], "writing");

    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    assert_eq!(run_json(dir.path(), &["timer", "pause"])["type"], "session_paused");
    assert_eq!(run_json(dir.path(), &["timer", "status"])["state"], "paused");
    assert_eq!(run_json(dir.path(), &["timer", "resume"])["type"], "session_resumed");
    assert_eq!(run_json(dir.path(), &["timer", "reset"])["type"], "session_interrupted");

    let sessions = run_json(dir.path(), &["sessions", "list"]);
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["interrupted"], true);
    assert_eq!(sessions[0]["completed"], false);
    assert_eq!(sessions[0]["tags"][0], "writing");
}

#[test]
fn test_tick_completes_expired_session() {
    let dir = data_dir();
    run_json(dir.path(), &["timer", "start", "--seconds", "1"]);
    std::thread::sleep(std::time::Duration::from_millis(1_200));

    let completed = run_json(dir.path(), &["timer", "tick"]);
    assert_eq!(completed["type"], "session_completed");
    assert_eq!(completed["next_session_type"], "shortBreak");
    assert_eq!(completed["completed_pomodoros"], 1);

    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["state"], "idle");
    assert_eq!(status["session_type"], "shortBreak");
    assert_eq!(status["display"], "05:00");

    let count = run_json(dir.path(), &["sessions", "count"]);
    assert_eq!(count["count"], 1);
    let overview = run_json(dir.path(), &["stats", "overview"]);
    assert_eq!(overview["today"]["completed_pomodoros"], 1);
    assert_eq!(overview["current_streak"], 1);
}

#[test]
fn test_double_reset_clears_count() {
    let dir = data_dir();
    let (_, _, code) = run_cli(
        dir.path(),
        &["config", "set", "watch.reset_confirm_window_ms", "60000"],
    );
    assert_eq!(code, 0);

    assert_eq!(run_json(dir.path(), &["timer", "reset"])["type"], "reset_armed");
    assert_eq!(run_json(dir.path(), &["timer", "reset"])["type"], "reinitialized");
    assert_eq!(run_json(dir.path(), &["timer", "status"])["completed_pomodoros"], 0);
}

#[test]
fn test_mode_commands() {
    let dir = data_dir();
    let mode = run_json(dir.path(), &["mode", "set", "intensive"]);
    assert_eq!(mode["mode"], "intensive");
    assert_eq!(mode["durations"]["work"], 45);

    let custom = run_json(dir.path(), &["mode", "custom", "50", "10", "30", "3"]);
    assert_eq!(custom["longBreakInterval"], 3);
    let all = run_json(dir.path(), &["mode", "durations"]);
    assert_eq!(all["custom"]["work"], 50);
    assert_eq!(all["52-17"]["work"], 52);

    let (_, stderr, code) = run_cli(dir.path(), &["mode", "custom", "0", "5", "15", "4"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_sessions_show_missing() {
    let dir = data_dir();
    let (_, stderr, code) = run_cli(dir.path(), &["sessions", "show", "session_0_missing00"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("session not found"));
    assert_eq!(run_json(dir.path(), &["sessions", "clear"])["deleted"], 0);
}

#[test]
fn test_notifications_toggle() {
    let dir = data_dir();
    assert_eq!(run_json(dir.path(), &["notifications"])["enabled"], true);
    assert_eq!(run_json(dir.path(), &["notifications", "off"])["enabled"], false);
    assert_eq!(run_json(dir.path(), &["notifications"])["enabled"], false);
}

#[test]
fn test_reset_after_deadline_completes_first() {
    let dir = data_dir();
    let started = run_json(dir.path(), &["timer", "start", "--seconds", "1"]);
    let id = started["session_id"].as_str().unwrap().to_string();
    std::thread::sleep(std::time::Duration::from_millis(1_200));

    let (stdout, stderr, code) = run_cli(dir.path(), &["timer", "reset"]);
    assert_eq!(code, 0, "reset failed: {stderr}");
    assert!(stdout.contains("\"session_completed\""));
    assert!(stdout.contains("\"reset_armed\""));

    let record = run_json(dir.path(), &["sessions", "show", &id]);
    assert_eq!(record["completed"], true);
    assert_eq!(record["interrupted"], false);
    assert_eq!(run_json(dir.path(), &["timer", "status"])["completed_pomodoros"], 1);
}

#[test]
fn test_start_rejects_oversized_length() {
    let dir = data_dir();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start", "--seconds", "86401"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("duration"));
    assert_eq!(run_json(dir.path(), &["timer", "status"])["state"], "idle");
}

#[test]
fn test_stats_activity_days_range() {
    let dir = data_dir();
    let activity = run_json(dir.path(), &["stats", "activity", "--days", "366"]);
    assert_eq!(activity.as_array().unwrap().len(), 366);

    for days in ["0", "367", "4000000000"] {
        let (_, _, code) = run_cli(dir.path(), &["stats", "activity", "--days", days]);
        assert_ne!(code, 0, "--days {days} was accepted");
    }
}
