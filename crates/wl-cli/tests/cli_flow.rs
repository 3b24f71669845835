//! End-to-end tests for the `wl` binary.
//!
//! Each test writes a log (and optionally a schedule or config) into a temp
//! directory, runs the binary with `HOME` pointed there, and checks stdout.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn wl_binary() -> String {
    env!("CARGO_BIN_EXE_wl").to_string()
}

const LOG: &str = r#"{
    "today": 2,
    "days": {
        "1": [["start", "dev", "09:00"], ["stop", "17:00"], ["checkout-all"]],
        "2": [["start", "dev", "09:00"], ["switch", "review", "11:00"], ["stop", "12:00"]]
    }
}"#;

fn run_wl(home: &Path, args: &[&str]) -> Output {
    Command::new(wl_binary())
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run wl")
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "wl should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_summary_of_log_today() {
    let temp = TempDir::new().unwrap();
    let log = write(temp.path(), "log.json", LOG);

    let out = stdout(&run_wl(temp.path(), &["summary", "--log", &log]));
    assert_eq!(
        out,
        "Pending tasks:\n\
         dev - 2h 0m\n\
         review - 1h 0m\n\
         \n\
         Checked out: 0m\n\
         Pending time: 3h 0m\n\
         Total time: 3h 0m\n"
    );
}

#[test]
fn test_summary_json_for_explicit_day() {
    let temp = TempDir::new().unwrap();
    let log = write(temp.path(), "log.json", LOG);

    let out = stdout(&run_wl(
        temp.path(),
        &["summary", "--log", &log, "--day", "1", "--json"],
    ));
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["day"], 1);
    assert_eq!(json["ledger"]["checked_out"]["dev"], 480);
    assert_eq!(json["ledger"]["total_time"], 480);
    assert_eq!(json["warnings"], serde_json::json!([]));
}

#[test]
fn test_stats_with_goal_and_schedule() {
    let temp = TempDir::new().unwrap();
    let log = write(temp.path(), "log.json", LOG);
    let schedule = write(
        temp.path(),
        "schedule.json",
        r#"{"first_weekday": 0, "days": [["8h", ""], ["4h", "half day"], ["8h", ""]]}"#,
    );

    let out = stdout(&run_wl(
        temp.path(),
        &[
            "stats",
            "--log",
            &log,
            "--goal",
            "20h",
            "--remaining-days",
            "2",
            "--schedule",
            &schedule,
        ],
    ));

    assert!(out.contains("Total time for month: 11h 0m (11.00h)"));
    assert!(out.contains("At the 2 day start: 12h 0m remaining for this month"));
    assert!(out.contains("Average work time for 2 days: 6h 0m (3h 0m left)"));
    assert!(out.contains("Day 1 (Mon): 8h 0m -> 8h 0m +(0m)"));
    assert!(out.contains("> Day 2 (Tue): 4h 0m -> 3h 0m -(1h 0m) (note: half day)"));
    assert!(!out.contains("Leaving now"));
}

#[test]
fn test_stats_reads_goals_from_config() {
    let temp = TempDir::new().unwrap();
    let log = write(temp.path(), "log.json", LOG);
    let config = write(
        temp.path(),
        "wl.toml",
        &format!(
            "log_path = {log:?}\ngoals = [\"20h\"]\nremaining_days = [2]\nremaining_days_next = [1]\n"
        ),
    );

    let out = stdout(&run_wl(temp.path(), &["stats", "--config", &config, "--json"]));
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["today"], 2);
    assert_eq!(json["month_total"], 660);
    assert_eq!(json["projections"][0]["remaining"][0], 720);
    assert_eq!(json["projections"][1]["basis"]["kind"], "leaving_now");
    assert_eq!(json["projections"][1]["remaining"][0], 540);
    assert_eq!(
        json["projections"][1]["paces"][0]["goals"][0]["required_per_day"],
        540
    );
}

#[test]
fn test_replay_failure_is_reported() {
    let temp = TempDir::new().unwrap();
    let log = write(
        temp.path(),
        "log.json",
        r#"{"today": 1, "days": {"1": [["start", "dev", "09:00"], ["start", "call", "10:00"]]}}"#,
    );

    let output = run_wl(temp.path(), &["stats", "--log", &log]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("day 1 could not be replayed"), "{stderr}");
    assert!(
        stderr.contains("dev already running (since 09:00), can't start call at 10:00"),
        "{stderr}"
    );
}

#[test]
fn test_missing_log_file_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.json");

    let output = run_wl(temp.path(), &["summary", "--log", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read log file"));
}
