use predicates::prelude::*;
use test_support::{cmd_bin, empty_env_file, init_fixture_repo};

fn analyze(extra: &[&str]) -> assert_cmd::assert::Assert {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  cmd_bin()
    .arg("--env-file")
    .arg(empty_env_file(td.path()))
    .args(["analyze", "--offline", "--dry-run", "-r"])
    .arg(repo.path())
    .args(extra)
    .env("GITINSPECTOR_PATH", "/nonexistent/gitinspector")
    .assert()
}

#[test]
fn days_and_dates_together_are_rejected() {
  analyze(&["--days", "7", "--start-date", "2025-08-01", "--end-date", "2025-08-31"])
    .failure()
    .stderr(predicate::str::contains("ambiguous window"));
}

#[test]
fn a_lone_start_date_is_rejected() {
  analyze(&["--start-date", "2025-08-01"])
    .failure()
    .stderr(predicate::str::contains("must be given together"));
}

#[test]
fn zero_days_is_rejected() {
  analyze(&["--days", "0"]).failure().stderr(predicate::str::contains("positive"));
}

#[test]
fn reversed_dates_are_rejected() {
  analyze(&["--start-date", "2025-08-31", "--end-date", "2025-08-01"])
    .failure()
    .stderr(predicate::str::contains("must be before"));
}

#[test]
fn malformed_dates_are_rejected_by_the_parser() {
  analyze(&["--start-date", "08/01/2025", "--end-date", "2025-08-31"]).failure();
}

#[test]
fn unknown_timezone_is_rejected() {
  analyze(&["--days", "7", "--tz", "Mars/Olympus"])
    .failure()
    .stderr(predicate::str::contains("unknown timezone"));
}

#[test]
fn day_window_counts_back_from_now_override() {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let out = cmd_bin()
    .arg("--env-file")
    .arg(empty_env_file(td.path()))
    .args(["analyze", "--offline", "--dry-run", "--payload-out", "-", "--tz", "utc", "-r"])
    .arg(repo.path())
    .args(["--days", "7", "--now-override", "2025-08-15T00:00:00Z"])
    .env("GITINSPECTOR_PATH", "/nonexistent/gitinspector")
    .output()
    .unwrap();
  assert!(out.status.success());

  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(v["time_window"]["start"], "2025-08-08T00:00:00Z");
  assert_eq!(v["time_window"]["duration_days"], 7);
  // 2025-08-12 (Jane) and 2025-08-14 (Bob)
  assert_eq!(v["summary"]["total_commits"], 2);
}
