use std::path::Path;

use predicates::prelude::*;
use serde_json::Value;
use test_support::{cmd_bin, empty_env_file, init_fixture_repo};

const AUGUST: [&str; 4] = ["--start-date", "2025-08-01", "--end-date", "2025-08-31"];

fn analyze_payload(env_dir: &Path, repos: &[&Path], envs: &[(&str, &str)]) -> (bool, Value) {
  let mut cmd = cmd_bin();
  cmd.env("TZ", "UTC");
  cmd.arg("--env-file").arg(empty_env_file(env_dir)).arg("analyze");
  for repo in repos {
    cmd.arg("-r").arg(repo);
  }
  cmd.args(AUGUST).args(["--tz", "utc", "--offline", "--dry-run", "--payload-out", "-"]);
  for (k, v) in envs {
    cmd.env(k, v);
  }
  let out = cmd.output().unwrap();
  let payload = serde_json::from_slice(&out.stdout)
    .unwrap_or_else(|e| panic!("stdout is not a payload ({e}): {}", String::from_utf8_lossy(&out.stderr)));
  (out.status.success(), payload)
}

#[test]
fn offline_payload_reconciles_window_history() {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let (ok, v) = analyze_payload(td.path(), &[repo.path()], &[("GITINSPECTOR_PATH", "/nonexistent/gitinspector")]);
  assert!(ok);

  assert_eq!(v["summary"]["total_commits"], 4);
  assert_eq!(v["summary"]["total_authors"], 2);
  assert_eq!(v["time_window"]["start"], "2025-08-01T00:00:00Z");
  assert_eq!(v["time_window"]["duration_days"], 31);

  let jane = &v["authors"][0];
  assert_eq!(jane["identity"], "jane@example.com");
  assert_eq!(jane["display_name"], "Jane Doe");
  assert_eq!(jane["commits_in_window"], 3);
  assert_eq!(jane["files_touched_in_window"], 3);
  assert_eq!(jane["recent_commit_subjects"][0], "feat: add account model");
  assert!(jane["lifetime_commits"].is_null());

  let bob = &v["authors"][1];
  assert_eq!(bob["identity"], "bob@example.com");
  assert_eq!(bob["commits_in_window"], 1);

  let repo_entry = &v["repositories"][0];
  assert_eq!(repo_entry["lifetime_source"]["status"], "unavailable");
  assert_eq!(repo_entry["unique_authors"], 2);

  let timeline = repo_entry["recent_commits"].as_array().unwrap();
  assert_eq!(timeline.len(), 4);
  assert_eq!(timeline[0]["message"], "feat: add account model");
  assert_eq!(timeline[0]["date"], "2025-08-20T16:45:00Z");
  assert_eq!(timeline[3]["author"], "Jane Doe");
}

#[cfg(unix)]
#[test]
fn lifetime_statistics_attach_by_email_then_name() {
  use std::os::unix::fs::PermissionsExt;

  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let tool = td.path().join("fake-gitinspector");
  std::fs::write(
    &tool,
    r#"#!/bin/sh
cat <<'JSON'
{"gitinspector": {"repository": "fixture", "changes": {"authors": [
  {"name": "Jane Doe", "email": "JANE@example.com", "commits": 40, "insertions": 900, "deletions": 100},
  {"name": "Bob Builder", "commits": 2, "insertions": 3, "deletions": 0},
  {"name": "Ghost Writer", "email": "ghost@example.com", "commits": 7, "insertions": 70, "deletions": 7}
]}}}
JSON
"#,
  )
  .unwrap();
  std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

  let (ok, v) = analyze_payload(td.path(), &[repo.path()], &[("GITINSPECTOR_PATH", tool.to_str().unwrap())]);
  assert!(ok);

  let repo_entry = &v["repositories"][0];
  assert_eq!(repo_entry["lifetime_source"]["status"], "available");
  assert_eq!(repo_entry["authors"][0]["lifetime_commits"], 40);
  assert_eq!(repo_entry["authors"][1]["lifetime_commits"], 2);

  let unmatched = repo_entry["unmatched_lifetime_authors"].as_array().unwrap();
  assert_eq!(unmatched.len(), 1);
  assert_eq!(unmatched[0]["display_name"], "Ghost Writer");
  assert_eq!(unmatched[0]["reason"], "no_window_activity");
}

#[cfg(unix)]
#[test]
fn failing_lifetime_tool_only_degrades_lifetime_fields() {
  use std::os::unix::fs::PermissionsExt;

  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let tool = td.path().join("broken-gitinspector");
  std::fs::write(&tool, "#!/bin/sh\necho 'Segmentation fault' >&2\nexit 3\n").unwrap();
  std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

  let (ok, v) = analyze_payload(td.path(), &[repo.path()], &[("GITINSPECTOR_PATH", tool.to_str().unwrap())]);
  assert!(ok);
  assert_eq!(v["repositories"][0]["lifetime_source"]["status"], "failed");
  assert_eq!(v["summary"]["total_commits"], 4);
}

#[test]
fn invalid_repositories_are_reported_and_fail_the_run() {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let missing = td.path().join("gone");

  let (ok, v) = analyze_payload(
    td.path(),
    &[repo.path(), missing.as_path()],
    &[("GITINSPECTOR_PATH", "/nonexistent/gitinspector")],
  );
  assert!(!ok);
  assert_eq!(v["summary"]["total_repositories"], 1);
  assert_eq!(v["summary"]["failed_repositories"], 1);
  assert_eq!(v["failures"][0]["kind"], "not_found");
  assert_eq!(v["failures"][0]["path"], missing.to_str().unwrap());
}

#[test]
fn dry_run_prints_preview_and_saves_report() {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let saved = td.path().join("out/report.md");

  cmd_bin()
    .arg("--env-file")
    .arg(empty_env_file(td.path()))
    .args(["analyze", "-r"])
    .arg(repo.path())
    .args(AUGUST)
    .args(["--tz", "utc", "--offline", "--dry-run", "--save-report"])
    .arg(&saved)
    .env("GITINSPECTOR_PATH", "/nonexistent/gitinspector")
    .assert()
    .success()
    .stdout(predicate::str::contains("report preview").and(predicate::str::contains("# Git Activity Report")));

  let text = std::fs::read_to_string(&saved).unwrap();
  assert!(text.contains("1. **Jane Doe**"));
}

#[test]
fn missing_credentials_stop_before_collection() {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let payload = td.path().join("payload.json");

  cmd_bin()
    .arg("--env-file")
    .arg(empty_env_file(td.path()))
    .args(["analyze", "--dry-run", "-r"])
    .arg(repo.path())
    .args(AUGUST)
    .arg("--payload-out")
    .arg(&payload)
    .assert()
    .failure()
    .stderr(predicate::str::contains("OPENAI_API_KEY"));

  assert!(!payload.exists());

  cmd_bin()
    .arg("--env-file")
    .arg(empty_env_file(td.path()))
    .args(["analyze", "--offline", "-r"])
    .arg(repo.path())
    .args(AUGUST)
    .assert()
    .failure()
    .stderr(predicate::str::contains("SLACK_TOKEN"));
}

#[test]
fn env_file_supplies_settings_and_process_env_wins() {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let env_file = td.path().join("digest.env");
  std::fs::write(&env_file, "TIME_WINDOW_DAYS=0\n").unwrap();

  cmd_bin()
    .arg("--env-file")
    .arg(&env_file)
    .args(["analyze", "--offline", "--dry-run", "-r"])
    .arg(repo.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("TIME_WINDOW_DAYS"));

  cmd_bin()
    .arg("--env-file")
    .arg(&env_file)
    .args(["analyze", "--offline", "--dry-run", "-r"])
    .arg(repo.path())
    .env("TIME_WINDOW_DAYS", "30")
    .env("GITINSPECTOR_PATH", "/nonexistent/gitinspector")
    .assert()
    .success();
}
