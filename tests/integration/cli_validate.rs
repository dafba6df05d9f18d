use predicates::prelude::*;
use test_support::{cmd_bin, empty_env_file, init_fixture_repo};

#[test]
fn valid_repository_reports_commit_count() {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();

  cmd_bin()
    .arg("--env-file")
    .arg(empty_env_file(td.path()))
    .args(["validate-repos", "-r"])
    .arg(repo.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("OK").and(predicate::str::contains("(5 commits)")));
}

#[test]
fn invalid_paths_fail_with_a_line_each() {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let plain = td.path().join("plain");
  std::fs::create_dir_all(&plain).unwrap();

  cmd_bin()
    .arg("--env-file")
    .arg(empty_env_file(td.path()))
    .args(["validate-repos", "-r"])
    .arg(repo.path())
    .arg("-r")
    .arg(&plain)
    .arg("-r")
    .arg(td.path().join("missing"))
    .assert()
    .failure()
    .stdout(
      predicate::str::contains("FAIL")
        .and(predicate::str::contains("not a Git repository"))
        .and(predicate::str::contains("does not exist")),
    );
}

#[test]
fn missing_explicit_env_file_is_a_configuration_error() {
  let repo = init_fixture_repo();
  cmd_bin()
    .args(["--env-file", "/definitely/missing/.env", "validate-repos", "-r"])
    .arg(repo.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("missing/.env"));
}
