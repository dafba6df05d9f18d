//! test-support: shared helpers for git-activity-digest integration tests.
//!
//! ```rust,ignore
//! use test_support::{cmd_bin, init_fixture_repo};
//!
//! let repo = init_fixture_repo();
//! cmd_bin().args(["validate-repos", "-r"]).arg(repo.path()).assert().success();
//! ```

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

use std::env;
use std::path::Path;
use std::process::Command;

pub const BIN: &str = "git-activity-digest";

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
pub fn init_tracing() {
  static INIT: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env()
      .or_else(|_| EnvFilter::try_new("warn"))
      .unwrap();
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
  });
  Lazy::force(&INIT);
}

/// The binary under test, isolated from credentials and settings in the caller's environment.
///
/// Settings keys are cleared and `--env-file` should point at an empty file
/// (see [`empty_env_file`]) so a stray `.env` in the working directory is never read.
pub fn cmd_bin() -> assert_cmd::Command {
  init_tracing();
  let mut cmd = assert_cmd::Command::cargo_bin(BIN).expect("binary target not found");
  for key in SETTINGS_KEYS {
    cmd.env_remove(key);
  }
  cmd.env("RUST_LOG", "warn");
  cmd
}

pub const SETTINGS_KEYS: &[&str] = &[
  "OPENAI_API_KEY",
  "LLM_MODEL",
  "LLM_API_URL",
  "SLACK_TOKEN",
  "SLACK_WEBHOOK_URL",
  "SLACK_CHANNEL",
  "TIME_WINDOW_DAYS",
  "GITINSPECTOR_PATH",
  "GITINSPECTOR_SCOPE_TO_WINDOW",
  "SOURCE_TIMEOUT_SECS",
];

/// An empty env file inside `dir`, for `--env-file`.
pub fn empty_env_file(dir: &Path) -> std::path::PathBuf {
  let path = dir.join("empty.env");
  std::fs::write(&path, "").unwrap();
  path
}

/// Set multiple environment variables for the duration of the returned guard.
pub fn with_env(vars: &[(&str, &str)]) -> EnvGuard {
  EnvGuard::set_many(vars)
}

/// Guard for temporarily setting environment variables.
pub struct EnvGuard {
  prev: Vec<(String, Option<String>)>,
}

impl EnvGuard {
  pub fn set_many(kv: &[(&str, &str)]) -> Self {
    let mut prev = Vec::with_capacity(kv.len());
    for (k, v) in kv {
      prev.push((k.to_string(), env::var(k).ok()));
      env::set_var(k, v);
    }
    Self { prev }
  }
}

impl Drop for EnvGuard {
  fn drop(&mut self) {
    for (k, old) in self.prev.drain(..) {
      match old {
        Some(v) => env::set_var(&k, v),
        None => env::remove_var(&k),
      }
    }
  }
}

pub fn run(repo: &Path, args: &[&str]) {
  let status = Command::new("git").args(args).current_dir(repo).status().unwrap();
  assert!(status.success(), "git {:?} failed", args);
}

/// Commit everything in the working tree as `author` at `date` (RFC 3339).
pub fn commit_as(repo: &Path, name: &str, email: &str, date: &str, message: &str) {
  run(repo, &["add", "-A"]);
  let status = Command::new("git")
    .args(["commit", "-q", "--allow-empty", "-m", message])
    .current_dir(repo)
    .env("GIT_AUTHOR_NAME", name)
    .env("GIT_AUTHOR_EMAIL", email)
    .env("GIT_COMMITTER_NAME", name)
    .env("GIT_COMMITTER_EMAIL", email)
    .env("GIT_AUTHOR_DATE", date)
    .env("GIT_COMMITTER_DATE", date)
    .status()
    .unwrap();
  assert!(status.success(), "commit {:?} failed", message);
}

pub fn write(repo: &Path, rel: &str, contents: &str) {
  let path = repo.join(rel);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, contents).unwrap();
}

/// A repository with two authors and one commit outside August 2025.
///
/// In 2025-08 (UTC): Jane Doe has 3 commits (one under a differently cased
/// name and email) touching `app/models/user.rb`, `app/models/account.rb`
/// and `README.md`; Bob Builder has 1 commit touching `src/lib.rs`.
/// Bob also has a 2025-07-10 commit that falls outside the month.
pub fn init_fixture_repo() -> tempfile::TempDir {
  let dir = tempfile::TempDir::new().unwrap();
  let root = dir.path();

  run(root, &["init", "-q", "-b", "main"]);
  run(root, &["config", "user.name", "Fixture Bot"]);
  run(root, &["config", "user.email", "fixture@example.com"]);
  run(root, &["config", "commit.gpgsign", "false"]);

  write(root, "src/main.rs", "fn main() {}\n");
  commit_as(root, "Bob Builder", "bob@example.com", "2025-07-10T09:00:00+00:00", "chore: scaffold");

  write(root, "app/models/user.rb", "class User; end\n");
  write(root, "README.md", "# fixture\n");
  commit_as(root, "Jane Doe", "jane@example.com", "2025-08-05T10:00:00+00:00", "feat: add user model");

  write(root, "app/models/user.rb", "class User\n  attr_reader :name\nend\n");
  commit_as(root, "Jane Doe", "jane@example.com", "2025-08-12T14:03:00+00:00", "feat: user name");

  write(root, "src/lib.rs", "pub fn answer() -> u32 { 42 }\n");
  commit_as(root, "Bob Builder", "bob@example.com", "2025-08-14T08:30:00+00:00", "feat: add lib");

  write(root, "app/models/account.rb", "class Account; end\n");
  commit_as(root, "jane doe", "JANE@Example.com", "2025-08-20T16:45:00+00:00", "feat: add account model");

  dir
}
