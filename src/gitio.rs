use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, SecondsFormat};

use crate::util::run_git;

/// Record separator between commits in `log_window` output.
pub const RECORD_SEP: char = '\u{1e}';
/// Field separator inside a commit header line.
pub const FIELD_SEP: char = '\u{1f}';

/// `git log --numstat` over every ref, bounded by committer date.
///
/// Bounds are widened by a second on each side; callers apply the exact
/// half-open filter since git compares at second granularity.
pub fn log_window(repo: &str, since: DateTime<Local>, until: DateTime<Local>, timeout: Option<Duration>) -> Result<String> {
  let since = (since - chrono::Duration::seconds(1)).to_rfc3339_opts(SecondsFormat::Secs, true);
  let until = (until + chrono::Duration::seconds(1)).to_rfc3339_opts(SecondsFormat::Secs, true);
  let args: Vec<String> = vec![
    "-c".into(), "log.showSignature=false".into(),
    "-c".into(), "core.quotePath=false".into(),
    "log".into(),
    "--all".into(),
    "--no-renames".into(),
    "--no-color".into(),
    "--numstat".into(),
    "--date-order".into(),
    format!("--since={}", since),
    format!("--until={}", until),
    "--format=%x1e%H%x1f%an%x1f%ae%x1f%ct%x1f%s".into(),
  ];
  run_git(repo, &args, timeout)
}

/// Approximate size of a repository's history, for `validate-repos`.
pub fn commit_count(repo: &str, timeout: Option<Duration>) -> Result<u64> {
  let out = run_git(repo, &["rev-list".into(), "--count".into(), "--all".into()], timeout)?;
  Ok(out.trim().parse::<u64>().unwrap_or(0))
}
