// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Source B adapter: read commit metadata and per-file numstat for the analysis window from git history
// role: sources/commit-history
// inputs: repository path, TimeWindow, per-invocation timeout from Settings
// outputs: CommitRecord per commit with committer time in [start, end)
// side_effects: Spawns one `git log` per repository
// invariants:
// - Merge and empty commits still yield a record (empty files_touched)
// - Binary numstat entries ("-") count as touched with zero lines
// - Output order is git's; consumers must not depend on it
// errors: HistoryRead for unreadable/corrupt repositories and timeouts
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::error::{DigestError, Result};
use crate::gitio::{self, FIELD_SEP, RECORD_SEP};
use crate::model::CommitRecord;
use crate::sources::CommitHistorySource;
use crate::window::TimeWindow;

pub struct GitLogSource {
  timeout: Option<Duration>,
}

impl GitLogSource {
  pub fn new(settings: &Settings) -> Self {
    Self { timeout: settings.source_timeout }
  }
}

impl CommitHistorySource for GitLogSource {
  fn commits(&self, repo: &Path, window: &TimeWindow) -> Result<Vec<CommitRecord>> {
    let repo_str = repo.to_string_lossy().to_string();
    let raw = gitio::log_window(&repo_str, window.start(), window.end(), self.timeout).map_err(|e| {
      DigestError::HistoryRead { repo: repo_str.clone(), reason: format!("{:#}", e) }
    })?;
    let commits = parse_log_output(&raw, window);
    tracing::debug!(repo = %repo_str, commits = commits.len(), "history read");
    Ok(commits)
  }
}

/// Parse `gitio::log_window` output, keeping commits inside `window`.
pub fn parse_log_output(raw: &str, window: &TimeWindow) -> Vec<CommitRecord> {
  raw
    .split(RECORD_SEP)
    .filter(|chunk| !chunk.trim().is_empty())
    .filter_map(parse_record)
    .filter(|c| window.contains(&c.timestamp))
    .collect()
}

fn parse_record(chunk: &str) -> Option<CommitRecord> {
  let mut lines = chunk.lines();
  let header = lines.next()?;
  let fields: Vec<&str> = header.splitn(5, FIELD_SEP).collect();
  if fields.len() < 4 {
    tracing::warn!(header, "skipping malformed commit header");
    return None;
  }

  let secs: i64 = fields[3].trim().parse().ok()?;
  let timestamp = DateTime::<Utc>::from_timestamp(secs, 0)?;

  let mut files_touched = BTreeSet::new();
  let mut lines_added = 0u64;
  let mut lines_removed = 0u64;

  for line in lines {
    let parts: Vec<&str> = line.splitn(3, '\t').collect();
    if parts.len() != 3 {
      continue;
    }
    lines_added += parts[0].parse::<u64>().unwrap_or(0);
    lines_removed += parts[1].parse::<u64>().unwrap_or(0);
    let path = parts[2].trim().trim_matches('"');
    if !path.is_empty() {
      files_touched.insert(path.to_string());
    }
  }

  Some(CommitRecord {
    commit_id: fields[0].trim().to_string(),
    author_name: fields[1].to_string(),
    author_email: fields[2].to_string(),
    timestamp,
    subject: fields.get(4).map(|s| s.to_string()).unwrap_or_default(),
    files_touched,
    lines_added,
    lines_removed,
  })
}
