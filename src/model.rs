// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the collection and reconciliation model (raw source records, identities, merged author/repository reports)
// role: model/types
// outputs: Plain data types; no IO
// invariants:
// - AuthorIdentity keys are trimmed and lowercased; normalizing a key again is a no-op
// - *_in_window fields come from commit history only; lifetime_* fields come from the bulk tool only
// - Reports are rebuilt every run and never mutated after construction
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::window::TimeWindow;

/// Per-author totals reported by the bulk statistics tool. No timestamp granularity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawAuthorStat {
  pub display_name: String,
  pub email: Option<String>,
  pub commits: u64,
  pub lines_added: u64,
  pub lines_removed: u64,
  pub files_changed: u64,
}

/// One commit inside the analysis window, as read from history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
  pub commit_id: String,
  pub author_name: String,
  pub author_email: String,
  pub timestamp: DateTime<Utc>,
  pub subject: String,
  pub files_touched: BTreeSet<String>,
  pub lines_added: u64,
  pub lines_removed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AuthorIdentity(String);

impl AuthorIdentity {
  /// Email when present, else display name.
  pub fn from_parts(name: &str, email: Option<&str>) -> Self {
    match email.map(str::trim).filter(|e| !e.is_empty()) {
      Some(email) => AuthorIdentity(normalize_key(email)),
      None => AuthorIdentity::from_name(name),
    }
  }

  pub fn from_name(name: &str) -> Self {
    AuthorIdentity(normalize_key(name))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for AuthorIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

pub fn normalize_key(raw: &str) -> String {
  raw.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedAuthorRecord {
  pub identity: AuthorIdentity,
  pub display_name: String,
  pub commits_in_window: u64,
  pub lines_added_in_window: u64,
  pub lines_removed_in_window: u64,
  pub files_touched_in_window: u64,
  pub lifetime_commits: Option<u64>,
  pub lifetime_lines_added: Option<u64>,
  pub lifetime_lines_removed: Option<u64>,
  pub first_commit_at: Option<DateTime<Utc>>,
  pub last_commit_at: Option<DateTime<Utc>>,
  /// extension -> distinct files touched in the window
  pub file_types: BTreeMap<String, u64>,
  /// newest first, at most RECENT_COMMITS_KEPT
  pub recent_commits: Vec<RecentCommit>,
}

pub const RECENT_COMMITS_KEPT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentCommit {
  pub at: DateTime<Utc>,
  pub commit_id: String,
  pub subject: String,
}

pub const REPOSITORY_TIMELINE_KEPT: usize = 20;

/// One entry of a repository's commit timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineCommit {
  pub at: DateTime<Utc>,
  pub commit_id: String,
  pub author_name: String,
  pub subject: String,
  pub lines_added: u64,
  pub lines_removed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
  pub commits: u64,
  pub lines_added: u64,
  pub lines_removed: u64,
  pub files_touched: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LifetimeSource {
  Available,
  Unavailable { reason: String },
  Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
  /// No commits in the window under any matching identity.
  NoWindowActivity,
  /// Name matches several window identities with different emails.
  AmbiguousName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedAuthor {
  pub display_name: String,
  pub reason: UnmatchedReason,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub candidates: Vec<AuthorIdentity>,
  pub lifetime_commits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReport {
  pub path: String,
  pub name: String,
  pub window: TimeWindow,
  /// descending commits_in_window, ties by identity ascending
  pub authors: Vec<MergedAuthorRecord>,
  pub totals: Totals,
  pub lifetime_source: LifetimeSource,
  pub unmatched_lifetime_authors: Vec<UnmatchedAuthor>,
  /// newest first (ties by commit id), at most REPOSITORY_TIMELINE_KEPT
  pub recent_commits: Vec<TimelineCommit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  NotFound,
  NotARepository,
  HistoryRead,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryFailure {
  pub path: String,
  pub kind: FailureKind,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryOutcome {
  Reported(RepositoryReport),
  Failed(RepositoryFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallReport {
  pub window: TimeWindow,
  /// input order
  pub repositories: Vec<RepositoryReport>,
  pub failures: Vec<RepositoryFailure>,
  pub combined_totals: Totals,
  pub combined_authors: BTreeMap<AuthorIdentity, MergedAuthorRecord>,
}
