// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Serialize an OverallReport into the payload consumed by the text generator (and --payload-out)
// role: payload/builder
// inputs: OverallReport; display timezone (local, utc, or IANA name)
// outputs: ReportPayload (serde Serialize); JSON text
// invariants:
// - Pure: no IO; identical input gives byte-identical JSON
// - Repositories keep input order; authors sort by commits desc then identity asc
// - File-type lists sort by count desc then extension asc
// - Lifetime fields serialize as null when unknown (never omitted)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use crate::error::Result;
use crate::model::{
  AuthorIdentity, LifetimeSource, MergedAuthorRecord, OverallReport, RepositoryFailure, RepositoryReport, Totals,
  UnmatchedAuthor,
};
use crate::reconcile::sort_authors;
use crate::util::iso_in_tz;

pub const SCHEMA_VERSION: u32 = 1;
const TOP_AUTHORS: usize = 5;
const TOP_FILE_TYPES: usize = 10;
const MESSAGE_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload {
  pub schema_version: u32,
  pub time_window: PayloadWindow,
  pub summary: PayloadSummary,
  pub overall_stats: OverallStats,
  pub repositories: Vec<RepositoryEntry>,
  pub authors: Vec<AuthorEntry>,
  pub failures: Vec<RepositoryFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadWindow {
  pub start: String,
  pub end: String,
  pub duration_days: i64,
  pub timezone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadSummary {
  pub total_commits: u64,
  pub total_authors: usize,
  pub total_repositories: usize,
  pub failed_repositories: usize,
  pub avg_commits_per_author: f64,
  pub avg_commits_per_repo: f64,
  pub avg_commits_per_day: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
  pub commits: u64,
  pub lines_added: u64,
  pub lines_removed: u64,
  pub net_lines: i64,
  pub files_touched: u64,
  pub top_file_types: Vec<FileTypeCount>,
  pub top_authors_by_commits: Vec<TopAuthor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTypeCount {
  pub extension: String,
  pub files: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopAuthor {
  pub identity: AuthorIdentity,
  pub display_name: String,
  pub commits: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryEntry {
  pub name: String,
  pub path: String,
  pub totals: Totals,
  pub net_lines: i64,
  pub unique_authors: usize,
  pub lifetime_source: LifetimeSource,
  pub authors: Vec<AuthorEntry>,
  pub unmatched_lifetime_authors: Vec<UnmatchedAuthor>,
  pub top_file_types: Vec<FileTypeCount>,
  pub recent_commits: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
  pub date: String,
  pub commit_id: String,
  pub author: String,
  /// first MESSAGE_CHARS characters of the subject
  pub message: String,
  pub lines_changed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorEntry {
  pub identity: AuthorIdentity,
  pub display_name: String,
  pub commits_in_window: u64,
  pub lines_added_in_window: u64,
  pub lines_removed_in_window: u64,
  pub net_lines: i64,
  pub files_touched_in_window: u64,
  pub lifetime_commits: Option<u64>,
  pub lifetime_lines_added: Option<u64>,
  pub lifetime_lines_removed: Option<u64>,
  pub first_commit_at: Option<String>,
  pub last_commit_at: Option<String>,
  pub active_days: i64,
  pub file_types: Vec<FileTypeCount>,
  pub recent_commit_subjects: Vec<String>,
  /// Only set on the combined author list.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub repositories: Vec<String>,
}

pub fn build_payload(report: &OverallReport, tz: &str) -> ReportPayload {
  let window = &report.window;
  let duration_days = window.duration_days();

  let repositories: Vec<RepositoryEntry> = report.repositories.iter().map(|r| repository_entry(r, tz)).collect();

  let mut combined: Vec<MergedAuthorRecord> = report.combined_authors.values().cloned().collect();
  sort_authors(&mut combined);
  let authors: Vec<AuthorEntry> = combined
    .iter()
    .map(|a| AuthorEntry { repositories: repositories_of(report, &a.identity), ..author_entry(a, tz) })
    .collect();

  let totals = report.combined_totals;
  let total_repositories = report.repositories.len();

  let mut file_types: BTreeMap<String, u64> = BTreeMap::new();
  for author in report.repositories.iter().flat_map(|r| r.authors.iter()) {
    for (ext, n) in &author.file_types {
      *file_types.entry(ext.clone()).or_default() += n;
    }
  }

  ReportPayload {
    schema_version: SCHEMA_VERSION,
    time_window: PayloadWindow {
      start: iso_in_tz(&window.start().with_timezone(&Utc), tz),
      end: iso_in_tz(&window.end().with_timezone(&Utc), tz),
      duration_days,
      timezone: tz.to_string(),
    },
    summary: PayloadSummary {
      total_commits: totals.commits,
      total_authors: authors.len(),
      total_repositories,
      failed_repositories: report.failures.len(),
      avg_commits_per_author: ratio(totals.commits, authors.len() as u64),
      avg_commits_per_repo: ratio(totals.commits, total_repositories as u64),
      avg_commits_per_day: ratio(totals.commits, duration_days.max(1) as u64),
    },
    overall_stats: OverallStats {
      commits: totals.commits,
      lines_added: totals.lines_added,
      lines_removed: totals.lines_removed,
      net_lines: net(totals.lines_added, totals.lines_removed),
      files_touched: totals.files_touched,
      top_file_types: ranked_file_types(&file_types, Some(TOP_FILE_TYPES)),
      top_authors_by_commits: combined
        .iter()
        .take(TOP_AUTHORS)
        .map(|a| TopAuthor { identity: a.identity.clone(), display_name: a.display_name.clone(), commits: a.commits_in_window })
        .collect(),
    },
    repositories,
    authors,
    failures: report.failures.clone(),
  }
}

pub fn to_json(payload: &ReportPayload) -> Result<String> {
  Ok(serde_json::to_string_pretty(payload)?)
}

fn repository_entry(repo: &RepositoryReport, tz: &str) -> RepositoryEntry {
  let mut file_types: BTreeMap<String, u64> = BTreeMap::new();
  for author in &repo.authors {
    for (ext, n) in &author.file_types {
      *file_types.entry(ext.clone()).or_default() += n;
    }
  }

  RepositoryEntry {
    name: repo.name.clone(),
    path: repo.path.clone(),
    totals: repo.totals,
    net_lines: net(repo.totals.lines_added, repo.totals.lines_removed),
    unique_authors: repo.authors.len(),
    lifetime_source: repo.lifetime_source.clone(),
    authors: repo.authors.iter().map(|a| author_entry(a, tz)).collect(),
    unmatched_lifetime_authors: repo.unmatched_lifetime_authors.clone(),
    top_file_types: ranked_file_types(&file_types, Some(TOP_FILE_TYPES)),
    recent_commits: repo
      .recent_commits
      .iter()
      .map(|c| TimelineEntry {
        date: iso_in_tz(&c.at, tz),
        commit_id: c.commit_id.clone(),
        author: c.author_name.clone(),
        message: c.subject.chars().take(MESSAGE_CHARS).collect(),
        lines_changed: c.lines_added + c.lines_removed,
      })
      .collect(),
  }
}

fn author_entry(a: &MergedAuthorRecord, tz: &str) -> AuthorEntry {
  let active_days = match (a.first_commit_at, a.last_commit_at) {
    (Some(first), Some(last)) => (last - first).num_days() + 1,
    _ => 0,
  };

  AuthorEntry {
    identity: a.identity.clone(),
    display_name: a.display_name.clone(),
    commits_in_window: a.commits_in_window,
    lines_added_in_window: a.lines_added_in_window,
    lines_removed_in_window: a.lines_removed_in_window,
    net_lines: net(a.lines_added_in_window, a.lines_removed_in_window),
    files_touched_in_window: a.files_touched_in_window,
    lifetime_commits: a.lifetime_commits,
    lifetime_lines_added: a.lifetime_lines_added,
    lifetime_lines_removed: a.lifetime_lines_removed,
    first_commit_at: a.first_commit_at.map(|t| iso_in_tz(&t, tz)),
    last_commit_at: a.last_commit_at.map(|t| iso_in_tz(&t, tz)),
    active_days,
    file_types: ranked_file_types(&a.file_types, None),
    recent_commit_subjects: a
      .recent_commits
      .iter()
      .map(|c| c.subject.clone())
      .filter(|s| !s.is_empty())
      .collect(),
    repositories: Vec::new(),
  }
}

/// Names of repositories (input order) where `identity` has window commits.
fn repositories_of(report: &OverallReport, identity: &AuthorIdentity) -> Vec<String> {
  report
    .repositories
    .iter()
    .filter(|r| r.authors.iter().any(|a| &a.identity == identity))
    .map(|r| r.name.clone())
    .collect()
}

fn ranked_file_types(counts: &BTreeMap<String, u64>, limit: Option<usize>) -> Vec<FileTypeCount> {
  let mut ranked: Vec<FileTypeCount> =
    counts.iter().map(|(ext, n)| FileTypeCount { extension: ext.clone(), files: *n }).collect();
  ranked.sort_by(|a, b| b.files.cmp(&a.files).then_with(|| a.extension.cmp(&b.extension)));
  if let Some(limit) = limit {
    ranked.truncate(limit);
  }
  ranked
}

fn net(added: u64, removed: u64) -> i64 {
  added as i64 - removed as i64
}

fn ratio(num: u64, den: u64) -> f64 {
  if den == 0 {
    return 0.0;
  }
  (num as f64 / den as f64 * 100.0).round() / 100.0
}
