// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Fuse commit history (window-accurate) and bulk-tool totals (lifetime) into per-author and per-repository reports
// role: reconciliation/core
// inputs: CommitRecord slice and a LifetimeFeed per repository; RepositoryOutcome list for the cross-repository pass
// outputs: RepositoryReport per repository; OverallReport with combined totals and combined authors
// invariants:
// - Only identities with window commits are materialized; lifetime-only authors land in unmatched_lifetime_authors
// - Author files_touched is a union per author; repository files_touched is a union across authors
// - Cross-repository file sets are never unioned; combined files_touched is a sum of per-repository figures
// - Lifetime figures attach by email first, then by normalized name only when exactly one identity carries that name
// - All aggregation is order-independent; output ordering is explicit (commits desc, identity asc)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::model::{
  normalize_key, AuthorIdentity, CommitRecord, LifetimeSource, MergedAuthorRecord, OverallReport, RawAuthorStat,
  RecentCommit, RepositoryOutcome, RepositoryReport, TimelineCommit, Totals, UnmatchedAuthor, UnmatchedReason,
  RECENT_COMMITS_KEPT, REPOSITORY_TIMELINE_KEPT,
};
use crate::window::TimeWindow;

/// What the bulk-statistics source produced for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifetimeFeed {
  Stats(Vec<RawAuthorStat>),
  /// Tool missing or timed out.
  Unavailable(String),
  /// Tool ran but its result was unusable.
  Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Lifetime {
  commits: u64,
  lines_added: u64,
  lines_removed: u64,
}

impl Lifetime {
  fn absorb(&mut self, stat: &RawAuthorStat) {
    self.commits += stat.commits;
    self.lines_added += stat.lines_added;
    self.lines_removed += stat.lines_removed;
  }
}

pub fn reconcile_repository(
  path: &str,
  name: &str,
  window: &TimeWindow,
  commits: &[CommitRecord],
  lifetime: LifetimeFeed,
) -> RepositoryReport {
  let grouped = group_by_identity(commits);

  let (lifetime_source, stats) = match lifetime {
    LifetimeFeed::Stats(stats) => (LifetimeSource::Available, stats),
    LifetimeFeed::Unavailable(reason) => (LifetimeSource::Unavailable { reason }, Vec::new()),
    LifetimeFeed::Failed(reason) => (LifetimeSource::Failed { reason }, Vec::new()),
  };

  let (attached, unmatched) = attach_lifetime(&grouped, &stats);
  for u in unmatched.iter().filter(|u| u.reason == UnmatchedReason::AmbiguousName) {
    tracing::warn!(
      repo = %path,
      author = %u.display_name,
      candidates = u.candidates.len(),
      "lifetime statistics left unattached: name matches several window identities"
    );
  }

  let mut authors: Vec<MergedAuthorRecord> = grouped
    .iter()
    .map(|(identity, records)| merge_author(identity, records, attached.get(identity).copied()))
    .collect();
  sort_authors(&mut authors);

  RepositoryReport {
    path: path.to_string(),
    name: name.to_string(),
    window: *window,
    totals: repository_totals(commits),
    authors,
    lifetime_source,
    unmatched_lifetime_authors: unmatched,
    recent_commits: timeline(commits),
  }
}

/// Newest commits first; ties by commit id so history order never leaks into the report.
fn timeline(commits: &[CommitRecord]) -> Vec<TimelineCommit> {
  let mut entries: Vec<TimelineCommit> = commits
    .iter()
    .map(|c| TimelineCommit {
      at: c.timestamp,
      commit_id: c.commit_id.clone(),
      author_name: c.author_name.clone(),
      subject: c.subject.clone(),
      lines_added: c.lines_added,
      lines_removed: c.lines_removed,
    })
    .collect();
  entries.sort_by(|a, b| b.at.cmp(&a.at).then_with(|| a.commit_id.cmp(&b.commit_id)));
  entries.dedup_by(|a, b| a.commit_id == b.commit_id);
  entries.truncate(REPOSITORY_TIMELINE_KEPT);
  entries
}

fn group_by_identity(commits: &[CommitRecord]) -> BTreeMap<AuthorIdentity, Vec<&CommitRecord>> {
  let mut grouped: BTreeMap<AuthorIdentity, Vec<&CommitRecord>> = BTreeMap::new();
  for c in commits {
    grouped
      .entry(AuthorIdentity::from_parts(&c.author_name, Some(&c.author_email)))
      .or_default()
      .push(c);
  }
  grouped
}

fn attach_lifetime(
  grouped: &BTreeMap<AuthorIdentity, Vec<&CommitRecord>>,
  stats: &[RawAuthorStat],
) -> (BTreeMap<AuthorIdentity, Lifetime>, Vec<UnmatchedAuthor>) {
  let mut by_name: BTreeMap<String, BTreeSet<AuthorIdentity>> = BTreeMap::new();
  for (identity, records) in grouped {
    for c in records {
      by_name.entry(normalize_key(&c.author_name)).or_default().insert(identity.clone());
    }
  }

  let mut attached: BTreeMap<AuthorIdentity, Lifetime> = BTreeMap::new();
  let mut unmatched = Vec::new();

  for stat in stats {
    let by_email = stat
      .email
      .as_deref()
      .map(|email| AuthorIdentity::from_parts(&stat.display_name, Some(email)))
      .filter(|identity| grouped.contains_key(identity));

    let target = match by_email {
      Some(identity) => Ok(identity),
      None => {
        let candidates: Vec<&AuthorIdentity> =
          by_name.get(&normalize_key(&stat.display_name)).map(|ids| ids.iter().collect()).unwrap_or_default();
        match candidates.as_slice() {
          [only] => Ok((*only).clone()),
          [] => Err((UnmatchedReason::NoWindowActivity, Vec::new())),
          many => Err((UnmatchedReason::AmbiguousName, many.iter().map(|id| (*id).clone()).collect())),
        }
      }
    };

    match target {
      Ok(identity) => attached.entry(identity).or_default().absorb(stat),
      Err((reason, candidates)) => unmatched.push(UnmatchedAuthor {
        display_name: stat.display_name.clone(),
        reason,
        candidates,
        lifetime_commits: stat.commits,
      }),
    }
  }

  (attached, unmatched)
}

fn merge_author(identity: &AuthorIdentity, commits: &[&CommitRecord], lifetime: Option<Lifetime>) -> MergedAuthorRecord {
  let files: BTreeSet<&str> = commits.iter().flat_map(|c| c.files_touched.iter().map(String::as_str)).collect();

  let mut recent_commits: Vec<RecentCommit> = commits
    .iter()
    .map(|c| RecentCommit { at: c.timestamp, commit_id: c.commit_id.clone(), subject: c.subject.clone() })
    .collect();
  sort_recent(&mut recent_commits);

  MergedAuthorRecord {
    identity: identity.clone(),
    display_name: display_name(identity, commits),
    commits_in_window: commits.len() as u64,
    lines_added_in_window: commits.iter().map(|c| c.lines_added).sum(),
    lines_removed_in_window: commits.iter().map(|c| c.lines_removed).sum(),
    files_touched_in_window: files.len() as u64,
    lifetime_commits: lifetime.map(|l| l.commits),
    lifetime_lines_added: lifetime.map(|l| l.lines_added),
    lifetime_lines_removed: lifetime.map(|l| l.lines_removed),
    first_commit_at: commits.iter().map(|c| c.timestamp).min(),
    last_commit_at: commits.iter().map(|c| c.timestamp).max(),
    file_types: file_type_counts(files.iter().copied()),
    recent_commits,
  }
}

/// Most frequent author name; ties go to the lexicographically smallest.
fn display_name(identity: &AuthorIdentity, commits: &[&CommitRecord]) -> String {
  let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
  for c in commits {
    let name = c.author_name.trim();
    if !name.is_empty() {
      *counts.entry(name).or_default() += 1;
    }
  }

  let mut best: Option<(&str, u64)> = None;
  for (name, n) in counts {
    if best.map_or(true, |(_, top)| n > top) {
      best = Some((name, n));
    }
  }
  best.map(|(name, _)| name.to_string()).unwrap_or_else(|| identity.to_string())
}

fn sort_recent(recent: &mut Vec<RecentCommit>) {
  recent.sort_by(|a, b| b.at.cmp(&a.at).then_with(|| a.commit_id.cmp(&b.commit_id)));
  recent.dedup_by(|a, b| a.commit_id == b.commit_id);
  recent.truncate(RECENT_COMMITS_KEPT);
}

/// Lowercased extension, or None for extension-less paths.
pub fn file_extension(path: &str) -> Option<String> {
  Path::new(path)
    .extension()
    .map(|ext| ext.to_string_lossy().to_lowercase())
    .filter(|ext| !ext.is_empty())
}

pub fn file_type_counts<'a>(files: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, u64> {
  let mut counts = BTreeMap::new();
  for f in files {
    if let Some(ext) = file_extension(f) {
      *counts.entry(ext).or_default() += 1;
    }
  }
  counts
}

/// Descending commits_in_window, ties by identity ascending.
pub fn sort_authors(authors: &mut [MergedAuthorRecord]) {
  authors.sort_by(|a, b| {
    b.commits_in_window
      .cmp(&a.commits_in_window)
      .then_with(|| a.identity.cmp(&b.identity))
  });
}

fn repository_totals(commits: &[CommitRecord]) -> Totals {
  let files: BTreeSet<&str> = commits.iter().flat_map(|c| c.files_touched.iter().map(String::as_str)).collect();
  Totals {
    commits: commits.len() as u64,
    lines_added: commits.iter().map(|c| c.lines_added).sum(),
    lines_removed: commits.iter().map(|c| c.lines_removed).sum(),
    files_touched: files.len() as u64,
  }
}

/// Convergence step: needs every repository's outcome. Input order is preserved.
pub fn combine(window: TimeWindow, outcomes: Vec<RepositoryOutcome>) -> OverallReport {
  let mut repositories = Vec::new();
  let mut failures = Vec::new();
  for outcome in outcomes {
    match outcome {
      RepositoryOutcome::Reported(report) => repositories.push(report),
      RepositoryOutcome::Failed(failure) => failures.push(failure),
    }
  }

  let mut combined_totals = Totals::default();
  let mut combined_authors: BTreeMap<AuthorIdentity, MergedAuthorRecord> = BTreeMap::new();

  for repo in &repositories {
    combined_totals.commits += repo.totals.commits;
    combined_totals.lines_added += repo.totals.lines_added;
    combined_totals.lines_removed += repo.totals.lines_removed;
    combined_totals.files_touched += repo.totals.files_touched;

    for author in &repo.authors {
      match combined_authors.entry(author.identity.clone()) {
        Entry::Vacant(slot) => {
          slot.insert(author.clone());
        }
        Entry::Occupied(mut slot) => absorb_author(slot.get_mut(), author),
      }
    }
  }

  OverallReport { window, repositories, failures, combined_totals, combined_authors }
}

fn absorb_author(into: &mut MergedAuthorRecord, other: &MergedAuthorRecord) {
  into.commits_in_window += other.commits_in_window;
  into.lines_added_in_window += other.lines_added_in_window;
  into.lines_removed_in_window += other.lines_removed_in_window;
  into.files_touched_in_window += other.files_touched_in_window;
  into.lifetime_commits = add_known(into.lifetime_commits, other.lifetime_commits);
  into.lifetime_lines_added = add_known(into.lifetime_lines_added, other.lifetime_lines_added);
  into.lifetime_lines_removed = add_known(into.lifetime_lines_removed, other.lifetime_lines_removed);
  into.first_commit_at = into.first_commit_at.into_iter().chain(other.first_commit_at).min();
  into.last_commit_at = into.last_commit_at.into_iter().chain(other.last_commit_at).max();
  for (ext, n) in &other.file_types {
    *into.file_types.entry(ext.clone()).or_default() += n;
  }
  into.recent_commits.extend(other.recent_commits.iter().cloned());
  sort_recent(&mut into.recent_commits);
}

/// Known values add; a single known value is used as-is.
fn add_known(a: Option<u64>, b: Option<u64>) -> Option<u64> {
  match (a, b) {
    (Some(x), Some(y)) => Some(x + y),
    (x, None) => x,
    (None, y) => y,
  }
}
