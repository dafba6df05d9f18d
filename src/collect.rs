// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate per-repository collection: validate, run both sources concurrently, reconcile, then combine
// role: collection/orchestrator
// inputs: repository paths (input order), TimeWindow, the two statistics sources
// outputs: OverallReport (reports and failures in input order)
// side_effects: Sources spawn subprocesses; nothing is written
// invariants:
// - Repositories are independent; one slow or broken repository only degrades its own outcome
// - Source A and Source B for a repository run concurrently and join before reconciliation
// - Source A failures downgrade lifetime fields; Source B failures mark the repository failed
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use rayon::prelude::*;

use crate::error::DigestError;
use crate::model::{FailureKind, OverallReport, RepositoryFailure, RepositoryOutcome};
use crate::reconcile::{combine, reconcile_repository, LifetimeFeed};
use crate::sources::{CommitHistorySource, LifetimeStatsSource};
use crate::util::{canonicalize_lossy, repo_name};
use crate::validate::validate_repository;
use crate::window::TimeWindow;

pub fn collect_all(
  paths: &[String],
  window: &TimeWindow,
  lifetime: &dyn LifetimeStatsSource,
  history: &dyn CommitHistorySource,
) -> OverallReport {
  let outcomes: Vec<RepositoryOutcome> = paths
    .par_iter()
    .map(|path| {
      let status = validate_repository(path);
      match status.failure_kind() {
        Some(kind) => {
          tracing::warn!(repo = %path, status = status.describe(), "skipping repository");
          RepositoryOutcome::Failed(RepositoryFailure {
            path: path.clone(),
            kind,
            message: status.describe().to_string(),
          })
        }
        None => collect_repository(&canonicalize_lossy(path), window, lifetime, history),
      }
    })
    .collect();

  combine(*window, outcomes)
}

/// One validated repository: both sources, then reconciliation.
pub fn collect_repository(
  path: &str,
  window: &TimeWindow,
  lifetime: &dyn LifetimeStatsSource,
  history: &dyn CommitHistorySource,
) -> RepositoryOutcome {
  let repo = Path::new(path);
  let (stats, commits) = rayon::join(|| lifetime.author_stats(repo, window), || history.commits(repo, window));

  let commits = match commits {
    Ok(commits) => commits,
    Err(e) => {
      tracing::warn!(repo = %path, error = %e, "history unreadable; repository marked failed");
      return RepositoryOutcome::Failed(RepositoryFailure {
        path: path.to_string(),
        kind: FailureKind::HistoryRead,
        message: e.to_string(),
      });
    }
  };

  let feed = match stats {
    Ok(stats) => LifetimeFeed::Stats(stats),
    Err(e @ DigestError::ToolUnavailable { .. }) => {
      tracing::warn!(repo = %path, error = %e, "lifetime statistics unavailable");
      LifetimeFeed::Unavailable(e.to_string())
    }
    Err(e) => {
      tracing::warn!(repo = %path, error = %e, "lifetime statistics discarded");
      LifetimeFeed::Failed(e.to_string())
    }
  };

  let report = reconcile_repository(path, &repo_name(path), window, &commits, feed);
  tracing::info!(
    repo = %report.name,
    commits = report.totals.commits,
    authors = report.authors.len(),
    "repository collected"
  );
  RepositoryOutcome::Reported(report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Result;
  use crate::model::{CommitRecord, LifetimeSource, RawAuthorStat};
  use crate::window::{resolve_window, WindowSpec};
  use chrono::{DateTime, NaiveDate, Utc};
  use std::collections::BTreeSet;

  fn window() -> TimeWindow {
    let spec = WindowSpec::Dates {
      start: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
      end: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
    };
    resolve_window(&spec, chrono::Local::now()).unwrap()
  }

  fn dir_name(repo: &Path) -> String {
    repo.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
  }

  /// Lifetime fixture: "broken*" fails to parse, "bare*" has no tool, everything else reports Jane.
  struct FixtureLifetime;

  impl LifetimeStatsSource for FixtureLifetime {
    fn author_stats(&self, repo: &Path, _window: &TimeWindow) -> Result<Vec<RawAuthorStat>> {
      let name = dir_name(repo);
      if name.starts_with("broken") {
        return Err(DigestError::Parse { tool: "fixture".into(), reason: "garbled".into() });
      }
      if name.starts_with("bare") {
        return Err(DigestError::ToolUnavailable { tool: "fixture".into(), reason: "not installed".into() });
      }
      Ok(vec![RawAuthorStat { display_name: "Jane Doe".into(), commits: 40, ..Default::default() }])
    }
  }

  /// History fixture: "corrupt*" fails, everything else has one commit by Jane.
  struct FixtureHistory;

  impl CommitHistorySource for FixtureHistory {
    fn commits(&self, repo: &Path, _window: &TimeWindow) -> Result<Vec<CommitRecord>> {
      let name = dir_name(repo);
      if name.starts_with("corrupt") {
        return Err(DigestError::HistoryRead { repo: name, reason: "bad object".into() });
      }
      Ok(vec![CommitRecord {
        commit_id: format!("{name}-1"),
        author_name: "Jane Doe".into(),
        author_email: "jane@x.com".into(),
        timestamp: DateTime::<Utc>::from_timestamp(1_755_000_000, 0).unwrap(),
        subject: "work".into(),
        files_touched: BTreeSet::from(["main.rs".to_string()]),
        lines_added: 5,
        lines_removed: 1,
      }])
    }
  }

  fn fake_repo(root: &Path, name: &str) -> String {
    let dir = root.join(name);
    std::fs::create_dir_all(dir.join(".git")).unwrap();
    dir.to_string_lossy().to_string()
  }

  #[test]
  fn outcomes_keep_input_order_and_classify_failures() {
    let td = tempfile::TempDir::new().unwrap();
    let plain_dir = td.path().join("plain");
    std::fs::create_dir_all(&plain_dir).unwrap();

    let paths = vec![
      fake_repo(td.path(), "api"),
      td.path().join("missing").to_string_lossy().to_string(),
      fake_repo(td.path(), "corrupt-web"),
      plain_dir.to_string_lossy().to_string(),
      fake_repo(td.path(), "bare-tools"),
      fake_repo(td.path(), "broken-docs"),
    ];

    let overall = collect_all(&paths, &window(), &FixtureLifetime, &FixtureHistory);

    let names: Vec<&str> = overall.repositories.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["api", "bare-tools", "broken-docs"]);

    let kinds: Vec<FailureKind> = overall.failures.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FailureKind::NotFound, FailureKind::HistoryRead, FailureKind::NotARepository]);

    assert_eq!(overall.repositories[0].lifetime_source, LifetimeSource::Available);
    assert_eq!(overall.repositories[0].authors[0].lifetime_commits, Some(40));
    assert!(matches!(overall.repositories[1].lifetime_source, LifetimeSource::Unavailable { .. }));
    assert!(matches!(overall.repositories[2].lifetime_source, LifetimeSource::Failed { .. }));
    assert_eq!(overall.repositories[2].authors[0].commits_in_window, 1);

    assert_eq!(overall.combined_totals.commits, 3);
    let jane = overall.combined_authors.values().next().unwrap();
    assert_eq!(jane.commits_in_window, 3);
    assert_eq!(jane.lifetime_commits, Some(40));
  }

  #[test]
  fn empty_input_is_an_empty_report() {
    let overall = collect_all(&[], &window(), &FixtureLifetime, &FixtureHistory);
    assert!(overall.repositories.is_empty());
    assert!(overall.failures.is_empty());
    assert!(overall.combined_authors.is_empty());
  }
}
