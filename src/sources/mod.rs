// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Capability seams for the two independent statistics feeds (bulk tool, commit history)
// role: sources/namespace
// outputs: LifetimeStatsSource and CommitHistorySource traits plus their subprocess-backed implementations
// invariants:
// - Implementations are Sync so repositories can be collected in parallel
// - Sources never see each other's output; fusion happens in reconcile
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use crate::error::Result;
use crate::model::{CommitRecord, RawAuthorStat};
use crate::window::TimeWindow;

pub mod commit_log;
pub mod gitinspector;

pub use commit_log::GitLogSource;
pub use gitinspector::GitInspectorSource;

/// Source A: per-author totals that are not scoped to the analysis window.
pub trait LifetimeStatsSource: Sync {
  fn author_stats(&self, repo: &Path, window: &TimeWindow) -> Result<Vec<RawAuthorStat>>;
}

/// Source B: one record per commit whose timestamp falls inside the window.
pub trait CommitHistorySource: Sync {
  fn commits(&self, repo: &Path, window: &TimeWindow) -> Result<Vec<CommitRecord>>;
}
