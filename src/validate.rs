// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Classify filesystem paths as usable Git working repositories before any collection runs
// role: validation
// inputs: repository paths
// outputs: RepoStatus classification (never an error for the not-a-repository case)
// side_effects: Read-only filesystem checks
// invariants: A `.git` directory or a `.git` gitdir file (worktrees, submodules) marks a repository
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use crate::model::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
  Valid,
  NotFound,
  NotARepository,
}

impl RepoStatus {
  pub fn describe(&self) -> &'static str {
    match self {
      RepoStatus::Valid => "valid Git repository",
      RepoStatus::NotFound => "path does not exist",
      RepoStatus::NotARepository => "not a Git repository",
    }
  }

  pub fn failure_kind(&self) -> Option<FailureKind> {
    match self {
      RepoStatus::Valid => None,
      RepoStatus::NotFound => Some(FailureKind::NotFound),
      RepoStatus::NotARepository => Some(FailureKind::NotARepository),
    }
  }
}

pub fn validate_repository<P: AsRef<Path>>(path: P) -> RepoStatus {
  let path = path.as_ref();

  if !path.exists() {
    return RepoStatus::NotFound;
  }
  if !path.is_dir() {
    return RepoStatus::NotARepository;
  }

  let marker = path.join(".git");
  if marker.is_dir() {
    return RepoStatus::Valid;
  }
  if marker.is_file() {
    let gitdir_pointer = std::fs::read_to_string(&marker)
      .map(|s| s.trim_start().starts_with("gitdir:"))
      .unwrap_or(false);
    if gitdir_pointer {
      return RepoStatus::Valid;
    }
  }

  RepoStatus::NotARepository
}
