// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Source A adapter: run the bulk statistics tool (gitinspector-compatible) and parse per-author totals
// role: sources/bulk-statistics
// inputs: repository path; tool path, scope flag and timeout from Settings
// outputs: RawAuthorStat per author (zero authors is a valid, empty result)
// side_effects: Spawns the external tool once per repository
// invariants:
// - JSON output is preferred; the textual author table is accepted as a fallback
// - Whitespace-only output means "no authors", never an error
// errors: ToolUnavailable (missing binary, timeout); Parse (non-zero exit, unrecognised output)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Settings;
use crate::error::{DigestError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::model::RawAuthorStat;
use crate::sources::LifetimeStatsSource;
use crate::util::{run_with_timeout, RunError};
use crate::window::TimeWindow;

pub struct GitInspectorSource {
  program: String,
  scope_to_window: bool,
  timeout: Option<Duration>,
}

impl GitInspectorSource {
  pub fn new(settings: &Settings) -> Self {
    Self {
      program: settings.bulk_tool.clone(),
      scope_to_window: settings.bulk_tool_scope_to_window,
      timeout: settings.source_timeout,
    }
  }

  fn args(&self, repo: &Path, window: &TimeWindow) -> Vec<String> {
    let mut args = vec!["--format=json".to_string()];
    if self.scope_to_window {
      args.push(format!("--since={}", window.start().format("%Y-%m-%d")));
      args.push(format!("--until={}", window.end().format("%Y-%m-%d")));
    }
    args.push(repo.to_string_lossy().to_string());
    args
  }
}

impl LifetimeStatsSource for GitInspectorSource {
  fn author_stats(&self, repo: &Path, window: &TimeWindow) -> Result<Vec<RawAuthorStat>> {
    let out = run_with_timeout(&self.program, &self.args(repo, window), repo, self.timeout).map_err(|e| match e {
      RunError::NotFound(_) | RunError::TimedOut(_) => {
        DigestError::ToolUnavailable { tool: self.program.clone(), reason: e.to_string() }
      }
      RunError::Io(io) => DigestError::ToolUnavailable { tool: self.program.clone(), reason: io.to_string() },
    })?;

    if !out.status.success() {
      return Err(DigestError::Parse {
        tool: self.program.clone(),
        reason: format!("exited with {}: {}", out.status, out.stderr.trim()),
      });
    }

    parse_output(&out.stdout).map_err(|reason| DigestError::Parse { tool: self.program.clone(), reason })
  }
}

/// Parse tool stdout: JSON first, then the textual author table.
pub fn parse_output(stdout: &str) -> std::result::Result<Vec<RawAuthorStat>, String> {
  if stdout.trim().is_empty() {
    return Ok(Vec::new());
  }

  if let Ok(doc) = serde_json::from_str::<serde_json::Value>(stdout) {
    return parse_json(&doc);
  }

  parse_text(stdout).ok_or_else(|| "output is neither JSON nor a recognised author table".to_string())
}

fn parse_json(doc: &serde_json::Value) -> std::result::Result<Vec<RawAuthorStat>, String> {
  let root = if doc.fetch("gitinspector").exists() { "gitinspector." } else { "" };
  let changes = doc.fetch(&format!("{root}changes"));
  if !changes.exists() {
    if doc.fetch(&format!("{root}repository")).exists() {
      // Repositories without history report no changes block.
      return Ok(Vec::new());
    }
    return Err("JSON output has no changes section".to_string());
  }

  let authors = doc.fetch(&format!("{root}changes.authors")).items();
  let mut stats = Vec::with_capacity(authors.len());

  for author in authors {
    let Some(display_name) = author.fetch("name").text() else {
      tracing::debug!("skipping bulk-tool author entry without a name");
      continue;
    };
    stats.push(RawAuthorStat {
      display_name,
      email: author.fetch("email").text(),
      commits: author.fetch("commits").count().unwrap_or(0),
      lines_added: author.fetch("insertions").count().unwrap_or(0),
      lines_removed: author.fetch("deletions").count().unwrap_or(0),
      files_changed: author.fetch("files").count().unwrap_or(0),
    });
  }

  Ok(stats)
}

static TABLE_HEADER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^\s*Author\s+Commits\s+Insertions\s+Deletions").expect("static regex"));
static TABLE_ROW: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^\s*(?P<name>\S.*?)\s+(?P<commits>\d+)\s+(?P<ins>\d+)\s+(?P<del>\d+)\s+(?P<pct>\d+(?:\.\d+)?)\s*$")
    .expect("static regex")
});

/// Textual report: the first "Author Commits Insertions Deletions ..." table, up to a blank line.
fn parse_text(stdout: &str) -> Option<Vec<RawAuthorStat>> {
  let mut lines = stdout.lines().skip_while(|l| !TABLE_HEADER.is_match(l));
  lines.next()?;

  let stats = lines
    .take_while(|l| !l.trim().is_empty())
    .filter_map(|l| TABLE_ROW.captures(l))
    .map(|caps| RawAuthorStat {
      display_name: caps["name"].trim().to_string(),
      email: None,
      commits: caps["commits"].parse().unwrap_or(0),
      lines_added: caps["ins"].parse().unwrap_or(0),
      lines_removed: caps["del"].parse().unwrap_or(0),
      files_changed: 0,
    })
    .collect();

  Some(stats)
}
