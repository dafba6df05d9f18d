use std::fmt::Write as _;

use crate::error::Result;
use crate::model::LifetimeSource;
use crate::payload::ReportPayload;
use crate::services::ReportWriter;

const LISTED: usize = 5;

/// Deterministic markdown report rendered straight from the payload (`--offline`).
pub struct PlainSummaryWriter;

impl ReportWriter for PlainSummaryWriter {
  fn write_report(&self, payload: &ReportPayload) -> Result<String> {
    Ok(render(payload))
  }
}

fn render(p: &ReportPayload) -> String {
  let s = &p.summary;
  let o = &p.overall_stats;
  let w = &p.time_window;
  let mut out = String::new();

  let _ = writeln!(out, "# Git Activity Report\n");
  let _ = writeln!(out, "## Executive Summary");
  let _ = writeln!(
    out,
    "{} commits by {} contributors across {} repositories from {} to {} ({} days).\n",
    s.total_commits, s.total_authors, s.total_repositories, w.start, w.end, w.duration_days
  );

  let _ = writeln!(out, "## Overall Activity");
  let _ = writeln!(out, "- **Commits**: {}", thousands(o.commits as i64));
  let _ = writeln!(out, "- **Lines added**: {}", thousands(o.lines_added as i64));
  let _ = writeln!(out, "- **Lines removed**: {}", thousands(o.lines_removed as i64));
  let _ = writeln!(out, "- **Net lines**: {}", thousands(o.net_lines));
  let _ = writeln!(out, "- **Files touched**: {}", thousands(o.files_touched as i64));
  let _ = writeln!(out, "- **Commits per day**: {:.2}", s.avg_commits_per_day);
  if !o.top_file_types.is_empty() {
    let types: Vec<String> = o.top_file_types.iter().take(LISTED).map(|t| format!("{} ({})", t.extension, t.files)).collect();
    let _ = writeln!(out, "- **File types**: {}", types.join(", "));
  }
  out.push('\n');

  let _ = writeln!(out, "## Repositories");
  for r in &p.repositories {
    let _ = writeln!(out, "\n### {}", r.name);
    let _ = writeln!(out, "- Commits: {}", r.totals.commits);
    let _ = writeln!(out, "- Contributors: {}", r.unique_authors);
    let _ = writeln!(out, "- Files touched: {}", r.totals.files_touched);
    let _ = writeln!(out, "- Net lines: {}", thousands(r.net_lines));
    match &r.lifetime_source {
      LifetimeSource::Available => {}
      LifetimeSource::Unavailable { reason } | LifetimeSource::Failed { reason } => {
        let _ = writeln!(out, "- Lifetime statistics unavailable: {}", reason);
      }
    }
  }
  out.push('\n');

  let _ = writeln!(out, "## Top Contributors");
  for (i, a) in p.authors.iter().take(LISTED).enumerate() {
    let _ = writeln!(out, "\n{}. **{}** ({})", i + 1, a.display_name, a.repositories.join(", "));
    let _ = writeln!(out, "   - Commits: {}", a.commits_in_window);
    let _ = writeln!(out, "   - Lines added: {}", thousands(a.lines_added_in_window as i64));
    let _ = writeln!(out, "   - Lines removed: {}", thousands(a.lines_removed_in_window as i64));
    let _ = writeln!(out, "   - Files touched: {}", a.files_touched_in_window);
    if let Some(lifetime) = a.lifetime_commits {
      let _ = writeln!(out, "   - Lifetime commits: {}", thousands(lifetime as i64));
    }
  }

  if !p.failures.is_empty() {
    let _ = writeln!(out, "\n## Skipped Repositories");
    for f in &p.failures {
      let _ = writeln!(out, "- {}: {}", f.path, f.message);
    }
  }

  out.trim_end().to_string()
}

fn thousands(n: i64) -> String {
  let digits = n.unsigned_abs().to_string();
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }
  if n < 0 {
    format!("-{grouped}")
  } else {
    grouped
  }
}
