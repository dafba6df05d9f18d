// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Run the analyze, validate-repos and test-slack commands end to end
// role: commands/orchestrator
// inputs: EffectiveConfig or repository list; Settings
// outputs: Payload/report files, stdout previews, Slack messages; process exit code
// side_effects: Spawns sources, performs HTTP calls, writes files, prints to stdout
// invariants:
// - Credentials needed by the run are checked before any collection starts
// - Text-generation and delivery failures abort the run; nothing partial is delivered
// - analyze exits non-zero when any repository failed validation
// errors: anyhow with context for IO; typed errors from collaborators converted at this boundary
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use crate::cli::EffectiveConfig;
use crate::collect::collect_all;
use crate::config::Settings;
use crate::gitio;
use crate::model::FailureKind;
use crate::payload::{build_payload, to_json};
use crate::services::{ChatCompletionsWriter, PlainSummaryWriter, ReportSink, ReportWriter, SlackSink};
use crate::sources::{GitInspectorSource, GitLogSource};
use crate::util;
use crate::validate::{validate_repository, RepoStatus};
use crate::window::{parse_now_override, resolve_window};

const PREVIEW_CHARS: usize = 500;

pub fn run_analyze(cfg: &EffectiveConfig, settings: &Settings) -> Result<ExitCode> {
  let now_opt = parse_now_override(cfg.now_override.as_deref());
  if cfg.now_override.is_some() && now_opt.is_none() {
    bail!("invalid --now-override value {:?}", cfg.now_override.as_deref().unwrap_or_default());
  }
  let window = resolve_window(&cfg.window, util::effective_now(now_opt))?;

  let writer: Box<dyn ReportWriter> = if cfg.offline {
    Box::new(PlainSummaryWriter)
  } else {
    Box::new(ChatCompletionsWriter::new(settings)?)
  };
  let sink = if cfg.dry_run { None } else { Some(SlackSink::new(settings, cfg.channel.as_deref())?) };

  tracing::info!(
    repos = cfg.repos.len(),
    start = %window.start().to_rfc3339(),
    end = %window.end().to_rfc3339(),
    "collecting"
  );
  let overall = collect_all(
    &cfg.repos,
    &window,
    &GitInspectorSource::new(settings),
    &GitLogSource::new(settings),
  );

  let payload = build_payload(&overall, &cfg.tz);
  if let Some(dest) = cfg.payload_out.as_deref() {
    let json = to_json(&payload)?;
    if dest == "-" {
      println!("{}", json);
    } else {
      write_file(Path::new(dest), &json)?;
      tracing::info!(path = dest, "payload written");
    }
  }

  let report = writer.write_report(&payload).context("generating report text")?;

  if let Some(path) = cfg.save_report.as_deref() {
    write_file(path, &report)?;
    tracing::info!(path = %path.display(), "report saved");
  }

  match &sink {
    Some(sink) => {
      let title = format!(
        "Git activity report: {} to {}",
        window.start().format("%Y-%m-%d"),
        window.end().format("%Y-%m-%d")
      );
      sink.deliver(&title, &report).context("delivering report")?;
    }
    // Keep stdout machine-readable when the payload goes there.
    None if cfg.payload_out.as_deref() != Some("-") => {
      println!("--- report preview ({} characters) ---", report.chars().count());
      println!("{}", preview(&report, PREVIEW_CHARS));
    }
    None => {}
  }

  for f in &overall.failures {
    tracing::warn!(repo = %f.path, kind = ?f.kind, "{}", f.message);
  }
  let invalid = overall
    .failures
    .iter()
    .any(|f| matches!(f.kind, FailureKind::NotFound | FailureKind::NotARepository));

  Ok(if invalid { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

pub fn run_validate_repos(repos: &[PathBuf], settings: &Settings) -> Result<ExitCode> {
  let mut all_valid = true;

  for repo in repos {
    let status = validate_repository(repo);
    if status != RepoStatus::Valid {
      all_valid = false;
      println!("FAIL {}: {}", repo.display(), status.describe());
      continue;
    }

    let path = util::canonicalize_lossy(repo);
    match gitio::commit_count(&path, settings.source_timeout) {
      Ok(count) => println!("OK   {}: {} ({} commits)", repo.display(), status.describe(), count),
      Err(e) => {
        tracing::debug!(repo = %path, error = %format!("{:#}", e), "commit count failed");
        println!("OK   {}: {} (commit count unavailable)", repo.display(), status.describe());
      }
    }
  }

  Ok(if all_valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

pub fn run_test_slack(channel: Option<&str>, settings: &Settings) -> Result<ExitCode> {
  let sink = SlackSink::new(settings, channel)?;
  let endpoint = sink.check_connection().context("Slack connection test")?;
  println!("Slack connection OK: {} (channel {})", endpoint, sink.channel());
  Ok(ExitCode::SUCCESS)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }
  std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

fn preview(text: &str, max_chars: usize) -> String {
  match text.char_indices().nth(max_chars) {
    Some((idx, _)) => format!("{}...", &text[..idx]),
    None => text.to_string(),
  }
}
