use anyhow::{bail, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;
use crate::window::{window_spec, WindowSpec};

#[derive(Parser, Debug)]
#[command(
    name = "git-activity-digest",
    version,
    about = "Collect per-author Git activity across repositories and deliver a written digest",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Option<Command>,

  /// Env file with credentials and defaults (default: ./.env when present)
  #[arg(long, global = true)]
  pub env_file: Option<PathBuf>,

  /// Debug-level logging for this tool (RUST_LOG still takes precedence)
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Collect statistics, generate the report, and deliver it
  Analyze(AnalyzeArgs),
  /// Check that each path is a Git working repository
  ValidateRepos(ValidateArgs),
  /// Verify Slack credentials without sending a report
  TestSlack(TestSlackArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
  /// Repository path (repeatable)
  #[arg(short = 'r', long = "repo", required = true)]
  pub repos: Vec<PathBuf>,

  /// Days back from now (default: TIME_WINDOW_DAYS)
  #[arg(short, long)]
  pub days: Option<u32>,

  /// First day of the window, YYYY-MM-DD; requires --end-date
  #[arg(long)]
  pub start_date: Option<NaiveDate>,

  /// Last day of the window (inclusive), YYYY-MM-DD; requires --start-date
  #[arg(long)]
  pub end_date: Option<NaiveDate>,

  /// Slack channel (default: SLACK_CHANNEL)
  #[arg(long)]
  pub channel: Option<String>,

  /// Print a preview instead of delivering
  #[arg(long)]
  pub dry_run: bool,

  /// Also write the full report text to this file
  #[arg(long)]
  pub save_report: Option<PathBuf>,

  /// Write the JSON payload to this file ("-" for stdout)
  #[arg(long)]
  pub payload_out: Option<String>,

  /// Render a plain summary locally instead of calling the text-generation service
  #[arg(long)]
  pub offline: bool,

  /// Timezone for rendered timestamps: local, utc, or an IANA name
  #[arg(long, default_value = "local")]
  pub tz: String,

  /// Override the "now" instant (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
  /// Repository path (repeatable)
  #[arg(short = 'r', long = "repo", required = true)]
  pub repos: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TestSlackArgs {
  /// Channel used for the webhook test message (default: SLACK_CHANNEL)
  #[arg(long)]
  pub channel: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
  /// As given on the command line; validation reports these verbatim.
  pub repos: Vec<String>,
  pub window: WindowSpec,
  pub channel: Option<String>,
  pub dry_run: bool,
  pub save_report: Option<PathBuf>,
  pub payload_out: Option<String>,
  pub offline: bool,
  pub tz: String,
  pub now_override: Option<String>,
}

pub fn normalize(args: AnalyzeArgs, settings: &Settings) -> Result<EffectiveConfig> {
  let window = match (args.days, args.start_date, args.end_date) {
    (None, None, None) => WindowSpec::Days { days: settings.time_window_days },
    (days, start, end) => window_spec(days, start, end)?,
  };

  let tz = args.tz.trim().to_string();
  let known = tz.eq_ignore_ascii_case("local") || tz.eq_ignore_ascii_case("utc") || tz.parse::<Tz>().is_ok();
  if !known {
    bail!("unknown timezone {:?}: use local, utc, or an IANA name such as Europe/Berlin", tz);
  }

  Ok(EffectiveConfig {
    repos: args.repos.iter().map(|p| p.to_string_lossy().to_string()).collect(),
    window,
    channel: args.channel,
    dry_run: args.dry_run,
    save_report: args.save_report,
    payload_out: args.payload_out,
    offline: args.offline,
    tz,
    now_override: args.now_override,
  })
}
