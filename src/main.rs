use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod collect;
mod commands;
mod config;
mod error;
mod ext;
mod gitio;
mod model;
mod payload;
mod reconcile;
mod services;
mod sources;
mod util;
mod validate;
mod window;

use crate::cli::{normalize, Cli, Command};
use crate::config::Settings;

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(ExitCode::SUCCESS);
  }

  // stdout carries payloads and previews; logs go to stderr.
  let default_filter = if cli.verbose { "git_activity_digest=debug,info" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
    .with(filter)
    .init();

  let settings = Settings::load(cli.env_file.as_deref())?;

  match cli.command {
    Some(Command::Analyze(args)) => {
      let cfg = normalize(args, &settings)?;
      commands::run_analyze(&cfg, &settings)
    }
    Some(Command::ValidateRepos(args)) => commands::run_validate_repos(&args.repos, &settings),
    Some(Command::TestSlack(args)) => commands::run_test_slack(args.channel.as_deref(), &settings),
    None => bail!("no command given; see --help"),
  }
}
