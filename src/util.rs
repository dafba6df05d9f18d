// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, subprocesses with deadlines, timezone-aware timestamp rendering, and man page rendering
// role: utilities/helpers
// inputs: Various primitives; DateTime; paths; clap CommandFactory
// outputs: Canonicalized paths, captured process output, formatted timestamps, man page text
// side_effects: run_with_timeout/run_git spawn subprocesses (killed on deadline)
// invariants:
// - run_with_timeout never blocks past its deadline plus one poll interval, output reads included
// - stdout/stderr are drained concurrently so a chatty child cannot deadlock on a full pipe
// - iso_in_tz falls back to UTC for unknown zone names
// errors: RunError distinguishes missing program, timeout, and IO failures
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use clap::CommandFactory;
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let p = p.as_ref();
  let pb: PathBuf = match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  };
  pb.to_string_lossy().to_string()
}

/// Last path component, used as the human-facing repository name.
pub fn repo_name(path: &str) -> String {
  Path::new(path)
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_else(|| path.to_string())
}

#[derive(Debug)]
pub struct ProcessOutput {
  pub status: ExitStatus,
  pub stdout: String,
  pub stderr: String,
}

#[derive(Error, Debug)]
pub enum RunError {
  #[error("{0} not found on PATH")]
  NotFound(String),
  #[error("timed out after {}s", .0.as_secs())]
  TimedOut(Duration),
  #[error("{0}")]
  Io(#[from] std::io::Error),
}

/// Run `program` in `cwd`, capturing output. `timeout == None` waits indefinitely.
pub fn run_with_timeout(
  program: &str,
  args: &[String],
  cwd: &Path,
  timeout: Option<Duration>,
) -> Result<ProcessOutput, RunError> {
  tracing::debug!(program, ?args, cwd = %cwd.display(), "spawning");

  let mut child = match Command::new(program)
    .args(args)
    .current_dir(cwd)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
  {
    Ok(child) => child,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(RunError::NotFound(program.to_string())),
    Err(e) => return Err(RunError::Io(e)),
  };

  let stdout_reader = drain(child.stdout.take());
  let stderr_reader = drain(child.stderr.take());
  let started = Instant::now();

  let status = match timeout {
    None => child.wait()?,
    Some(limit) => {
      loop {
        if let Some(status) = child.try_wait()? {
          break status;
        }
        if started.elapsed() >= limit {
          let _ = child.kill();
          let _ = child.wait();
          tracing::warn!(program, secs = limit.as_secs(), "process killed after deadline");
          return Err(RunError::TimedOut(limit));
        }
        thread::sleep(POLL_INTERVAL);
      }
    }
  };

  // Descendants can keep the pipes open after the child exits; reads share the deadline.
  let deadline = timeout.map(|limit| (started + limit, limit));
  let stdout = collect(&stdout_reader, deadline)?;
  let stderr = collect(&stderr_reader, deadline)?;

  Ok(ProcessOutput {
    status,
    stdout: String::from_utf8_lossy(&stdout).to_string(),
    stderr: String::from_utf8_lossy(&stderr).to_string(),
  })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
  let (tx, rx) = mpsc::channel();
  thread::spawn(move || {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
      let _ = pipe.read_to_end(&mut buf);
    }
    let _ = tx.send(buf);
  });
  rx
}

fn collect(reader: &mpsc::Receiver<Vec<u8>>, deadline: Option<(Instant, Duration)>) -> Result<Vec<u8>, RunError> {
  match deadline {
    None => Ok(reader.recv().unwrap_or_default()),
    Some((at, limit)) => match reader.recv_timeout(at.saturating_duration_since(Instant::now())) {
      Ok(buf) => Ok(buf),
      Err(mpsc::RecvTimeoutError::Disconnected) => Ok(Vec::new()),
      Err(mpsc::RecvTimeoutError::Timeout) => {
        tracing::warn!(secs = limit.as_secs(), "output still open at deadline");
        Err(RunError::TimedOut(limit))
      }
    },
  }
}

/// Run git in `repo`; non-zero exit becomes an error carrying stderr.
pub fn run_git(repo: &str, args: &[String], timeout: Option<Duration>) -> anyhow::Result<String> {
  let out = run_with_timeout("git", args, Path::new(repo), timeout)
    .map_err(|e| anyhow::anyhow!("git {:?}: {}", args, e))?;

  if out.status.success() {
    Ok(out.stdout)
  } else {
    anyhow::bail!("git {:?} failed: {}", args, out.stderr.trim())
  }
}

/// Formats an instant as RFC3339 in the named timezone ("local", "utc", or an IANA zone).
pub fn iso_in_tz(at: &DateTime<Utc>, tz: &str) -> String {
  if tz.eq_ignore_ascii_case("local") {
    return at.with_timezone(&Local).to_rfc3339_opts(SecondsFormat::Secs, true);
  }

  if tz.eq_ignore_ascii_case("utc") {
    return at.to_rfc3339_opts(SecondsFormat::Secs, true);
  }

  match tz.parse::<Tz>() {
    Ok(zone) => zone
      .from_utc_datetime(&at.naive_utc())
      .to_rfc3339_opts(SecondsFormat::Secs, true),
    Err(_) => at.to_rfc3339_opts(SecondsFormat::Secs, true),
  }
}

/// Returns the effective "now" given an optional override.
pub fn effective_now(override_now: Option<DateTime<Local>>) -> DateTime<Local> {
  override_now.unwrap_or_else(Local::now)
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
