// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve a relative day count or an explicit calendar-date pair into one canonical half-open TimeWindow
// role: windowing
// inputs: --days or (--start-date, --end-date); the effective "now" (overridable for tests)
// outputs: TimeWindow { start, end } in local time, microsecond precision
// invariants:
// - start < end, enforced by TimeWindow::new
// - Days form: end - start == days * 24h exactly
// - Dates form: start = start_date 00:00, end = end_date 00:00 + 24h (end date inclusive as a calendar day)
// errors: Configuration when both/neither forms are given, days is 0 or out of range, or start_date >= end_date
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Timelike, Utc};

use crate::error::{DigestError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
  start: DateTime<Local>,
  end: DateTime<Local>,
}

impl TimeWindow {
  pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Result<Self> {
    if start >= end {
      return Err(DigestError::config(format!(
        "window start {} is not before end {}",
        start.to_rfc3339(),
        end.to_rfc3339()
      )));
    }
    Ok(Self { start, end })
  }

  pub fn start(&self) -> DateTime<Local> {
    self.start
  }

  pub fn end(&self) -> DateTime<Local> {
    self.end
  }

  /// Half-open membership: `start <= at < end`.
  pub fn contains(&self, at: &DateTime<Utc>) -> bool {
    let at = at.with_timezone(&Local);
    self.start <= at && at < self.end
  }

  /// Whole days, rounded so a DST shift inside the window does not lose a day.
  pub fn duration_days(&self) -> i64 {
    ((self.end - self.start).num_minutes() + 720).div_euclid(1440)
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WindowSpec {
  Days { days: u32 },
  Dates { start: NaiveDate, end: NaiveDate },
}

/// Pick exactly one window form from the raw inputs.
pub fn window_spec(days: Option<u32>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<WindowSpec> {
  match (days, start, end) {
    (Some(days), None, None) => Ok(WindowSpec::Days { days }),
    (None, Some(start), Some(end)) => Ok(WindowSpec::Dates { start, end }),
    (None, None, None) => Err(DigestError::config("provide either a day count or both --start-date and --end-date")),
    (None, _, _) => Err(DigestError::config("--start-date and --end-date must be given together")),
    (Some(_), _, _) => Err(DigestError::config("ambiguous window: choose a day count or explicit dates, not both")),
  }
}

pub fn resolve_window(spec: &WindowSpec, now: DateTime<Local>) -> Result<TimeWindow> {
  match spec {
    WindowSpec::Days { days } => {
      if *days == 0 {
        return Err(DigestError::config("day count must be positive"));
      }
      let end = truncate_to_micros(now);
      let start = Duration::try_days(i64::from(*days))
        .and_then(|span| end.checked_sub_signed(span))
        .ok_or_else(|| DigestError::config(format!("day count {days} is out of range")))?;
      TimeWindow::new(start, end)
    }
    WindowSpec::Dates { start, end } => {
      if start >= end {
        return Err(DigestError::config(format!("start date {start} must be before end date {end}")));
      }
      let since = local_midnight(*start)?;
      let until = local_midnight(*end)? + Duration::hours(24);
      TimeWindow::new(since, until)
    }
  }
}

fn local_midnight(date: NaiveDate) -> Result<DateTime<Local>> {
  date
    .and_time(NaiveTime::MIN)
    .and_local_timezone(Local)
    .earliest()
    .ok_or_else(|| DigestError::config(format!("midnight of {date} does not exist in the local timezone")))
}

fn truncate_to_micros(dt: DateTime<Local>) -> DateTime<Local> {
  let micros = dt.nanosecond() / 1_000;
  dt.with_nanosecond(micros * 1_000).unwrap_or(dt)
}

/// Parse a `--now-override` string into a local DateTime.
/// Accepts RFC3339 (e.g. 2025-08-15T12:00:00Z) or a naive local timestamp
/// formatted as `%Y-%m-%dT%H:%M:%S`.
pub fn parse_now_override(s: Option<&str>) -> Option<DateTime<Local>> {
  s.and_then(|raw| {
    DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.with_timezone(&Local))
      .or_else(|| {
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
          .ok()
          .and_then(|ndt| ndt.and_local_timezone(Local).single())
      })
  })
}
