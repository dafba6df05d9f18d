// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Build the immutable per-run Settings from defaults, an optional env file, and the process environment
// role: configuration
// inputs: Optional env file path; process environment (OPENAI_API_KEY, LLM_MODEL, SLACK_*, TIME_WINDOW_DAYS, GITINSPECTOR_*, SOURCE_TIMEOUT_SECS)
// outputs: Settings, passed by reference to every adapter at construction
// invariants:
// - Process environment wins over env-file values; empty values count as unset
// - Credentials are checked per operation (llm_api_key, delivery_target), not at load time
// errors: Configuration for malformed numbers/booleans and missing required credentials
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{DigestError, Result};

pub const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub openai_api_key: Option<String>,
  pub llm_model: String,
  pub llm_api_url: String,
  pub slack_token: Option<String>,
  pub slack_webhook_url: Option<String>,
  pub slack_channel: String,
  pub time_window_days: u32,
  /// Bulk statistics tool (gitinspector-compatible) executable.
  pub bulk_tool: String,
  pub bulk_tool_scope_to_window: bool,
  /// Per-invocation deadline for both statistics sources; None waits forever.
  pub source_timeout: Option<Duration>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      openai_api_key: None,
      llm_model: "gpt-4".to_string(),
      llm_api_url: DEFAULT_LLM_API_URL.to_string(),
      slack_token: None,
      slack_webhook_url: None,
      slack_channel: "#general".to_string(),
      time_window_days: 7,
      bulk_tool: "gitinspector".to_string(),
      bulk_tool_scope_to_window: false,
      source_timeout: Some(Duration::from_secs(300)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
  BotToken(String),
  Webhook(String),
}

impl Settings {
  /// Load from `env_file` (or `./.env` if present) layered under the process environment.
  pub fn load(env_file: Option<&Path>) -> Result<Self> {
    let file_vars = match env_file {
      Some(path) => read_env_file(path)?,
      None => {
        let default = Path::new(".env");
        if default.is_file() {
          read_env_file(default)?
        } else {
          HashMap::new()
        }
      }
    };

    Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
  }

  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let defaults = Settings::default();

    let time_window_days = match get("TIME_WINDOW_DAYS") {
      Some(raw) => parse_number::<u32>("TIME_WINDOW_DAYS", &raw)?,
      None => defaults.time_window_days,
    };
    if time_window_days == 0 {
      return Err(DigestError::config("TIME_WINDOW_DAYS must be positive"));
    }

    let source_timeout = match get("SOURCE_TIMEOUT_SECS") {
      Some(raw) => match parse_number::<u64>("SOURCE_TIMEOUT_SECS", &raw)? {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
      },
      None => defaults.source_timeout,
    };

    let bulk_tool_scope_to_window = match get("GITINSPECTOR_SCOPE_TO_WINDOW") {
      Some(raw) => parse_bool("GITINSPECTOR_SCOPE_TO_WINDOW", &raw)?,
      None => defaults.bulk_tool_scope_to_window,
    };

    Ok(Settings {
      openai_api_key: get("OPENAI_API_KEY"),
      llm_model: get("LLM_MODEL").unwrap_or(defaults.llm_model),
      llm_api_url: get("LLM_API_URL").unwrap_or(defaults.llm_api_url),
      slack_token: get("SLACK_TOKEN"),
      slack_webhook_url: get("SLACK_WEBHOOK_URL"),
      slack_channel: get("SLACK_CHANNEL").unwrap_or(defaults.slack_channel),
      time_window_days,
      bulk_tool: get("GITINSPECTOR_PATH").unwrap_or(defaults.bulk_tool),
      bulk_tool_scope_to_window,
      source_timeout,
    })
  }

  pub fn llm_api_key(&self) -> Result<&str> {
    self
      .openai_api_key
      .as_deref()
      .ok_or_else(|| DigestError::config("OPENAI_API_KEY is required to generate the report (or use --offline)"))
  }

  /// Bot token is preferred over the webhook when both are configured.
  pub fn delivery_target(&self) -> Result<DeliveryTarget> {
    match (&self.slack_token, &self.slack_webhook_url) {
      (Some(token), _) => Ok(DeliveryTarget::BotToken(token.clone())),
      (None, Some(url)) => Ok(DeliveryTarget::Webhook(url.clone())),
      (None, None) => Err(DigestError::config("either SLACK_TOKEN or SLACK_WEBHOOK_URL must be set")),
    }
  }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
  let iter = dotenvy::from_path_iter(path)
    .map_err(|e| DigestError::config(format!("cannot read env file {}: {}", path.display(), e)))?;

  let mut vars = HashMap::new();
  for item in iter {
    let (key, value) =
      item.map_err(|e| DigestError::config(format!("malformed env file {}: {}", path.display(), e)))?;
    vars.insert(key, value);
  }
  tracing::debug!(path = %path.display(), keys = vars.len(), "env file loaded");
  Ok(vars)
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
  raw
    .parse::<T>()
    .map_err(|_| DigestError::config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
  match raw.to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "0" | "false" | "no" | "off" => Ok(false),
    _ => Err(DigestError::config(format!("{key} must be a boolean, got {raw:?}"))),
  }
}
