// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed error taxonomy shared by the window resolver, statistics sources and external services
// role: errors
// outputs: DigestError variants and the crate-local Result alias
// invariants:
// - Configuration and ExternalService are run-fatal; ToolUnavailable/Parse/HistoryRead are per-repository
// - Display strings name the tool/repository/service involved
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DigestError>;

#[derive(Error, Debug)]
pub enum DigestError {
  #[error("configuration error: {0}")]
  Configuration(String),
  #[error("{tool} unavailable: {reason}")]
  ToolUnavailable { tool: String, reason: String },
  #[error("could not parse {tool} output: {reason}")]
  Parse { tool: String, reason: String },
  #[error("failed to read history of {repo}: {reason}")]
  HistoryRead { repo: String, reason: String },
  #[error("{service} request failed: {reason}")]
  ExternalService { service: String, reason: String },
  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),
}

impl DigestError {
  pub fn config(msg: impl Into<String>) -> Self {
    DigestError::Configuration(msg.into())
  }

  pub fn service(service: &str, reason: impl Into<String>) -> Self {
    DigestError::ExternalService { service: service.to_string(), reason: reason.into() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn constructors_pick_the_variant() {
    assert!(matches!(DigestError::config("missing key"), DigestError::Configuration(_)));
    let e = DigestError::service("slack", "HTTP 401");
    assert_eq!(e.to_string(), "slack request failed: HTTP 401");
  }

  #[test]
  fn display_names_the_subject() {
    let e = DigestError::Parse { tool: "gitinspector".into(), reason: "bad table".into() };
    assert_eq!(e.to_string(), "could not parse gitinspector output: bad table");
  }
}
