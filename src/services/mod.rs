// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Seams for the collaborators that consume the payload: prose generation and report delivery
// role: services/namespace
// outputs: ReportWriter and ReportSink traits plus HTTP-backed and offline implementations
// invariants: Failures surface as ExternalService errors; no retries at this layer
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::error::Result;
use crate::payload::ReportPayload;

pub mod slack;
pub mod summary;
pub mod text_generation;

pub use slack::SlackSink;
pub use summary::PlainSummaryWriter;
pub use text_generation::ChatCompletionsWriter;

/// Turns the structured payload into a prose report.
pub trait ReportWriter {
  fn write_report(&self, payload: &ReportPayload) -> Result<String>;
}

/// Delivers a finished report to a messaging endpoint.
pub trait ReportSink {
  fn deliver(&self, title: &str, report: &str) -> Result<()>;
  /// Returns a short description of the verified endpoint.
  fn check_connection(&self) -> Result<String>;
}
