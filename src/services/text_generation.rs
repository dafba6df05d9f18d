// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Generate the prose report from the payload via an OpenAI-compatible chat-completions endpoint
// role: services/text-generation
// inputs: ReportPayload; api key, model and endpoint from Settings
// outputs: Markdown report text
// side_effects: One HTTPS POST per run
// invariants: Non-2xx, transport errors and missing content are ExternalService errors; never retried
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use serde::Serialize;

use crate::config::Settings;
use crate::error::{DigestError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::payload::ReportPayload;
use crate::services::ReportWriter;

const SERVICE: &str = "text generation";
const MAX_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You write engineering activity reports from Git statistics.

Write for engineers and their managers: plain, specific, and concise. Explain what the numbers say \
about the period instead of repeating them. Use markdown with `##` section headings:

## Executive Summary
## Overall Activity
## Repository Breakdown
## Contributors
## Observations

Window figures (`*_in_window`) are exact for the period. Lifetime figures cover the whole history \
and may be null when they could not be matched; never present a null as zero. Mention repositories \
listed under failures briefly.";

#[derive(Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage<'a>>,
  max_tokens: u32,
  temperature: f32,
}

pub struct ChatCompletionsWriter {
  api_url: String,
  api_key: String,
  model: String,
  agent: ureq::Agent,
}

impl ChatCompletionsWriter {
  pub fn new(settings: &Settings) -> Result<Self> {
    Ok(Self {
      api_url: settings.llm_api_url.clone(),
      api_key: settings.llm_api_key()?.to_string(),
      model: settings.llm_model.clone(),
      agent: ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(120)))
        .build()
        .new_agent(),
    })
  }
}

impl ReportWriter for ChatCompletionsWriter {
  fn write_report(&self, payload: &ReportPayload) -> Result<String> {
    let body = ChatRequest {
      model: &self.model,
      messages: vec![
        ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
        ChatMessage { role: "user", content: user_prompt(payload)? },
      ],
      max_tokens: MAX_TOKENS,
      temperature: TEMPERATURE,
    };

    tracing::info!(model = %self.model, "requesting report text");
    let response = self
      .agent
      .post(&self.api_url)
      .header("Authorization", &format!("Bearer {}", self.api_key))
      .send_json(&body)
      .map_err(|e| DigestError::service(SERVICE, e.to_string()))?;

    let status = response.status().as_u16();
    if status >= 400 {
      let text = response.into_body().read_to_string().unwrap_or_default();
      return Err(DigestError::service(SERVICE, format!("HTTP {}: {}", status, text.trim())));
    }

    let doc: serde_json::Value = response
      .into_body()
      .read_json()
      .map_err(|e| DigestError::service(SERVICE, format!("malformed response: {e}")))?;

    doc
      .fetch("choices.0.message.content")
      .text()
      .ok_or_else(|| DigestError::service(SERVICE, "response has no message content"))
  }
}

pub fn user_prompt(payload: &ReportPayload) -> Result<String> {
  let w = &payload.time_window;
  Ok(format!(
    "Write the activity report for {start} to {end} ({days} days, timestamps in {tz}).\n\n\
     Data:\n```json\n{data}\n```\n\n\
     Cover the most important findings first, then per-repository and per-contributor detail, \
     then notable patterns.",
    start = w.start,
    end = w.end,
    days = w.duration_days,
    tz = w.timezone,
    data = serde_json::to_string_pretty(payload)?,
  ))
}
