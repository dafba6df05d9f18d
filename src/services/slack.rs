// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Deliver finished reports to Slack (bot token via Web API, or incoming webhook) and verify connectivity
// role: services/delivery
// inputs: DeliveryTarget and channel from Settings; report title and markdown text
// outputs: Messages posted to the channel
// side_effects: HTTPS POSTs to Slack
// invariants:
// - Bot token is preferred over webhook
// - Messages never exceed MESSAGE_LIMIT characters; long reports go out as title + section chunks
// - A Web API reply with ok=false is a failure even on HTTP 200
// errors: ExternalService for transport, HTTP, or API-level failures
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use serde_json::json;

use crate::config::{DeliveryTarget, Settings};
use crate::error::{DigestError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::services::ReportSink;

const SERVICE: &str = "slack";
pub const MESSAGE_LIMIT: usize = 4000;
const SLACK_API: &str = "https://slack.com/api";

pub struct SlackSink {
  target: DeliveryTarget,
  channel: String,
  api_base: String,
  agent: ureq::Agent,
}

impl SlackSink {
  pub fn new(settings: &Settings, channel_override: Option<&str>) -> Result<Self> {
    Ok(Self {
      target: settings.delivery_target()?,
      channel: channel_override.unwrap_or(&settings.slack_channel).to_string(),
      api_base: SLACK_API.to_string(),
      agent: ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(30)))
        .build()
        .new_agent(),
    })
  }

  #[cfg(test)]
  fn with_api_base(mut self, base: &str) -> Self {
    self.api_base = base.trim_end_matches('/').to_string();
    self
  }

  pub fn channel(&self) -> &str {
    &self.channel
  }

  fn post(&self, url: &str, bearer: Option<&str>, body: &serde_json::Value) -> Result<serde_json::Value> {
    let mut req = self.agent.post(url);
    if let Some(token) = bearer {
      req = req.header("Authorization", &format!("Bearer {}", token));
    }

    let response = req.send_json(body).map_err(|e| DigestError::service(SERVICE, e.to_string()))?;
    let status = response.status().as_u16();
    let text = response.into_body().read_to_string().unwrap_or_default();
    if status >= 300 {
      return Err(DigestError::service(SERVICE, format!("HTTP {}: {}", status, text.trim())));
    }

    // Webhooks answer with plain "ok"; the Web API answers with JSON.
    Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::Null))
  }

  fn api_call(&self, token: &str, method: &str, body: serde_json::Value) -> Result<serde_json::Value> {
    let url = format!("{}/{}", self.api_base, method);
    let reply = self.post(&url, Some(token), &body)?;
    if reply.fetch("ok").to::<bool>() != Some(true) {
      let error = reply.fetch("error").text().unwrap_or_else(|| "unknown_error".to_string());
      return Err(DigestError::service(SERVICE, format!("{method}: {error}")));
    }
    Ok(reply)
  }

  fn post_message(&self, token: &str, text: &str) -> Result<()> {
    self.api_call(token, "chat.postMessage", json!({ "channel": self.channel, "text": text, "mrkdwn": true }))?;
    Ok(())
  }
}

impl ReportSink for SlackSink {
  fn deliver(&self, title: &str, report: &str) -> Result<()> {
    let headed = format!("*{}*\n\n{}", title, report);

    match &self.target {
      DeliveryTarget::BotToken(token) => {
        if headed.chars().count() <= MESSAGE_LIMIT {
          self.post_message(token, &headed)?;
          tracing::info!(channel = %self.channel, "report delivered");
          return Ok(());
        }

        self.post_message(token, &format!("*{}*", title))?;
        let parts = split_report_by_sections(report, MESSAGE_LIMIT);
        for part in &parts {
          self.post_message(token, part)?;
        }
        tracing::info!(channel = %self.channel, parts = parts.len(), "long report delivered in parts");
        Ok(())
      }
      DeliveryTarget::Webhook(url) => {
        self.post(url, None, &json!({ "text": headed, "mrkdwn": true, "channel": self.channel }))?;
        tracing::info!(channel = %self.channel, "report delivered via webhook");
        Ok(())
      }
    }
  }

  fn check_connection(&self) -> Result<String> {
    match &self.target {
      DeliveryTarget::BotToken(token) => {
        let reply = self.api_call(token, "auth.test", json!({}))?;
        let user = reply.fetch("user").text().unwrap_or_else(|| "unknown".to_string());
        let team = reply.fetch("team").text();
        Ok(match team {
          Some(team) => format!("bot user {} in workspace {}", user, team),
          None => format!("bot user {}", user),
        })
      }
      DeliveryTarget::Webhook(url) => {
        self.post(url, None, &json!({ "text": "git-activity-digest connection test", "channel": self.channel }))?;
        Ok("incoming webhook".to_string())
      }
    }
  }
}

/// Split `report` into chunks of at most `max_chars` characters on line boundaries.
///
/// Once a chunk is past 70% of the limit, a `##` heading starts the next chunk.
/// Single lines longer than the limit are cut at character boundaries.
pub fn split_report_by_sections(report: &str, max_chars: usize) -> Vec<String> {
  let max_chars = max_chars.max(1);
  let soft_limit = max_chars * 7 / 10;
  let mut sections = Vec::new();
  let mut current = String::new();
  let mut current_len = 0usize;

  let mut flush = |current: &mut String, current_len: &mut usize| {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
      sections.push(trimmed.to_string());
    }
    current.clear();
    *current_len = 0;
  };

  for line in report.split('\n') {
    if line.starts_with("##") && current_len > soft_limit {
      flush(&mut current, &mut current_len);
    }

    for piece in chunk_line(line, max_chars) {
      let piece_len = piece.chars().count();
      if current_len > 0 && current_len + piece_len + 1 > max_chars {
        flush(&mut current, &mut current_len);
      }
      if current_len > 0 {
        current.push('\n');
        current_len += 1;
      }
      current.push_str(piece);
      current_len += piece_len;
    }
  }
  flush(&mut current, &mut current_len);

  sections
}

fn chunk_line(line: &str, max_chars: usize) -> Vec<&str> {
  let mut pieces = Vec::new();
  let mut start = 0;
  for (count, (idx, _)) in line.char_indices().enumerate() {
    if count > 0 && count % max_chars == 0 {
      pieces.push(&line[start..idx]);
      start = idx;
    }
  }
  pieces.push(&line[start..]);
  pieces
}
