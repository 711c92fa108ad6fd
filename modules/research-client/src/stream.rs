//! Event-stream plumbing: newline-bounded buffering and payload
//! decoding.
//!
//! The upstream framing is `text/event-stream` in shape, but the agent's
//! event vocabulary was reverse-engineered from observed payloads rather
//! than a published contract, so decoding is deliberately tolerant:
//! anything unrecognized is skipped, only an explicit error event is
//! terminal.

use regex::Regex;
use tracing::debug;

/// Sentinel that terminates the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Accumulates raw chunks and yields complete lines. A trailing partial
/// line is held back until more data arrives, since a truncated line must
/// never reach the JSON decoder.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk, returning every line completed by it.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buf.push_str(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line = self.buf[..pos].trim_end_matches('\r').to_string();
            self.buf.drain(..=pos);
            lines.push(line);
        }
        lines
    }

    /// Whatever is left after the stream closed without a final newline.
    pub fn remainder(&self) -> Option<&str> {
        let rest = self.buf.trim();
        (!rest.is_empty()).then_some(rest)
    }
}

/// One decoded stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Full assistant content. The agent resends the complete message on
    /// every delta, so each of these REPLACES the running answer.
    Message(String),
    /// Terminal failure reported by the agent.
    Error(String),
    /// End-of-stream sentinel.
    Done,
    /// Keep-alive, unknown shape, or non-JSON payload. Skipped.
    Ignored,
}

/// Decode one complete line from the stream.
pub fn decode_line(line: &str) -> StreamEvent {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return StreamEvent::Ignored;
    }

    let Some(payload) = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))
    else {
        return StreamEvent::Ignored;
    };
    let payload = payload.trim();

    if payload == DONE_SENTINEL {
        return StreamEvent::Done;
    }

    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "stream: skipping non-JSON line");
            return StreamEvent::Ignored;
        }
    };

    if let Some(error) = value
        .get("error")
        .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(|m| m.as_str())))
    {
        return StreamEvent::Error(error.to_string());
    }
    if value.get("type").and_then(|t| t.as_str()) == Some("error") {
        return StreamEvent::Error(value.to_string());
    }

    // Assistant message content, either at the top level or nested under
    // a message object.
    let role = value
        .get("role")
        .or_else(|| value.get("message").and_then(|m| m.get("role")))
        .and_then(|r| r.as_str());
    if matches!(role, Some(r) if r != "assistant") {
        return StreamEvent::Ignored;
    }

    let content = value
        .get("content")
        .or_else(|| value.get("message").and_then(|m| m.get("content")))
        .and_then(|c| c.as_str());

    match content {
        Some(c) if !c.trim().is_empty() => StreamEvent::Message(c.to_string()),
        _ => StreamEvent::Ignored,
    }
}

/// Find a fenced JSON object inside assistant content. Preferred over
/// the raw text when present.
pub fn extract_fenced_json(content: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid regex");
    re.captures(content).map(|c| c[1].to_string())
}
