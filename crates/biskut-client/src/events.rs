//! Grading progress events
//!
//! The submit endpoint answers with a Server-Sent-Events body:
//!
//! ```text
//! data: {"pushed": true}
//!
//! data: {"start": true}
//!
//! data: {"status": "success", "output": "Compiled successfully"}
//!
//! data: {"passed": [...], "failed": [...], "time": 41, "status": "success", "end": true}
//! ```
//!
//! [`SseDecoder`] turns raw body chunks into event payloads and
//! [`GradingEvent::parse`] classifies each payload.

use serde_json::Value;

/// What stage of grading an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Submission queued for a worker
    Queued,
    /// A worker picked the submission up
    Started,
    /// Compilation finished (successfully or not)
    Compiled,
    /// Test cases ran
    Completed,
    /// Anything else
    Unknown,
}

/// One decoded grading event.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingEvent {
    /// Classification
    pub kind: EventKind,
    /// Payload; a JSON string value when the payload was not JSON
    pub payload: Value,
    /// Server marked this as the last event
    pub end: bool,
}

impl GradingEvent {
    /// Classify one `data:` payload.
    pub fn parse(data: &str) -> Self {
        let data = data.trim();
        match serde_json::from_str::<Value>(data) {
            Ok(Value::Object(map)) => {
                let kind = if map.contains_key("passed") {
                    EventKind::Completed
                } else if map.contains_key("pushed") {
                    EventKind::Queued
                } else if map.contains_key("start") {
                    EventKind::Started
                } else if map.contains_key("status") {
                    EventKind::Compiled
                } else {
                    EventKind::Unknown
                };
                let end = map.get("end").and_then(Value::as_bool).unwrap_or(false);
                Self {
                    kind,
                    payload: Value::Object(map),
                    end,
                }
            }
            _ => Self {
                kind: classify_text(data),
                payload: Value::String(data.to_string()),
                end: false,
            },
        }
    }

    /// `status` field, if present.
    pub fn status(&self) -> Option<&str> {
        self.payload.get("status").and_then(Value::as_str)
    }

    /// `output` field rendered as text, if present.
    pub fn output(&self) -> Option<String> {
        match self.payload.get("output")? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Passed test cases of a `Completed` event.
    pub fn passed(&self) -> &[Value] {
        self.array("passed")
    }

    /// Failed test cases of a `Completed` event.
    pub fn failed(&self) -> &[Value] {
        self.array("failed")
    }

    /// Total grading time in milliseconds, if reported.
    pub fn time_ms(&self) -> Option<u64> {
        self.payload.get("time").and_then(Value::as_u64)
    }

    fn array(&self, key: &str) -> &[Value] {
        self.payload
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Substring classification for payloads that are not JSON objects.
fn classify_text(data: &str) -> EventKind {
    if data.contains("pushed") {
        EventKind::Queued
    } else if data.contains("start") {
        EventKind::Started
    } else if data.contains("status") {
        EventKind::Compiled
    } else if data.contains("passed") {
        EventKind::Completed
    } else {
        EventKind::Unknown
    }
}

/// Incremental Server-Sent-Events decoder.
///
/// Feed arbitrary body chunks with [`push`](Self::push); complete event
/// payloads come out in order. Consecutive `data:` lines of one event are
/// joined with `\n`; an event is dispatched on a blank line.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// New empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning the payloads it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let line = std::mem::take(&mut self.line);
                self.process_line(&line, &mut out);
            } else {
                self.line.push(byte);
            }
        }
        out
    }

    /// Flush whatever is buffered once the body has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.line.is_empty() {
            let line = std::mem::take(&mut self.line);
            self.process_line(&line, &mut out);
        }
        self.dispatch(&mut out);
        out
    }

    fn process_line(&mut self, raw: &[u8], out: &mut Vec<String>) {
        let line = String::from_utf8_lossy(raw);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.is_empty() {
            self.dispatch(out);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.data.push(value.to_string());
        }
    }

    fn dispatch(&mut self, out: &mut Vec<String>) {
        if !self.data.is_empty() {
            out.push(self.data.join("\n"));
            self.data.clear();
        }
    }
}
