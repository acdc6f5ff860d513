//! The Event type published by any Worker (Apply, Resume, Cover Letter).
//! §3 / §4.2-§4.5 of SPEC_FULL.md.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Event identifier: `evt_<ULID>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    pub fn new() -> Self {
        Self(format!("evt_{}", Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// Event type. Exact variant set per SPEC_FULL.md §3, recovered verbatim
/// from `apply_engine/events.py::ApplyEventType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Progress,
    AwaitingConfirm,
    Confirmed,
    Captcha,
    Error,
    Done,
    /// Keepalive only. Never appears in a Session queue; the Stream
    /// Adapter synthesizes it directly on the wire. See `EventType::is_queueable`.
    Ping,
}

impl EventType {
    /// `true` for every variant except `Ping`, which is synthesized by the
    /// Stream Adapter and must never be enqueued onto a Session. §3 invariant.
    pub fn is_queueable(self) -> bool {
        !matches!(self, EventType::Ping)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EventType::Done)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Progress => "progress",
            EventType::AwaitingConfirm => "awaiting_confirm",
            EventType::Confirmed => "confirmed",
            EventType::Captcha => "captcha",
            EventType::Error => "error",
            EventType::Done => "done",
            EventType::Ping => "ping",
        }
    }
}

/// The unit published by any Worker. §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub job_key: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields_filled: HashMap<String, String>,
}

impl Event {
    fn new(job_key: impl Into<String>, event_type: EventType, message: impl Into<String>) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            job_key: job_key.into(),
            message: message.into(),
            html: None,
            screenshot_path: None,
            fields_filled: HashMap::new(),
        }
    }

    pub fn progress(job_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(job_key, EventType::Progress, message)
    }

    pub fn awaiting_confirm(job_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(job_key, EventType::AwaitingConfirm, message)
    }

    pub fn confirmed(job_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(job_key, EventType::Confirmed, message)
    }

    pub fn captcha(job_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(job_key, EventType::Captcha, message)
    }

    pub fn error(job_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(job_key, EventType::Error, message)
    }

    pub fn done(job_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(job_key, EventType::Done, message)
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_screenshot(mut self, path: impl Into<String>) -> Self {
        self.screenshot_path = Some(path.into());
        self
    }

    pub fn with_fields_filled(mut self, fields: HashMap<String, String>) -> Self {
        self.fields_filled = fields;
        self
    }
}
