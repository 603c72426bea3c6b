//! Request Event Logger
//!
//! Structured per-request events (prompt sent, relay finished, error) written
//! through `tracing` under the `request_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestEvent {
    PromptDispatched {
        route: String,
        provider: String,
        prompt_chars: usize,
    },
    RelayFinished {
        fragments: usize,
        bytes: usize,
        client_disconnected: bool,
    },
    DocumentWritten {
        path: String,
        files: usize,
    },
    Error {
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: RequestEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redacts and serializes a request event into the tracing system.
    pub fn log_event(request_id: &str, event: RequestEvent) -> EventLogEntry {
        let entry = EventLogEntry {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event: Self::redact(event),
        };
        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "request_events", request_id = %entry.request_id, event = %json, "Request event");
        entry
    }

    fn redact(event: RequestEvent) -> RequestEvent {
        match event {
            RequestEvent::Error { error_msg } => RequestEvent::Error {
                error_msg: redact_sensitive_data(&error_msg),
            },
            other => other,
        }
    }
}
