//! Structured logging for CodeDoc.
//!
//! Console output, rolling NDJSON files, secret redaction and per-request events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, RequestEvent};
pub use logger::{LogGuard, init_logger};
pub use redact::redact_sensitive_data;
