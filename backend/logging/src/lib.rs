//! Structured logging for Cafetal.
//!
//! Handles subscriber setup with a rolling JSON file, secret redaction, and
//! the dialogue event log.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{DialogueLogEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::{mask_secret, redact_sensitive_data};
