//! Dialogue Event Logger
//!
//! Structured events (state transitions, model calls, errors) emitted through
//! `tracing` on the `dialogue_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum DialogueLogEvent {
    Transition {
        trigger: String,
        from: Option<String>,
        to: String,
    },
    ModelCall {
        use_case: String,
    },
    Error {
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: DialogueLogEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Logs a dialogue event, redacting free text first.
    pub fn log_event(session_id: &str, mut event: DialogueLogEvent) {
        if let DialogueLogEvent::Error { error_msg } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }

        let entry = EventLogEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        };

        info!(target: "dialogue_events", event = ?entry, "Dialogue event");
    }

    pub fn transition(session_id: &str, trigger: &str, from: Option<&str>, to: &str) {
        Self::log_event(
            session_id,
            DialogueLogEvent::Transition {
                trigger: trigger.to_string(),
                from: from.map(str::to_string),
                to: to.to_string(),
            },
        );
    }

    pub fn model_call(session_id: &str, use_case: &str) {
        Self::log_event(
            session_id,
            DialogueLogEvent::ModelCall {
                use_case: use_case.to_string(),
            },
        );
    }

    pub fn error(session_id: &str, error_msg: impl Into<String>) {
        Self::log_event(
            session_id,
            DialogueLogEvent::Error {
                error_msg: error_msg.into(),
            },
        );
    }
}
