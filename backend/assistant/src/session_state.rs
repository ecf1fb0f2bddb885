//! Per-chat dialogue state.

use std::fmt;
use std::time::Duration;

use moka::sync::Cache;

/// Where a chat currently is in the `/ia` conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    /// Session created, menu not yet shown.
    Menu,
    /// Menu shown or a free question expected.
    AwaitQuestion,
    AwaitPreferences,
    AwaitOptimizationData,
    /// Terminal: the session is dropped.
    End,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Menu => "menu",
            DialogueState::AwaitQuestion => "await_question",
            DialogueState::AwaitPreferences => "await_preferences",
            DialogueState::AwaitOptimizationData => "await_optimization_data",
            DialogueState::End => "end",
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode picked from the menu that expects further input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantMode {
    Consulta,
    Recomendacion,
    Precios,
}

/// Active state of one chat's conversation with the assistant.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub state: DialogueState,
    pub mode: Option<AssistantMode>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: DialogueState::Menu,
            mode: None,
        }
    }

    pub fn transition(mut self, state: DialogueState) -> Self {
        self.state = state;
        self
    }

    pub fn with_mode(mut self, mode: AssistantMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Sessions keyed by chat identity. Entries idle longer than the configured
/// duration expire, so abandoned conversations do not linger.
pub struct SessionStore {
    sessions: Cache<String, Session>,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Cache::builder().time_to_idle(idle_timeout).build(),
        }
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id)
    }

    /// Store the session, or drop it once it reached `End`.
    pub fn save(&self, session: Session) {
        if session.state == DialogueState::End {
            self.remove(&session.session_id);
        } else {
            self.sessions.insert(session.session_id.clone(), session);
        }
    }

    pub fn remove(&self, session_id: &str) {
        self.sessions.invalidate(session_id);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }
}
