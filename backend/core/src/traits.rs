use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Dataset, Record};

/// Trait for text-generation backends used by the model gateway.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai", "mock").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    /// Empty means no system message is sent.
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// Read-only access to the business ledgers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows of a dataset, oldest first.
    async fn get_all_records(&self, dataset: Dataset) -> Result<Vec<Record>>;
}

/// An inline button shown under a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// Opaque payload delivered back as a callback event.
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Outbound side of the chat, scoped to the chat (and pressed message) of one event.
///
/// `formatted` asks the transport to render the text as Markdown.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    async fn send_text(&self, text: &str, formatted: bool) -> Result<()>;

    /// Buttons are laid out one per row.
    async fn send_text_with_buttons(&self, text: &str, buttons: &[Button], formatted: bool)
        -> Result<()>;

    /// Replace the text of the message whose button triggered the current event.
    async fn edit_message(&self, text: &str, formatted: bool) -> Result<()>;
}
