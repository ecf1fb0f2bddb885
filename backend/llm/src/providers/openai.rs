use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cafetal_core::{LlmProvider, LlmRequest, LlmResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions provider. Works against any compatible endpoint.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

fn build_messages(request: &LlmRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if !request.system_prompt.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: Some(request.system_prompt.clone()),
        });
    }
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: Some(request.user_prompt.clone()),
    });
    messages
}

/// Text of the first choice. A reply without one is a provider failure.
fn first_content(choices: Vec<Choice>) -> Result<String> {
    let Some(choice) = choices.into_iter().next() else {
        anyhow::bail!("OpenAI returned no choices");
    };
    let content = choice.message.content.unwrap_or_default();
    let content = content.trim();
    if content.is_empty() {
        anyhow::bail!("OpenAI returned an empty message");
    }
    Ok(content.to_string())
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();

        let body = ChatRequest {
            model: request.model.clone(),
            messages: build_messages(request),
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
        };

        debug!(
            model = %request.model,
            temperature = request.temperature,
            "Sending request to OpenAI"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI returned {}: {}", status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = first_content(chat_response.choices)?;

        let tokens_used = chat_response
            .usage
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        Ok(LlmResponse {
            content,
            provider: "openai".to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(system: &str) -> LlmRequest {
        LlmRequest {
            model: "gpt-4-turbo".into(),
            system_prompt: system.into(),
            user_prompt: "¿Qué es un lavado?".into(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    #[test]
    fn system_message_comes_first() {
        let messages = build_messages(&request("Eres un experto"));
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user"]);
    }

    #[test]
    fn empty_system_prompt_is_omitted() {
        let messages = build_messages(&request(""));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    fn choices(body: &str) -> Vec<Choice> {
        serde_json::from_str::<ChatResponse>(body).unwrap().choices
    }

    #[test]
    fn first_choice_is_trimmed() {
        let content = first_content(choices(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  Hola  "}}]}"#,
        ))
        .unwrap();
        assert_eq!(content, "Hola");
    }

    #[test]
    fn missing_or_null_content_is_an_error() {
        let err = first_content(choices(r#"{"choices": []}"#)).unwrap_err();
        assert!(err.to_string().contains("no choices"));

        let null = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert!(first_content(choices(null)).is_err());

        let blank = r#"{"choices": [{"message": {"role": "assistant", "content": "   "}}]}"#;
        assert!(first_content(choices(blank)).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let provider = OpenAiProvider::new("sk-test").with_base_url("http://localhost:8000/v1/");
        assert_eq!(provider.base_url, "http://localhost:8000/v1");
    }
}
