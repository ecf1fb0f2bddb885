use std::sync::Arc;

use cafetal_core::{
    AnalysisPayload, AssistantError, LlmProvider, LlmRequest, PricingProduct,
    PricingRecommendation,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::extract::extract_json;
use crate::prompts::{self, UseCase};

pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Single entry point for every text-generation call the assistant makes.
///
/// A gateway without a provider is "not configured": every call fails with
/// `ConfigurationMissing` and the dialogue declines to start.
#[derive(Clone)]
pub struct ModelGateway {
    provider: Option<Arc<dyn LlmProvider>>,
    model: String,
    max_tokens: u32,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider: Some(provider),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            provider: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// One completion call. Provider failures (network, auth, rate limit) come
    /// back as `ModelUnavailable` carrying the provider's message.
    pub async fn complete(
        &self,
        user_prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
    ) -> Result<String, AssistantError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            AssistantError::ConfigurationMissing("OPENAI_API_KEY".to_string())
        })?;

        let request = LlmRequest {
            model: self.model.clone(),
            system_prompt: system_prompt.map(str::trim).unwrap_or_default().to_string(),
            user_prompt: user_prompt.to_string(),
            max_tokens: self.max_tokens,
            temperature,
        };

        match provider.complete(&request).await {
            Ok(response) => {
                info!(
                    provider = %response.provider,
                    model = %response.model,
                    tokens = response.tokens_used,
                    latency_ms = response.latency_ms,
                    "Model responded"
                );
                Ok(response.content.trim().to_string())
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Model call failed");
                Err(AssistantError::ModelUnavailable(format!("{e:#}")))
            }
        }
    }

    /// Like [`complete`](Self::complete), but a failure becomes an apology the
    /// operator can read in place of the answer.
    pub async fn reply(&self, user_prompt: &str, system_prompt: Option<&str>, temperature: f32) -> String {
        match self.complete(user_prompt, system_prompt, temperature).await {
            Ok(text) => text,
            Err(AssistantError::ModelUnavailable(detail)) => apology(&detail),
            Err(other) => apology(&other.to_string()),
        }
    }

    async fn reply_for(&self, use_case: UseCase, user_prompt: &str) -> String {
        self.reply(user_prompt, Some(use_case.system_prompt()), use_case.temperature())
            .await
    }

    pub async fn answer_question(&self, question: &str) -> String {
        self.reply_for(UseCase::Question, question).await
    }

    pub async fn analyze_operations(&self, payload: &AnalysisPayload) -> String {
        self.reply_for(UseCase::Analysis, &prompts::analysis_prompt(payload))
            .await
    }

    pub async fn recommend_coffee(&self, preferences: &str) -> String {
        self.reply_for(UseCase::Recommendation, &prompts::recommendation_prompt(preferences))
            .await
    }

    /// Ask for optimized prices and parse the model's JSON answer.
    pub async fn optimize_pricing(
        &self,
        products: &[PricingProduct],
    ) -> Result<Vec<PricingRecommendation>, AssistantError> {
        let use_case = UseCase::Pricing;
        let raw = self
            .complete(
                &prompts::pricing_prompt(products),
                Some(use_case.system_prompt()),
                use_case.temperature(),
            )
            .await?;

        let value = extract_json(&raw)?;
        parse_recommendations(value, &raw)
    }
}

fn apology(detail: &str) -> String {
    format!("Lo siento, no pude generar una respuesta en este momento. Error: {detail}")
}

/// The model may answer with one object or a list of them.
fn parse_recommendations(
    value: Value,
    raw: &str,
) -> Result<Vec<PricingRecommendation>, AssistantError> {
    let malformed = |reason: String| AssistantError::MalformedModelOutput {
        reason,
        raw: raw.to_string(),
    };

    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(malformed(format!(
                "se esperaba un objeto o una lista, se recibió {other}"
            )))
        }
    };

    if items.is_empty() {
        return Err(malformed("la respuesta no contiene recomendaciones".to_string()));
    }

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|e| malformed(e.to_string())))
        .collect()
}
