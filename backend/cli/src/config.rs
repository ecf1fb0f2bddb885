use std::path::PathBuf;
use std::time::Duration;

use cafetal_llm::providers::openai::DEFAULT_BASE_URL;
use cafetal_llm::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

/// Cafetal runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token, required by `serve`
    pub telegram_token: Option<String>,
    /// OpenAI API key; without it the assistant is not configured
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Any OpenAI-compatible chat-completions endpoint
    pub openai_base_url: String,
    pub openai_max_tokens: u32,
    /// Directory holding the ledger CSV files
    pub data_dir: PathBuf,
    /// Idle time after which a dialogue session is dropped
    pub session_idle: Duration,
    pub log_dir: PathBuf,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_token: None,
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_max_tokens: DEFAULT_MAX_TOKENS,
            data_dir: PathBuf::from("data"),
            session_idle: Duration::from_secs(1800),
            log_dir: PathBuf::from("logs"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present)
    /// with sensible defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            telegram_token: var("TELEGRAM_BOT_TOKEN"),
            openai_api_key: var("OPENAI_API_KEY"),
            openai_model: var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_max_tokens: var("OPENAI_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.openai_max_tokens),
            data_dir: var("CAFETAL_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            session_idle: var("CAFETAL_SESSION_IDLE_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle),
            log_dir: var("CAFETAL_LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    pub fn openai_configured(&self) -> bool {
        self.openai_api_key.is_some()
    }
}
