mod config;
mod doctor_cmd;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use cafetal_assistant::{DialogueController, SessionStore};
use cafetal_channels::{ChannelAdapter, TelegramAdapter};
use cafetal_ledger::{CsvRecordStore, RecordAggregator};
use cafetal_llm::providers::OpenAiProvider;
use cafetal_llm::ModelGateway;
use cafetal_logging::{init_logger, mask_secret};

use config::Config;

#[derive(Parser)]
#[command(name = "cafetal")]
#[command(about = "Cafetal: Telegram bot for coffee-business management with an AI assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot
    Serve,
    /// Check environment variables and ledger files
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            init_logger(&config.log_dir, &config.log_level);
            run_bot(config).await?;
        }
        Commands::Doctor => doctor_cmd::run(&config).await?,
    }

    Ok(())
}

fn build_gateway(config: &Config) -> ModelGateway {
    match &config.openai_api_key {
        Some(key) => {
            let provider = OpenAiProvider::new(key).with_base_url(&config.openai_base_url);
            info!(model = %config.openai_model, base_url = %config.openai_base_url, "OpenAI is configured");
            ModelGateway::new(Arc::new(provider), &config.openai_model)
                .with_max_tokens(config.openai_max_tokens)
        }
        None => {
            warn!("OpenAI is not configured, AI features will be limited. Set OPENAI_API_KEY to enable them");
            ModelGateway::unconfigured()
        }
    }
}

fn log_config_status(config: &Config) {
    match &config.telegram_token {
        Some(token) => info!(token = %mask_secret(token, 10), "TELEGRAM_BOT_TOKEN is set"),
        None => warn!("TELEGRAM_BOT_TOKEN is NOT set"),
    }
    if config.openai_configured() {
        info!("OPENAI_API_KEY is set (value not shown)");
    } else {
        warn!("OPENAI_API_KEY is NOT set");
    }
    info!(
        model = %config.openai_model,
        data_dir = %config.data_dir.display(),
        session_idle_secs = config.session_idle.as_secs(),
        "Runtime configuration"
    );
}

async fn run_bot(config: Config) -> Result<()> {
    info!("Starting Telegram bot for coffee-business management with AI");
    log_config_status(&config);

    let token = config
        .telegram_token
        .clone()
        .context("TELEGRAM_BOT_TOKEN is not set")?;

    let gateway = build_gateway(&config);
    let store = Arc::new(CsvRecordStore::new(&config.data_dir));
    let aggregator = RecordAggregator::new(store);
    let sessions = SessionStore::new(config.session_idle);
    let controller = Arc::new(DialogueController::new(gateway, aggregator, sessions));

    let adapter = TelegramAdapter::new(token, controller);
    info!(adapter = adapter.name(), "Registered channel adapter");
    adapter.start().await
}
