//! CLI Doctor Command
//!
//! Checks the environment and the ledger files the bot reads.

use anyhow::Result;
use cafetal_core::Dataset;
use cafetal_ledger::CsvRecordStore;
use cafetal_logging::mask_secret;

use crate::config::Config;

/// How a variable is shown when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Plain,
    /// Only the first `n` characters.
    Prefix(usize),
    Hidden,
}

struct EnvCheck {
    name: &'static str,
    value: Option<String>,
    required: bool,
    display: Visibility,
}

/// Executes the full doctor diagnosis.
pub async fn run(config: &Config) -> Result<()> {
    println!("\n🔍 Running Cafetal Doctor...\n");

    let env_ok = check_env_vars(config);
    let data_ok = check_data_files(config).await;

    println!();
    if env_ok && data_ok {
        println!("✅ All checks passed! Cafetal is ready.");
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
    }

    Ok(())
}

fn env_checks(config: &Config) -> Vec<EnvCheck> {
    vec![
        EnvCheck {
            name: "TELEGRAM_BOT_TOKEN",
            value: config.telegram_token.clone(),
            required: true,
            display: Visibility::Prefix(10),
        },
        EnvCheck {
            name: "OPENAI_API_KEY",
            value: config.openai_api_key.clone(),
            required: false,
            display: Visibility::Hidden,
        },
        EnvCheck {
            name: "OPENAI_MODEL",
            value: Some(config.openai_model.clone()),
            required: false,
            display: Visibility::Plain,
        },
        EnvCheck {
            name: "OPENAI_BASE_URL",
            value: Some(config.openai_base_url.clone()),
            required: false,
            display: Visibility::Plain,
        },
    ]
}

fn describe(check: &EnvCheck) -> String {
    match (&check.value, check.display) {
        (Some(value), Visibility::Plain) => format!("🟢 {} = {}", check.name, value),
        (Some(value), Visibility::Prefix(n)) => format!("🟢 {} = {}", check.name, mask_secret(value, n)),
        (Some(_), Visibility::Hidden) => format!("🟢 {} is set (value hidden)", check.name),
        (None, _) if check.required => format!("🔴 {} is missing (REQUIRED)", check.name),
        (None, _) => format!("🟡 {} is missing (optional)", check.name),
    }
}

fn check_env_vars(config: &Config) -> bool {
    println!("Checking Environment Variables:");

    let mut all_good = true;
    for check in env_checks(config) {
        println!("  {}", describe(&check));
        if check.required && check.value.is_none() {
            all_good = false;
        }
    }
    if !config.openai_configured() {
        println!("  ⚠️  AI features will answer that OpenAI is not configured.");
    }

    all_good
}

async fn check_data_files(config: &Config) -> bool {
    println!("Checking Ledger Files:");

    if !tokio::fs::try_exists(&config.data_dir).await.unwrap_or(false) {
        println!("  🔴 data directory {} not found", config.data_dir.display());
        return false;
    }

    let store = CsvRecordStore::new(&config.data_dir);
    for dataset in Dataset::ALL {
        let path = store.path_for(dataset);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            println!("  🟢 {} ({})", dataset, path.display());
        } else {
            println!("  🟡 {} has no file yet ({}), analysis treats it as empty", dataset, path.display());
        }
    }

    true
}
