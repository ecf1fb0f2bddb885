//! Structured Logger
//!
//! Wraps `tracing` to provide console output, a rolling NDJSON file, and
//! environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// HTTP and Telegram internals stay quiet unless `RUST_LOG` asks for them.
const QUIET_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "teloxide"];

fn default_directives(level: &str) -> String {
    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_TARGETS.iter().map(|t| format!("{t}=warn")));
    directives.join(",")
}

/// Initialize the global structured logger.
/// Creates a console logger and a daily rolling file logger (`cafetal.log.YYYY-MM-DD`).
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "cafetal.log");

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
