use async_trait::async_trait;

pub mod telegram;
pub mod telegram_commands;
pub mod telegram_surface;

pub use telegram::TelegramAdapter;
pub use telegram_commands::Command;
pub use telegram_surface::TelegramSurface;

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Run the adapter until it is shut down (polling loop, Ctrl-C, etc.).
    async fn start(&self) -> anyhow::Result<()>;
}
