use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use cafetal_assistant::{DialogueController, DialogueEvent};
use teloxide::prelude::*;
use teloxide::types::{ParseMode, User, UserId};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use crate::ChannelAdapter;
use crate::telegram_commands::{Command, HELP_TEXT, welcome_text};
use crate::telegram_surface::TelegramSurface;

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

pub struct TelegramAdapter {
    bot: Bot,
    controller: Arc<DialogueController>,
}

impl TelegramAdapter {
    pub fn new(token: String, controller: Arc<DialogueController>) -> Self {
        Self {
            bot: Bot::new(token),
            controller,
        }
    }
}

/// Dialogue sessions are scoped per chat and per user.
pub fn session_key(chat_id: ChatId, user_id: Option<UserId>) -> String {
    let user = user_id.map(|u| u.0.to_string()).unwrap_or_else(|| "anon".to_string());
    format!("tg-{}-{}", chat_id.0, user)
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> anyhow::Result<()> {
        info!("Starting Telegram adapter");

        let bot = self.bot.clone();
        if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Could not register bot commands");
        }

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .branch(dptree::entry().filter_command::<Command>().endpoint(on_command))
                    .branch(dptree::endpoint(on_text)),
            )
            .branch(Update::filter_callback_query().endpoint(on_callback));

        info!("Bot started, waiting for commands");
        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![self.controller.clone()])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram adapter stopped");
        Ok(())
    }
}

async fn dispatch(
    controller: &DialogueController,
    session_id: &str,
    event: DialogueEvent,
    surface: &TelegramSurface,
) -> HandlerResult {
    match controller.handle(session_id, event, surface).await {
        Ok(state) => {
            debug!(session_id, %state, "Event handled");
            Ok(())
        }
        Err(e) => {
            error!(session_id, error = %format!("{e:#}"), "Failed to deliver reply");
            Err(e.into())
        }
    }
}

async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    controller: Arc<DialogueController>,
) -> HandlerResult {
    let session_id = session_key(msg.chat.id, msg.from.as_ref().map(|u| u.id));
    info!(session_id, command = ?cmd, "Command received");

    match cmd {
        Command::Start => {
            let name = msg.from.as_ref().map(|u: &User| u.first_name.as_str()).unwrap_or("");
            bot.send_message(msg.chat.id, welcome_text(name)).await?;
        }
        Command::Ayuda | Command::Help => {
            bot.send_message(msg.chat.id, HELP_TEXT)
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        Command::Ia => {
            let surface = TelegramSurface::new(bot, msg.chat.id);
            dispatch(&controller, &session_id, DialogueEvent::Start, &surface).await?;
        }
        Command::Cancelar => {
            let surface = TelegramSurface::new(bot, msg.chat.id);
            dispatch(&controller, &session_id, DialogueEvent::Cancel, &surface).await?;
        }
    }
    Ok(())
}

async fn on_text(bot: Bot, msg: Message, controller: Arc<DialogueController>) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if text.starts_with('/') {
        debug!(chat_id = msg.chat.id.0, "Ignoring unknown command");
        return Ok(());
    }

    let session_id = session_key(msg.chat.id, msg.from.as_ref().map(|u| u.id));
    if !controller.is_active(&session_id) {
        return Ok(());
    }

    let surface = TelegramSurface::new(bot, msg.chat.id);
    dispatch(&controller, &session_id, DialogueEvent::Text(text.to_string()), &surface).await
}

async fn on_callback(
    bot: Bot,
    q: CallbackQuery,
    controller: Arc<DialogueController>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        debug!(user_id = q.from.id.0, "Callback without data or message");
        return Ok(());
    };

    let chat_id = message.chat().id;
    let session_id = session_key(chat_id, Some(q.from.id));
    let surface = TelegramSurface::new(bot, chat_id).for_message(message.id());
    dispatch(
        &controller,
        &session_id,
        DialogueEvent::Callback(data.to_string()),
        &surface,
    )
    .await
}
