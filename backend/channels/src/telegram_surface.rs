//! Outbound Telegram messages for one update.

use async_trait::async_trait;
use cafetal_core::{Button, ChatSurface};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};

/// Chat (and, for button presses, the pressed message) that replies go to.
pub struct TelegramSurface {
    bot: Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
}

impl TelegramSurface {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self {
            bot,
            chat_id,
            message_id: None,
        }
    }

    /// Scope the surface to the message whose inline button was pressed.
    pub fn for_message(mut self, message_id: MessageId) -> Self {
        self.message_id = Some(message_id);
        self
    }

    async fn send(
        &self,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
        formatted: bool,
    ) -> Result<(), RequestError> {
        let mut request = self.bot.send_message(self.chat_id, text);
        if formatted {
            request = request.parse_mode(ParseMode::Markdown);
        }
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await.map(|_| ())
    }

    async fn edit(&self, message_id: MessageId, text: &str, formatted: bool) -> Result<(), RequestError> {
        let mut request = self.bot.edit_message_text(self.chat_id, message_id, text);
        if formatted {
            request = request.parse_mode(ParseMode::Markdown);
        }
        match request.await {
            Ok(_) => Ok(()),
            Err(RequestError::Api(ApiError::MessageNotModified)) => {
                debug!(chat_id = self.chat_id.0, "Edit left the message unchanged");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Telegram refused the Markdown entities of the text.
pub fn is_markup_rejected(err: &RequestError) -> bool {
    matches!(err, RequestError::Api(ApiError::CantParseEntities(_)))
}

/// One button per row.
pub fn keyboard(buttons: &[Button]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        buttons
            .iter()
            .map(|b| vec![InlineKeyboardButton::callback(b.label.clone(), b.data.clone())]),
    )
}

#[async_trait]
impl ChatSurface for TelegramSurface {
    async fn send_text(&self, text: &str, formatted: bool) -> anyhow::Result<()> {
        match self.send(text, None, formatted).await {
            Err(e) if formatted && is_markup_rejected(&e) => {
                warn!(chat_id = self.chat_id.0, error = %e, "Markdown rejected, resending as plain text");
                self.send(text, None, false).await?;
            }
            other => other?,
        }
        Ok(())
    }

    async fn send_text_with_buttons(
        &self,
        text: &str,
        buttons: &[Button],
        formatted: bool,
    ) -> anyhow::Result<()> {
        match self.send(text, Some(keyboard(buttons)), formatted).await {
            Err(e) if formatted && is_markup_rejected(&e) => {
                warn!(chat_id = self.chat_id.0, error = %e, "Markdown rejected, resending as plain text");
                self.send(text, Some(keyboard(buttons)), false).await?;
            }
            other => other?,
        }
        Ok(())
    }

    async fn edit_message(&self, text: &str, formatted: bool) -> anyhow::Result<()> {
        let Some(message_id) = self.message_id else {
            return self.send_text(text, formatted).await;
        };

        match self.edit(message_id, text, formatted).await {
            Err(e) if formatted && is_markup_rejected(&e) => {
                warn!(chat_id = self.chat_id.0, error = %e, "Markdown rejected, editing as plain text");
                self.edit(message_id, text, false).await?;
            }
            other => other?,
        }
        Ok(())
    }
}
