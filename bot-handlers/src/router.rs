//! Inbound dispatch: command prefix match on the text, first match wins;
//! voice goes to transcription; anything else is acknowledged and dropped.

use telegram_api::TelegramMessage;
use tracing::info;

use crate::bots::handle_bots;
use crate::cancel::handle_cancel;
use crate::context::BotContext;
use crate::message::handle_text_message;
use crate::set_prompt::handle_set_prompt;
use crate::start::handle_start;
use crate::voice::handle_voice_message;

pub struct UpdateRouter {
    ctx: BotContext,
}

impl UpdateRouter {
    pub fn new(ctx: BotContext) -> Self {
        Self { ctx }
    }

    /// Routes one inbound message to its handler. Handlers absorb their own
    /// failures, so dispatch itself never fails.
    pub async fn dispatch(&self, bot_token: &str, message: &TelegramMessage) {
        if let Some(text) = message.text.as_deref() {
            if text.starts_with("/start") {
                handle_start(&self.ctx, bot_token, message).await;
            } else if text.starts_with("/setprompt") {
                handle_set_prompt(&self.ctx, bot_token, message).await;
            } else if text.starts_with("/bots") {
                handle_bots(&self.ctx, bot_token, message).await;
            } else if text.starts_with("/cancel") {
                handle_cancel(&self.ctx, bot_token, message).await;
            } else {
                handle_text_message(&self.ctx, bot_token, message).await;
            }
        } else if message.voice.is_some() {
            handle_voice_message(&self.ctx, bot_token, message).await;
        } else {
            info!(
                chat_id = message.chat.id,
                "Received a non-text/voice message. No handler implemented"
            );
        }
    }
}
