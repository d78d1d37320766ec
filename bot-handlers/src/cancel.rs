//! `/cancel`: close any pending operation and restore the standard menu.
//! Harmless from idle; the confirmation is sent either way.

use telegram_api::TelegramMessage;
use tracing::error;

use crate::context::{notify_best_effort, BotContext};

const CANCEL_ERROR_REPLY: &str = "Sorry, an error occurred while cancelling the operation.";

pub(crate) async fn handle_cancel(ctx: &BotContext, bot_token: &str, message: &TelegramMessage) {
    let chat_id = message.chat.id;

    if let Err(err) = ctx.machine.cancel(bot_token, chat_id).await {
        error!(error = %err, chat_id, "Error processing /cancel command");
        notify_best_effort(ctx.api.as_ref(), bot_token, chat_id, CANCEL_ERROR_REPLY).await;
    }
}
