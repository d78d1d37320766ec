//! `/setprompt`: open the prompt-input window for this chat.
//!
//! Requires a registered user (guidance reply otherwise) and a registered bot —
//! an unregistered bot receiving traffic is an invariant violation, reported but
//! never mutating state.

use anyhow::Result;
use telegram_api::TelegramMessage;
use tracing::{error, info, warn};

use crate::context::{notify_best_effort, BotContext};

const NO_PROFILE_REPLY: &str = "I can't find your user profile. Please type /start first.";
const BOT_NOT_REGISTERED_REPLY: &str = "Error: This bot is not registered.";
const SET_PROMPT_ERROR_REPLY: &str = "Sorry, an error occurred while processing your request.";

pub(crate) async fn handle_set_prompt(
    ctx: &BotContext,
    bot_token: &str,
    message: &TelegramMessage,
) {
    let chat_id = message.chat.id;
    let Some(from) = &message.from else {
        warn!(chat_id, "Cannot execute /setprompt: telegram user ID is missing");
        return;
    };

    if let Err(err) = try_set_prompt(ctx, bot_token, chat_id, from.id).await {
        error!(error = %err, chat_id, "Error processing /setprompt command");
        notify_best_effort(ctx.api.as_ref(), bot_token, chat_id, SET_PROMPT_ERROR_REPLY).await;
    }
}

async fn try_set_prompt(
    ctx: &BotContext,
    bot_token: &str,
    chat_id: i64,
    telegram_user_id: i64,
) -> Result<()> {
    let Some(user) = ctx.users_bots.get_user_by_telegram_id(telegram_user_id).await? else {
        ctx.api
            .send_message(bot_token, chat_id, NO_PROFILE_REPLY)
            .await?;
        return Ok(());
    };
    let Some(bot) = ctx.users_bots.get_bot_by_token(bot_token).await? else {
        error!(chat_id, "Critical: Bot not found in database");
        ctx.api
            .send_message(bot_token, chat_id, BOT_NOT_REGISTERED_REPLY)
            .await?;
        return Ok(());
    };

    ctx.machine
        .begin_prompt_capture(bot_token, chat_id, user.id, bot.id)
        .await?;

    info!(
        chat_id,
        user_id = user.id,
        bot_id = bot.id,
        "Session state set to awaiting_prompt and contextual menu activated"
    );
    Ok(())
}
