//! `/bots`: list every registered bot for the user, split into configured
//! (with their custom prompt) and available (default prompt). Independent of the
//! session state machine.

use std::collections::HashMap;

use anyhow::Result;
use storage::BotRecord;
use telegram_api::TelegramMessage;
use tracing::{error, info, warn};

use crate::context::{notify_best_effort, BotContext};

const NO_PROFILE_REPLY: &str = "I can't find your user profile. Please type /start first.";
const NO_BOTS_REPLY: &str = "There are no bots available currently.";
const BOTS_ERROR_REPLY: &str = "Sorry, an error occurred while fetching the bot list.";

pub(crate) async fn handle_bots(ctx: &BotContext, bot_token: &str, message: &TelegramMessage) {
    let chat_id = message.chat.id;
    let Some(from) = &message.from else {
        warn!(chat_id, "Cannot execute /bots: telegram user ID is missing");
        return;
    };

    if let Err(err) = try_bots(ctx, bot_token, chat_id, from.id).await {
        error!(error = %err, chat_id, "Error processing /bots command");
        notify_best_effort(ctx.api.as_ref(), bot_token, chat_id, BOTS_ERROR_REPLY).await;
    }
}

async fn try_bots(
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

    let all_bots = ctx.users_bots.get_all_bots().await?;
    if all_bots.is_empty() {
        ctx.api
            .send_message(bot_token, chat_id, NO_BOTS_REPLY)
            .await?;
        return Ok(());
    }

    let settings = ctx.users_bots.get_user_bots(user.id).await?;
    let prompts: HashMap<i64, Option<String>> = settings
        .into_iter()
        .map(|setting| (setting.bot_id, setting.prompt))
        .collect();

    let (configured, available): (Vec<&BotRecord>, Vec<&BotRecord>) = all_bots
        .iter()
        .partition(|bot| prompts.contains_key(&bot.id));

    let mut text = String::from("🤖 **Your Bots**\n\n");

    if !configured.is_empty() {
        text.push_str("**✅ Configured Bots:**\n");
        for bot in configured {
            let prompt = prompts
                .get(&bot.id)
                .and_then(|p| p.as_deref())
                .unwrap_or("(empty)");
            text.push_str(&format!("🤖 {}\n", bot_link(bot)));
            text.push_str(&format!("   *Prompt:* `{}`\n\n", prompt));
        }
    }

    if !available.is_empty() {
        text.push_str("**📋 Available Bots:**\n");
        for bot in available {
            text.push_str(&format!("🤖 {}\n", bot_link(bot)));
            text.push_str("   *Status:* Using default prompt\n\n");
        }
    }

    text.push_str("💡 *Tip:* Use `/setprompt` to customize any bot's behavior!");

    ctx.api.send_message(bot_token, chat_id, &text).await?;
    info!(chat_id, user_id = user.id, "Successfully listed bots for the user");
    Ok(())
}

fn bot_link(bot: &BotRecord) -> String {
    match &bot.username {
        Some(username) => format!("[{}](https://t.me/{})", bot.display_name(), username),
        None => bot.display_name(),
    }
}
