//! `/start`: register the user, greet, and publish the standard command menu.

use anyhow::Result;
use telegram_api::{standard_commands, TelegramMessage};
use tracing::{error, info, warn};

use crate::context::{new_user_from, notify_best_effort, BotContext};

const START_ERROR_REPLY: &str = "An error occurred. Please try again later.";

pub(crate) async fn handle_start(ctx: &BotContext, bot_token: &str, message: &TelegramMessage) {
    let chat_id = message.chat.id;
    let Some(from) = &message.from else {
        warn!(chat_id, "User object not found in message for /start command");
        return;
    };

    if let Err(err) = try_start(ctx, bot_token, chat_id, from).await {
        error!(error = %err, chat_id, "Error processing /start command");
        notify_best_effort(ctx.api.as_ref(), bot_token, chat_id, START_ERROR_REPLY).await;
    }
}

async fn try_start(
    ctx: &BotContext,
    bot_token: &str,
    chat_id: i64,
    from: &telegram_api::TelegramUser,
) -> Result<()> {
    info!(chat_id, user_id = from.id, "Processing /start command");

    let user = ctx.users_bots.find_or_create_user(&new_user_from(from)).await?;

    let welcome = format!(
        "Hello, {}! Welcome to the bot. You can now use commands like /bots and /setprompt.",
        from.first_name
    );
    ctx.api.send_message(bot_token, chat_id, &welcome).await?;
    ctx.api
        .set_my_commands(bot_token, &standard_commands())
        .await?;

    info!(chat_id, user_id = user.id, "Successfully processed /start and sent welcome message");
    Ok(())
}
