//! Freeform text handling, the stateful heart of the message path.
//!
//! The state machine gets first claim on the text (pending-prompt capture or
//! expiry fallthrough); only text it releases as freeform reaches the AI: build
//! the system prompt (custom per user/bot or default), prepend the stored
//! history, generate, reply, then append the turn.

use anyhow::Result;
use fleetbot_core::{ChatMessage, DEFAULT_SYSTEM_PROMPT};
use session::TextDisposition;
use telegram_api::TelegramMessage;
use tracing::{error, info, warn};

use crate::context::{notify_best_effort, BotContext};

const MESSAGE_ERROR_REPLY: &str =
    "Sorry, I encountered an error while processing your message.";
const START_FIRST_REPLY: &str =
    "An error occurred. Please try using the /start command first.";

pub async fn handle_text_message(ctx: &BotContext, bot_token: &str, message: &TelegramMessage) {
    let chat_id = message.chat.id;
    let (Some(from), Some(text)) = (&message.from, message.text.as_deref()) else {
        warn!(chat_id, "Cannot handle message: missing user ID or text");
        return;
    };

    if let Err(err) = try_handle_text(ctx, bot_token, chat_id, from.id, text).await {
        error!(error = %err, chat_id, "Error processing text message");
        notify_best_effort(ctx.api.as_ref(), bot_token, chat_id, MESSAGE_ERROR_REPLY).await;
    }
}

async fn try_handle_text(
    ctx: &BotContext,
    bot_token: &str,
    chat_id: i64,
    telegram_user_id: i64,
    text: &str,
) -> Result<()> {
    let user = ctx.users_bots.get_user_by_telegram_id(telegram_user_id).await?;
    let bot = ctx.users_bots.get_bot_by_token(bot_token).await?;

    // Both must exist before any session work; /start creates the user.
    let (user, bot) = match (user, bot) {
        (Some(user), Some(bot)) => (user, bot),
        (user, bot) => {
            error!(
                chat_id,
                found_user = user.is_some(),
                found_bot = bot.is_some(),
                "Critical: User or Bot not found in DB. Cannot process message"
            );
            ctx.api
                .send_message(bot_token, chat_id, START_FIRST_REPLY)
                .await?;
            return Ok(());
        }
    };

    let disposition = ctx
        .machine
        .resolve_pending_text(bot_token, chat_id, user.id, bot.id, text)
        .await?;
    if disposition == TextDisposition::PromptSaved {
        return Ok(());
    }

    let system_prompt = match ctx.users_bots.get_user_bot_prompt(user.id, bot.id).await? {
        Some(custom) => {
            info!(chat_id, user_id = user.id, bot_id = bot.id, "Using custom user prompt");
            custom
        }
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    };

    let history = ctx
        .sessions
        .get_session(chat_id)
        .await?
        .map(|session| session.history)
        .unwrap_or_default();

    let user_message = ChatMessage::user(text);
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history);
    messages.push(user_message.clone());

    let reply = ctx.ai.generate_text_response(messages, None).await;

    ctx.api.send_message(bot_token, chat_id, &reply).await?;
    info!(chat_id, "Successfully sent AI response");

    // History records the turn only once the reply actually went out.
    let assistant_message = ChatMessage::assistant(reply);
    ctx.sessions
        .append_history(chat_id, user.id, bot.id, user_message, assistant_message)
        .await?;
    info!(chat_id, "Conversation history updated");

    Ok(())
}
