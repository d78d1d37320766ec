//! Handler dependencies, injected once by the composition root.

use std::sync::Arc;

use ai_client::AiProvider;
use session::PromptStateMachine;
use storage::{BotUserRepository, NewUser, SessionRepository};
use telegram_api::{BotApi, TelegramUser};
use tracing::error;

/// Everything a handler can reach. `ai` answers freeform text, `asr` transcribes
/// voice notes; deployments may point both at the same provider.
#[derive(Clone)]
pub struct BotContext {
    pub sessions: Arc<SessionRepository>,
    pub users_bots: Arc<BotUserRepository>,
    pub machine: Arc<PromptStateMachine>,
    pub api: Arc<dyn BotApi>,
    pub ai: Arc<dyn AiProvider>,
    pub asr: Arc<dyn AiProvider>,
}

/// Maps the wire-level sender to the storage insert payload.
pub(crate) fn new_user_from(user: &TelegramUser) -> NewUser {
    NewUser {
        telegram_id: user.id,
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        language_code: user.language_code.clone(),
        is_bot: user.is_bot,
    }
}

/// Sends a reply, logging instead of raising on failure. Used for apology and
/// guidance messages where a send error must not escalate further.
pub(crate) async fn notify_best_effort(
    api: &dyn BotApi,
    bot_token: &str,
    chat_id: i64,
    text: &str,
) {
    if let Err(err) = api.send_message(bot_token, chat_id, text).await {
        error!(error = %err, chat_id, "Failed to send reply");
    }
}
