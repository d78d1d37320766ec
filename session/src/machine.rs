//! Per-chat state machine: idle ⇄ awaiting_prompt.
//!
//! The machine holds no mutable state of its own; every decision is a function of
//! the stored session plus the incoming event. Transitions out of
//! `awaiting_prompt` are claimed through the store's conditional update first, so
//! of all concurrent drivers (a message handler, the sweeper) exactly one
//! performs the side effects.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use fleetbot_core::SessionState;
use storage::{BotUserRepository, SessionRepository};
use telegram_api::{contextual_commands, standard_commands, BotApi};
use tracing::{debug, info};

/// How long a chat stays in `awaiting_prompt` before the input window closes.
pub const PROMPT_TTL_MINUTES: i64 = 5;

const PROMPT_INSTRUCTIONS: &str = "🤖 Please enter your new system prompt for this bot.\n\n\
    This will define how the bot behaves and responds to your messages.\n\n\
    💡 *Example:* \"You are a helpful coding assistant who explains concepts clearly.\"\n\n\
    To cancel, send /cancel";

const PROMPT_SAVED_REPLY: &str =
    "✅ Prompt successfully updated! Your bot will now behave according to your instructions.";

const EXPIRED_FALLTHROUGH_REPLY: &str =
    "⏰ Prompt input mode has expired. Processing your message normally.";

const EXPIRED_REPLY: &str = "⏰ Prompt input mode has expired. Operation cancelled.";

const CANCELLED_REPLY: &str = "❌ Operation cancelled. You can start a new command anytime.";

/// How freeform-looking text was consumed by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDisposition {
    /// The text was captured as the custom prompt; nothing further to do.
    PromptSaved,
    /// The text belongs to the ordinary freeform path (chat was idle, the
    /// pending state had expired, or another driver claimed the transition).
    Freeform,
}

pub struct PromptStateMachine {
    sessions: Arc<SessionRepository>,
    users_bots: Arc<BotUserRepository>,
    api: Arc<dyn BotApi>,
}

impl PromptStateMachine {
    pub fn new(
        sessions: Arc<SessionRepository>,
        users_bots: Arc<BotUserRepository>,
        api: Arc<dyn BotApi>,
    ) -> Self {
        Self {
            sessions,
            users_bots,
            api,
        }
    }

    /// idle → awaiting_prompt: opens the prompt-input window for the chat,
    /// switches the menu to the contextual set, and sends the instructions.
    pub async fn begin_prompt_capture(
        &self,
        bot_token: &str,
        chat_id: i64,
        user_id: i64,
        bot_id: i64,
    ) -> Result<()> {
        self.sessions
            .set_state_owned(
                chat_id,
                user_id,
                bot_id,
                SessionState::AwaitingPrompt,
                Some(PROMPT_TTL_MINUTES),
            )
            .await?;

        self.api
            .set_my_commands(bot_token, &contextual_commands())
            .await?;
        self.api
            .send_message(bot_token, chat_id, PROMPT_INSTRUCTIONS)
            .await?;

        info!(chat_id, user_id, bot_id, "Prompt capture started");
        Ok(())
    }

    /// → idle, unconditionally. Safe to call from idle: the state write and the
    /// expiry clear are idempotent, and the user still gets the confirmation.
    pub async fn cancel(&self, bot_token: &str, chat_id: i64) -> Result<()> {
        self.sessions
            .set_state(chat_id, SessionState::Idle, None)
            .await?;

        self.api
            .set_my_commands(bot_token, &standard_commands())
            .await?;
        self.api
            .send_message(bot_token, chat_id, CANCELLED_REPLY)
            .await?;

        info!(chat_id, "Session state reset to idle and menu restored");
        Ok(())
    }

    /// Decides what incoming freeform text means for this chat.
    ///
    /// In `awaiting_prompt` with a live deadline the text becomes the custom
    /// prompt for (user, bot). With a passed deadline — checked against the
    /// wall clock now, not the send time — the window closes with a notice and
    /// the text falls through to freeform handling. Either way the transition is
    /// claimed first; losing the claim means the sweeper already closed the
    /// window (and notified), so the text silently falls through.
    pub async fn resolve_pending_text(
        &self,
        bot_token: &str,
        chat_id: i64,
        user_id: i64,
        bot_id: i64,
        text: &str,
    ) -> Result<TextDisposition> {
        let Some(session) = self.sessions.get_session(chat_id).await? else {
            return Ok(TextDisposition::Freeform);
        };
        if session.state != SessionState::AwaitingPrompt {
            return Ok(TextDisposition::Freeform);
        }

        let expired = session
            .state_expires_at
            .map(|deadline| Utc::now() > deadline)
            .unwrap_or(false);

        if !self.sessions.clear_state_if_awaiting(chat_id).await? {
            debug!(chat_id, "Pending state already reset concurrently");
            return Ok(TextDisposition::Freeform);
        }

        if expired {
            self.api
                .set_my_commands(bot_token, &standard_commands())
                .await?;
            self.api
                .send_message(bot_token, chat_id, EXPIRED_FALLTHROUGH_REPLY)
                .await?;
            info!(chat_id, "Prompt window expired; message falls through to freeform");
            return Ok(TextDisposition::Freeform);
        }

        self.users_bots
            .set_user_bot_prompt(user_id, bot_id, text)
            .await?;
        self.api
            .set_my_commands(bot_token, &standard_commands())
            .await?;
        self.api
            .send_message(bot_token, chat_id, PROMPT_SAVED_REPLY)
            .await?;

        info!(chat_id, user_id, bot_id, "User prompt updated via pending state");
        Ok(TextDisposition::PromptSaved)
    }

    /// Sweeper path: awaiting_prompt → idle for a chat whose deadline passed.
    ///
    /// Returns whether this call performed the transition. `false` means some
    /// other driver (a message handler, an earlier sweep) already did, and
    /// nothing is sent.
    pub async fn expire_pending(&self, bot_token: &str, chat_id: i64) -> Result<bool> {
        if !self.sessions.clear_state_if_awaiting(chat_id).await? {
            debug!(chat_id, "Expired chat already reset; skipping notification");
            return Ok(false);
        }

        self.api
            .send_message(bot_token, chat_id, EXPIRED_REPLY)
            .await?;
        self.api
            .set_my_commands(bot_token, &standard_commands())
            .await?;

        info!(chat_id, "Expired session reset to idle");
        Ok(true)
    }
}
