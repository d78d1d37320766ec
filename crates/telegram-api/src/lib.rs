//! # telegram-api
//!
//! Outbound Telegram Bot API boundary: the [`BotApi`] trait and its reqwest-backed
//! implementation [`TelegramApi`], plus wire types and command menus.
//!
//! Every method takes the bot token explicitly — one process serves several bots and
//! the token is per request, never per client. Tokens are masked in logs.

use async_trait::async_trait;
use fleetbot_core::{CoreError, Result};
use serde_json::json;
use tracing::{debug, info};

mod commands;
mod types;

pub use commands::{contextual_commands, standard_commands};
pub use types::{
    BotCommand, FileInfo, TelegramChat, TelegramMessage, TelegramUpdate, TelegramUser,
    TelegramVoice,
};

use types::ApiResponse;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Masks a bot token for safe logging: first 7 chars + "***" + last 4 chars.
/// Tokens of 11 chars or fewer become "***" so no part of a short token leaks.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 {
        "***".to_string()
    } else {
        format!("{}***{}", &token[..7], &token[len - 4..])
    }
}

/// Outbound messaging boundary. Implementations map to a transport; tests record calls.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Sends a text message to the given chat on behalf of the given bot.
    async fn send_message(&self, bot_token: &str, chat_id: i64, text: &str) -> Result<()>;
    /// Replaces the bot's command menu.
    async fn set_my_commands(&self, bot_token: &str, commands: &[BotCommand]) -> Result<()>;
    /// Resolves a `file_id` to a downloadable file path.
    async fn get_file(&self, bot_token: &str, file_id: &str) -> Result<FileInfo>;
    /// Downloads a file previously resolved with [`BotApi::get_file`].
    async fn download_file(&self, bot_token: &str, file_path: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed [`BotApi`] against `api.telegram.org`. The base URL is
/// overridable so tests can point it at a local stub server.
#[derive(Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TelegramApi {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramApi {
    pub fn new() -> Self {
        Self::with_base_url(TELEGRAM_API_BASE.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, bot_token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, bot_token, method)
    }

    fn file_url(&self, bot_token: &str, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, bot_token, file_path)
    }

    /// Posts a JSON body to a Bot API method and unwraps the `{ok, result}` envelope.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        bot_token: &str,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(bot_token, method))
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Api(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| CoreError::Api(format!("{} response invalid ({}): {}", method, status, e)))?;

        if !envelope.ok {
            return Err(CoreError::Api(format!(
                "{} rejected: {}",
                method,
                envelope.description.unwrap_or_else(|| status.to_string())
            )));
        }
        envelope
            .result
            .ok_or_else(|| CoreError::Api(format!("{} returned ok without result", method)))
    }
}

#[async_trait]
impl BotApi for TelegramApi {
    async fn send_message(&self, bot_token: &str, chat_id: i64, text: &str) -> Result<()> {
        debug!(bot = %mask_token(bot_token), chat_id, "sendMessage");
        let _: serde_json::Value = self
            .call(
                bot_token,
                "sendMessage",
                json!({ "chat_id": chat_id, "text": text }),
            )
            .await?;
        info!(bot = %mask_token(bot_token), chat_id, "Message sent");
        Ok(())
    }

    async fn set_my_commands(&self, bot_token: &str, commands: &[BotCommand]) -> Result<()> {
        let accepted: bool = self
            .call(
                bot_token,
                "setMyCommands",
                json!({ "commands": commands }),
            )
            .await?;
        if !accepted {
            return Err(CoreError::Api("setMyCommands not accepted".to_string()));
        }
        info!(
            bot = %mask_token(bot_token),
            count = commands.len(),
            "Bot commands set"
        );
        Ok(())
    }

    async fn get_file(&self, bot_token: &str, file_id: &str) -> Result<FileInfo> {
        let info: FileInfo = self
            .call(bot_token, "getFile", json!({ "file_id": file_id }))
            .await?;
        info!(bot = %mask_token(bot_token), file_id, "File info retrieved");
        Ok(info)
    }

    async fn download_file(&self, bot_token: &str, file_path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.file_url(bot_token, file_path))
            .send()
            .await
            .map_err(|e| CoreError::Api(format!("file download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Api(format!(
                "file download failed with status {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::Api(format!("file download read failed: {}", e)))?;
        info!(
            bot = %mask_token(bot_token),
            size = bytes.len(),
            "File downloaded"
        );
        Ok(bytes.to_vec())
    }
}
