//! Shared fixture for handler tests: mock BotApi (records outbound traffic,
//! serves a canned voice file), mock AiProvider (records generation requests),
//! and a fully wired router on an in-memory database.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ai_client::{AiProvider, GenerationOptions};
use async_trait::async_trait;
use bot_handlers::{BotContext, UpdateRouter};
use chrono::{Duration, Utc};
use fleetbot_core::{ChatMessage, Result as CoreResult};
use session::PromptStateMachine;
use storage::{BotUserRepository, SessionRepository, SqlitePoolManager};
use telegram_api::{
    BotApi, BotCommand, FileInfo, TelegramChat, TelegramMessage, TelegramUser, TelegramVoice,
};

pub const BOT_TOKEN: &str = "123456789:TESTTOKENTESTTOKEN";
pub const MOCK_REPLY: &str = "mock model reply";
pub const MOCK_TRANSCRIPT: &str = "what is the weather like";

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Send {
        token: String,
        chat_id: i64,
        text: String,
    },
    SetCommands {
        token: String,
        commands: Vec<String>,
    },
}

#[derive(Default)]
pub struct MockBotApi {
    calls: Mutex<Vec<ApiCall>>,
}

impl MockBotApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn sent_texts(&self, chat_id: i64) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Send {
                    chat_id: id, text, ..
                } if id == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BotApi for MockBotApi {
    async fn send_message(&self, bot_token: &str, chat_id: i64, text: &str) -> CoreResult<()> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(ApiCall::Send {
                token: bot_token.to_string(),
                chat_id,
                text: text.to_string(),
            });
        Ok(())
    }

    async fn set_my_commands(&self, bot_token: &str, commands: &[BotCommand]) -> CoreResult<()> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(ApiCall::SetCommands {
                token: bot_token.to_string(),
                commands: commands.iter().map(|c| c.command.clone()).collect(),
            });
        Ok(())
    }

    async fn get_file(&self, _bot_token: &str, file_id: &str) -> CoreResult<FileInfo> {
        Ok(FileInfo {
            file_id: file_id.to_string(),
            file_unique_id: "unique".to_string(),
            file_size: Some(3),
            file_path: Some("voice/file_1.oga".to_string()),
        })
    }

    async fn download_file(&self, _bot_token: &str, _file_path: &str) -> CoreResult<Vec<u8>> {
        Ok(vec![0x4f, 0x67, 0x67])
    }
}

/// Mock provider: fixed reply and transcript, records every generation request.
#[derive(Default)]
pub struct MockAiProvider {
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockAiProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate_text_response(
        &self,
        messages: Vec<ChatMessage>,
        _options: Option<GenerationOptions>,
    ) -> String {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(messages);
        MOCK_REPLY.to_string()
    }

    async fn transcribe_audio(&self, _audio: Vec<u8>, _language: Option<String>) -> String {
        MOCK_TRANSCRIPT.to_string()
    }
}

pub struct TestStack {
    pub pool_manager: SqlitePoolManager,
    pub sessions: Arc<SessionRepository>,
    pub users_bots: Arc<BotUserRepository>,
    pub api: Arc<MockBotApi>,
    pub ai: Arc<MockAiProvider>,
    pub router: UpdateRouter,
    pub bot_id: i64,
}

/// Wires the full handler stack on `sqlite::memory:` and registers one bot.
pub async fn setup() -> TestStack {
    let pool_manager = SqlitePoolManager::new("sqlite::memory:")
        .await
        .expect("Failed to create pool");
    let users_bots = Arc::new(
        BotUserRepository::new(pool_manager.clone())
            .await
            .expect("Failed to create bot/user repository"),
    );
    let sessions = Arc::new(
        SessionRepository::new(pool_manager.clone())
            .await
            .expect("Failed to create session repository"),
    );

    users_bots
        .upsert_bot(BOT_TOKEN, "Test Bot")
        .await
        .expect("Failed to seed bot");
    let bot = users_bots
        .get_bot_by_token(BOT_TOKEN)
        .await
        .expect("query failed")
        .expect("bot missing");

    let api = MockBotApi::new();
    let ai = MockAiProvider::new();

    let machine = Arc::new(PromptStateMachine::new(
        sessions.clone(),
        users_bots.clone(),
        api.clone() as Arc<dyn BotApi>,
    ));

    let ctx = BotContext {
        sessions: sessions.clone(),
        users_bots: users_bots.clone(),
        machine,
        api: api.clone() as Arc<dyn BotApi>,
        ai: ai.clone() as Arc<dyn AiProvider>,
        asr: ai.clone() as Arc<dyn AiProvider>,
    };

    TestStack {
        pool_manager,
        sessions,
        users_bots,
        api,
        ai,
        router: UpdateRouter::new(ctx),
        bot_id: bot.id,
    }
}

pub fn sender(user_id: i64) -> TelegramUser {
    TelegramUser {
        id: user_id,
        is_bot: false,
        first_name: "Ada".to_string(),
        last_name: None,
        username: Some("ada".to_string()),
        language_code: Some("en".to_string()),
    }
}

pub fn text_message(chat_id: i64, user_id: i64, text: &str) -> TelegramMessage {
    TelegramMessage {
        message_id: 1,
        from: Some(sender(user_id)),
        chat: chat(chat_id),
        date: 1_700_000_000,
        text: Some(text.to_string()),
        voice: None,
    }
}

pub fn anonymous_text_message(chat_id: i64, text: &str) -> TelegramMessage {
    TelegramMessage {
        message_id: 1,
        from: None,
        chat: chat(chat_id),
        date: 1_700_000_000,
        text: Some(text.to_string()),
        voice: None,
    }
}

pub fn voice_message(chat_id: i64, user_id: i64) -> TelegramMessage {
    TelegramMessage {
        message_id: 2,
        from: Some(sender(user_id)),
        chat: chat(chat_id),
        date: 1_700_000_000,
        text: None,
        voice: Some(TelegramVoice {
            file_id: "file-abc".to_string(),
            file_unique_id: "unique".to_string(),
            duration: 3,
            mime_type: Some("audio/ogg".to_string()),
            file_size: Some(3),
        }),
    }
}

pub fn empty_message(chat_id: i64, user_id: i64) -> TelegramMessage {
    TelegramMessage {
        message_id: 3,
        from: Some(sender(user_id)),
        chat: chat(chat_id),
        date: 1_700_000_000,
        text: None,
        voice: None,
    }
}

fn chat(chat_id: i64) -> TelegramChat {
    TelegramChat {
        id: chat_id,
        chat_type: "private".to_string(),
        first_name: Some("Ada".to_string()),
        last_name: None,
        username: Some("ada".to_string()),
    }
}

/// Forces a chat's pending deadline into the past.
pub async fn backdate_expiry(stack: &TestStack, chat_id: i64) {
    let past = (Utc::now() - Duration::minutes(1)).to_rfc3339();
    sqlx::query("UPDATE chat_sessions SET state_expires_at = ? WHERE chat_id = ?")
        .bind(past)
        .bind(chat_id)
        .execute(stack.pool_manager.pool())
        .await
        .expect("backdate failed");
}
