//! Shared test fixture: a mock [`BotApi`] recording outbound calls, plus a full
//! store + machine stack on an in-memory database.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fleetbot_core::{CoreError, Result};
use session::PromptStateMachine;
use storage::{BotUserRepository, NewUser, SessionRepository, SqlitePoolManager};
use telegram_api::{BotApi, BotCommand, FileInfo};

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

/// Mock [`BotApi`] that records calls; sends to chats registered via
/// [`MockBotApi::fail_sends_to`] return an error instead.
#[derive(Default)]
pub struct MockBotApi {
    calls: Mutex<Vec<ApiCall>>,
    failing_chats: Mutex<HashSet<i64>>,
}

impl MockBotApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_sends_to(&self, chat_id: i64) {
        self.failing_chats
            .lock()
            .expect("failing chats lock poisoned")
            .insert(chat_id);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    /// Texts sent to one chat, in order.
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

    /// Command-menu updates in order, as lists of command names.
    pub fn menu_updates(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::SetCommands { commands, .. } => Some(commands),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BotApi for MockBotApi {
    async fn send_message(&self, bot_token: &str, chat_id: i64, text: &str) -> Result<()> {
        if self
            .failing_chats
            .lock()
            .expect("failing chats lock poisoned")
            .contains(&chat_id)
        {
            return Err(CoreError::Api(format!("send to {} refused by mock", chat_id)));
        }
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

    async fn set_my_commands(&self, bot_token: &str, commands: &[BotCommand]) -> Result<()> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(ApiCall::SetCommands {
                token: bot_token.to_string(),
                commands: commands.iter().map(|c| c.command.clone()).collect(),
            });
        Ok(())
    }

    async fn get_file(&self, _bot_token: &str, _file_id: &str) -> Result<FileInfo> {
        Err(CoreError::Api("get_file not supported by mock".to_string()))
    }

    async fn download_file(&self, _bot_token: &str, _file_path: &str) -> Result<Vec<u8>> {
        Err(CoreError::Api(
            "download_file not supported by mock".to_string(),
        ))
    }
}

pub const BOT_TOKEN: &str = "123456789:TESTTOKENTESTTOKEN";

pub struct TestStack {
    pub pool_manager: SqlitePoolManager,
    pub sessions: Arc<SessionRepository>,
    pub users_bots: Arc<BotUserRepository>,
    pub api: Arc<MockBotApi>,
    pub machine: Arc<PromptStateMachine>,
    pub user_id: i64,
    pub bot_id: i64,
    db_path: std::path::PathBuf,
}

impl Drop for TestStack {
    fn drop(&mut self) {
        // Best-effort cleanup of the per-test database file and its WAL/SHM
        // sidecars; ignore errors since the OS temp dir is reclaimed anyway.
        for suffix in ["", "-wal", "-shm"] {
            let mut p = self.db_path.clone().into_os_string();
            p.push(suffix);
            let _ = std::fs::remove_file(std::path::PathBuf::from(p));
        }
    }
}

/// Builds the whole stack and seeds one bot and one user.
///
/// The sweeper's `stop()` aborts an in-flight query, which poisons the pooled
/// connection; a bare `sqlite::memory:` DB vanishes when that connection is
/// reopened. Backing the fixture with a unique temp file (as production does)
/// keeps the schema across reconnects, matching real deployment.
pub async fn setup() -> TestStack {
    use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
    static DB_COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = DB_COUNTER.fetch_add(1, AtomicOrdering::SeqCst);
    let db_path = std::env::temp_dir().join(format!(
        "fleetbot-session-test-{}-{}.db",
        std::process::id(),
        n
    ));
    let _ = std::fs::remove_file(&db_path);
    let database_url = format!("sqlite://{}", db_path.display());

    let pool_manager = SqlitePoolManager::new(&database_url)
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
    let user = users_bots
        .find_or_create_user(&NewUser {
            telegram_id: 1111,
            first_name: Some("Ada".to_string()),
            last_name: None,
            username: Some("ada".to_string()),
            language_code: Some("en".to_string()),
            is_bot: false,
        })
        .await
        .expect("Failed to seed user");

    let api = MockBotApi::new();
    let machine = Arc::new(PromptStateMachine::new(
        sessions.clone(),
        users_bots.clone(),
        api.clone() as Arc<dyn BotApi>,
    ));

    TestStack {
        pool_manager,
        sessions,
        users_bots,
        api,
        machine,
        user_id: user.id,
        bot_id: bot.id,
        db_path,
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
