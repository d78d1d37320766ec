//! Session repository: persistence for per-chat conversational state.
//!
//! One row per chat in `chat_sessions`; every mutation is an upsert on the
//! `chat_id` key. State transitions out of `awaiting_prompt` that must happen
//! at most once go through [`SessionRepository::clear_state_if_awaiting`], a
//! single conditional UPDATE, so racing callers (webhook vs sweeper) cannot
//! both win. The history append is a read-modify-write and is serialized per
//! chat by [`ChatLockMap`].

use chrono::{DateTime, Duration, Utc};
use fleetbot_core::{ChatMessage, SessionState};
use sqlx::FromRow;
use tracing::{info, warn};

use crate::chat_locks::ChatLockMap;
use crate::error::StorageError;
use crate::history;
use crate::models::{ChatSession, ExpiredSession};
use crate::sqlite_pool::SqlitePoolManager;

pub struct SessionRepository {
    pool_manager: SqlitePoolManager,
    locks: ChatLockMap,
}

/// Raw `chat_sessions` row; `state` and `history` are decoded by `into_session`.
#[derive(FromRow)]
struct SessionRow {
    chat_id: i64,
    user_id: i64,
    bot_id: i64,
    state: String,
    state_expires_at: Option<DateTime<Utc>>,
    history: Option<String>,
    updated_at: DateTime<Utc>,
}

impl SessionRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self {
            pool_manager,
            locks: ChatLockMap::new(),
        };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                chat_id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                bot_id INTEGER NOT NULL,
                state TEXT DEFAULT 'idle',
                state_expires_at DATETIME,
                history TEXT,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (bot_id) REFERENCES bots (id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS update_chat_sessions_updated_at
            AFTER UPDATE ON chat_sessions FOR EACH ROW
            BEGIN
                UPDATE chat_sessions SET updated_at = CURRENT_TIMESTAMP WHERE chat_id = OLD.chat_id;
            END
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Loads the session for a chat, or `None` when no row exists.
    ///
    /// Malformed persisted history is not an error: it degrades to an empty
    /// history with a warning so the chat keeps working.
    pub async fn get_session(&self, chat_id: i64) -> Result<Option<ChatSession>, StorageError> {
        let pool = self.pool_manager.pool();

        let row: Option<SessionRow> =
            sqlx::query_as("SELECT * FROM chat_sessions WHERE chat_id = ?")
                .bind(chat_id)
                .fetch_optional(pool)
                .await?;

        Ok(row.map(|r| Self::into_session(r)))
    }

    fn into_session(row: SessionRow) -> ChatSession {
        let state = match row.state.parse::<SessionState>() {
            Ok(state) => state,
            Err(_) => {
                warn!(
                    chat_id = row.chat_id,
                    state = %row.state,
                    "Unknown session state in store; treating as idle"
                );
                SessionState::Idle
            }
        };

        let history: Vec<ChatMessage> = match row.history.as_deref() {
            None | Some("") => Vec::new(),
            Some(raw) => match serde_json::from_str(raw) {
                Ok(history) => history,
                Err(err) => {
                    warn!(
                        chat_id = row.chat_id,
                        error = %err,
                        "Failed to parse session history; continuing with empty history"
                    );
                    Vec::new()
                }
            },
        };

        ChatSession {
            chat_id: row.chat_id,
            user_id: row.user_id,
            bot_id: row.bot_id,
            state,
            state_expires_at: row.state_expires_at,
            history,
            updated_at: row.updated_at,
        }
    }

    /// Upserts the state for a chat, creating a state-only row (sentinel 0/0
    /// user/bot) if none exists. The absolute expiry is now + `expires_in_minutes`
    /// when given and positive; any transition to idle clears it.
    pub async fn set_state(
        &self,
        chat_id: i64,
        state: SessionState,
        expires_in_minutes: Option<i64>,
    ) -> Result<(), StorageError> {
        self.upsert_state(chat_id, None, state, expires_in_minutes)
            .await
    }

    /// Same as [`SessionRepository::set_state`] but records the real user/bot
    /// association, so an expiry scan can join the owning bot even when the row
    /// was created by this call.
    pub async fn set_state_owned(
        &self,
        chat_id: i64,
        user_id: i64,
        bot_id: i64,
        state: SessionState,
        expires_in_minutes: Option<i64>,
    ) -> Result<(), StorageError> {
        self.upsert_state(chat_id, Some((user_id, bot_id)), state, expires_in_minutes)
            .await
    }

    async fn upsert_state(
        &self,
        chat_id: i64,
        owner: Option<(i64, i64)>,
        state: SessionState,
        expires_in_minutes: Option<i64>,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        let expires_at: Option<DateTime<Utc>> = match (state, expires_in_minutes) {
            (SessionState::AwaitingPrompt, Some(minutes)) if minutes > 0 => {
                Some(Utc::now() + Duration::minutes(minutes))
            }
            _ => None,
        };

        match owner {
            Some((user_id, bot_id)) => {
                sqlx::query(
                    r#"
                    INSERT INTO chat_sessions (chat_id, user_id, bot_id, state, state_expires_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT(chat_id) DO UPDATE SET
                    user_id = excluded.user_id,
                    bot_id = excluded.bot_id,
                    state = excluded.state,
                    state_expires_at = excluded.state_expires_at,
                    updated_at = CURRENT_TIMESTAMP
                    "#,
                )
                .bind(chat_id)
                .bind(user_id)
                .bind(bot_id)
                .bind(state.as_str())
                .bind(expires_at)
                .execute(pool)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO chat_sessions (chat_id, user_id, bot_id, state, state_expires_at)
                    VALUES (?, 0, 0, ?, ?)
                    ON CONFLICT(chat_id) DO UPDATE SET
                    state = excluded.state,
                    state_expires_at = excluded.state_expires_at,
                    updated_at = CURRENT_TIMESTAMP
                    "#,
                )
                .bind(chat_id)
                .bind(state.as_str())
                .bind(expires_at)
                .execute(pool)
                .await?;
            }
        }

        info!(chat_id, state = %state, "Session state updated");
        Ok(())
    }

    /// Atomically resets an `awaiting_prompt` chat to idle, clearing the expiry.
    ///
    /// Returns whether this caller performed the transition. Concurrent callers
    /// (a message handler racing the sweeper) see `true` exactly once, which is
    /// what keeps the expiry notification single.
    pub async fn clear_state_if_awaiting(&self, chat_id: i64) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET state = 'idle', state_expires_at = NULL, updated_at = CURRENT_TIMESTAMP
            WHERE chat_id = ? AND state = 'awaiting_prompt'
            "#,
        )
        .bind(chat_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Appends one conversational turn (user then assistant) and trims the
    /// history to the policy bound, upserting the row under the given user/bot.
    ///
    /// The load-append-store span is serialized per chat so concurrent appends
    /// cannot drop each other's entries.
    pub async fn append_history(
        &self,
        chat_id: i64,
        user_id: i64,
        bot_id: i64,
        user_msg: ChatMessage,
        assistant_msg: ChatMessage,
    ) -> Result<(), StorageError> {
        let lock = self.locks.lock_for(chat_id);
        let _guard = lock.lock().await;

        let existing = self
            .get_session(chat_id)
            .await?
            .map(|s| s.history)
            .unwrap_or_default();

        let history = history::append_and_trim(existing, user_msg, assistant_msg);
        let history_json = serde_json::to_string(&history)?;

        let pool = self.pool_manager.pool();
        sqlx::query(
            r#"
            INSERT INTO chat_sessions (chat_id, user_id, bot_id, history)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(chat_id) DO UPDATE SET
            user_id = excluded.user_id,
            bot_id = excluded.bot_id,
            history = excluded.history,
            updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(bot_id)
        .bind(history_json)
        .execute(pool)
        .await?;

        info!(chat_id, len = history.len(), "Conversation history updated");
        Ok(())
    }

    /// Returns all chats still in `awaiting_prompt` whose deadline has passed,
    /// joined with the owning bot's token. The predicate is evaluated fresh on
    /// every call, so a chat reset by one sweep is not returned by the next.
    pub async fn expired_sessions(&self) -> Result<Vec<ExpiredSession>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows: Vec<ExpiredSession> = sqlx::query_as(
            r#"
            SELECT cs.chat_id, b.token AS bot_token
            FROM chat_sessions cs
            JOIN bots b ON cs.bot_id = b.id
            WHERE cs.state = 'awaiting_prompt'
              AND cs.state_expires_at IS NOT NULL
              AND datetime(cs.state_expires_at) < datetime('now')
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
