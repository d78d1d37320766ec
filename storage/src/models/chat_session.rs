//! Chat session model for persistence.
//!
//! Maps to the `chat_sessions` table (one row per chat) and is used by
//! SessionRepository.

use chrono::{DateTime, Utc};
use fleetbot_core::{ChatMessage, SessionState};

/// One chat's session: state machine position, expiry, and bounded history.
/// `user_id`/`bot_id` are 0 until a real association is known (state-only rows).
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub chat_id: i64,
    pub user_id: i64,
    pub bot_id: i64,
    pub state: SessionState,
    pub state_expires_at: Option<DateTime<Utc>>,
    pub history: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

/// Scan result for the sweeper: an awaiting-prompt chat whose deadline passed,
/// joined with the owning bot's token for the notification.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExpiredSession {
    pub chat_id: i64,
    pub bot_token: String,
}
