//! User models: the persisted user row, the insert payload, and the per-bot
//! prompt setting row.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A user as stored; `id` is the internal DB id, `telegram_id` the external one.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub telegram_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_bot: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for find-or-create; fields mirror what Telegram reports.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub telegram_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_bot: bool,
}

/// A user's per-bot configuration (currently just the custom prompt).
#[derive(Debug, Clone, FromRow)]
pub struct UserBotSetting {
    pub bot_id: i64,
    pub prompt: Option<String>,
}
