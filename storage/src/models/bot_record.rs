//! Bot registry model.
//!
//! Maps to the `bots` table; one row per configured bot token.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct BotRecord {
    pub id: i64,
    pub token: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub telegram_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BotRecord {
    /// Display name for user-facing listings.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Bot ID {}", self.id))
    }
}
