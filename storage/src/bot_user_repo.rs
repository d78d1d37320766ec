//! User/bot repository: users, the bot registry, and per-(user, bot) prompts.
//!
//! Backs the /start find-or-create flow, the /setprompt guard lookups, the
//! /bots listing, and startup seeding of configured bots.

use tracing::info;

use crate::error::StorageError;
use crate::models::{BotRecord, NewUser, UserBotSetting, UserRecord};
use crate::sqlite_pool::SqlitePoolManager;

pub struct BotUserRepository {
    pool_manager: SqlitePoolManager,
}

impl BotUserRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                name TEXT,
                username TEXT,
                telegram_id INTEGER UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                telegram_id INTEGER NOT NULL UNIQUE,
                first_name TEXT,
                last_name TEXT,
                username TEXT,
                language_code TEXT,
                is_bot BOOLEAN,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_bots (
                user_id INTEGER,
                bot_id INTEGER,
                prompt TEXT,
                is_active BOOLEAN DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (user_id, bot_id),
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (bot_id) REFERENCES bots (id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Looks a user up by Telegram id, creating the row on first contact.
    pub async fn find_or_create_user(&self, new_user: &NewUser) -> Result<UserRecord, StorageError> {
        if let Some(user) = self.get_user_by_telegram_id(new_user.telegram_id).await? {
            return Ok(user);
        }

        info!(
            telegram_id = new_user.telegram_id,
            username = ?new_user.username,
            "User not found. Creating new user"
        );

        let pool = self.pool_manager.pool();
        sqlx::query(
            r#"
            INSERT INTO users (telegram_id, first_name, last_name, username, language_code, is_bot)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_user.telegram_id)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.username)
        .bind(&new_user.language_code)
        .bind(new_user.is_bot)
        .execute(pool)
        .await?;

        self.get_user_by_telegram_id(new_user.telegram_id)
            .await?
            .ok_or_else(|| {
                StorageError::NotFound(format!(
                    "user {} missing right after insert",
                    new_user.telegram_id
                ))
            })
    }

    pub async fn get_user_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> Result<Option<UserRecord>, StorageError> {
        let pool = self.pool_manager.pool();
        let user = sqlx::query_as("SELECT * FROM users WHERE telegram_id = ?")
            .bind(telegram_id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn get_bot_by_token(&self, token: &str) -> Result<Option<BotRecord>, StorageError> {
        let pool = self.pool_manager.pool();
        let bot = sqlx::query_as("SELECT * FROM bots WHERE token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;
        Ok(bot)
    }

    /// Registers or renames a bot by token. Used by startup seeding.
    pub async fn upsert_bot(&self, token: &str, name: &str) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();
        sqlx::query(
            r#"
            INSERT INTO bots (token, name) VALUES (?, ?)
            ON CONFLICT(token) DO UPDATE SET
            name = excluded.name,
            updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(token)
        .bind(name)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_all_bots(&self) -> Result<Vec<BotRecord>, StorageError> {
        let pool = self.pool_manager.pool();
        let bots = sqlx::query_as("SELECT * FROM bots ORDER BY id")
            .fetch_all(pool)
            .await?;
        Ok(bots)
    }

    /// Stores (or replaces) the custom prompt for a (user, bot) pair.
    pub async fn set_user_bot_prompt(
        &self,
        user_id: i64,
        bot_id: i64,
        prompt: &str,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();
        sqlx::query(
            r#"
            INSERT INTO user_bots (user_id, bot_id, prompt) VALUES (?, ?, ?)
            ON CONFLICT(user_id, bot_id) DO UPDATE SET
            prompt = excluded.prompt,
            updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(user_id)
        .bind(bot_id)
        .bind(prompt)
        .execute(pool)
        .await?;

        info!(user_id, bot_id, "User prompt updated");
        Ok(())
    }

    pub async fn get_user_bot_prompt(
        &self,
        user_id: i64,
        bot_id: i64,
    ) -> Result<Option<String>, StorageError> {
        let pool = self.pool_manager.pool();
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT prompt FROM user_bots WHERE user_id = ? AND bot_id = ?")
                .bind(user_id)
                .bind(bot_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.and_then(|(prompt,)| prompt))
    }

    /// All per-bot settings for one user; used by the /bots listing.
    pub async fn get_user_bots(&self, user_id: i64) -> Result<Vec<UserBotSetting>, StorageError> {
        let pool = self.pool_manager.pool();
        let settings =
            sqlx::query_as("SELECT bot_id, prompt FROM user_bots WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        Ok(settings)
    }
}
