//! Storage crate: SQLite persistence for sessions, users, bots, and prompts.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`history`] – History append-and-trim policy
//! - [`models`] – ChatSession, UserRecord, BotRecord, NewUser, UserBotSetting
//! - [`session_repo`] – SessionRepository (chat_sessions table)
//! - [`bot_user_repo`] – BotUserRepository (users, bots, user_bots tables)
//! - [`sqlite_pool`] – SqlitePoolManager

mod bot_user_repo;
mod chat_locks;
mod error;
pub mod history;
mod models;
mod session_repo;
mod sqlite_pool;

#[cfg(test)]
mod bot_user_repo_test;

pub use bot_user_repo::BotUserRepository;
pub use error::StorageError;
pub use history::MAX_HISTORY_MESSAGES;
pub use models::{BotRecord, ChatSession, ExpiredSession, NewUser, UserBotSetting, UserRecord};
pub use session_repo::SessionRepository;
pub use sqlite_pool::SqlitePoolManager;
