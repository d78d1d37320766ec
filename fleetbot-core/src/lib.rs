//! # fleetbot-core
//!
//! Core types for the multi-bot Telegram backend: [`ChatMessage`], [`SessionState`],
//! error types, and tracing initialization. Transport-agnostic; used by every other crate.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{CoreError, Result};
pub use logger::init_tracing;
pub use types::{ChatMessage, MessageRole, SessionState, DEFAULT_SYSTEM_PROMPT};
