//! # fleetbot-server
//!
//! Webhook endpoint and composition root. [`config`] loads everything from the
//! environment, [`seed`] registers the configured bots, and [`app`] exposes the
//! axum router handling `POST /telegram/webhook/:bot_token`.

pub mod app;
pub mod config;
pub mod seed;

pub use app::{build_router, AppState};
pub use config::{AppConfig, BotSeed};
