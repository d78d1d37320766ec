//! Server configuration from environment variables.
//!
//! Bot tokens are configured in numbered slots (`TELEGRAM_BOT_1_TOKEN`,
//! `TELEGRAM_BOT_1_NAME`, ...) up to `MAX_PREDEFINED_BOTS` slots; empty slots are
//! skipped. Everything is loaded once at startup; there is no hot reload.

use std::env;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_PREDEFINED_BOTS: usize = 10;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

/// One configured bot: its API token and a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotSeed {
    pub token: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub webhook_secret: Option<String>,
    pub sweep_interval: Duration,
    pub log_file: Option<String>,
    pub bots: Vec<BotSeed>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment, tests pass a map.
    pub fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match get("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT is not a valid port number: {}", value))?,
            None => DEFAULT_PORT,
        };

        let sweep_interval_secs = match get("SWEEP_INTERVAL_SECS") {
            Some(value) => value.parse().map_err(|_| {
                anyhow::anyhow!("SWEEP_INTERVAL_SECS is not a valid number: {}", value)
            })?,
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "fleetbot.db".to_string()),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            webhook_secret: get("TELEGRAM_WEBHOOK_SECRET").filter(|v| !v.is_empty()),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            log_file: get("LOG_FILE").filter(|v| !v.is_empty()),
            bots: load_bot_seeds(get),
        })
    }
}

/// Reads the numbered bot slots. A slot without a token is skipped; a skipped
/// slot that carries a name is worth a warning, since someone half-configured it.
fn load_bot_seeds(get: &dyn Fn(&str) -> Option<String>) -> Vec<BotSeed> {
    let max_slots = get("MAX_PREDEFINED_BOTS")
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_MAX_PREDEFINED_BOTS);

    let mut bots = Vec::new();
    for slot in 1..=max_slots {
        let name = get(&format!("TELEGRAM_BOT_{}_NAME", slot));
        match get(&format!("TELEGRAM_BOT_{}_TOKEN", slot)).filter(|t| !t.is_empty()) {
            Some(token) => {
                let name = name.unwrap_or_else(|| format!("Bot{}", slot));
                info!(slot, name = %name, "Loaded bot configuration");
                bots.push(BotSeed { token, name });
            }
            None => {
                if let Some(name) = name {
                    warn!(slot, name = %name, "Bot slot has a name but no token; skipping");
                }
            }
        }
    }
    bots
}
