//! Startup bot seeding: upsert every configured bot by token so webhook traffic
//! for those tokens resolves to a registered bot row.

use anyhow::Result;
use storage::BotUserRepository;
use tracing::{info, warn};

use crate::config::BotSeed;

pub async fn seed_bots(repo: &BotUserRepository, bots: &[BotSeed]) -> Result<()> {
    if bots.is_empty() {
        warn!("No bots configured; set TELEGRAM_BOT_1_TOKEN (and optionally TELEGRAM_BOT_1_NAME)");
        return Ok(());
    }

    for bot in bots {
        repo.upsert_bot(&bot.token, &bot.name).await?;
        info!(name = %bot.name, "Seeded bot");
    }

    info!(count = bots.len(), "Bot seeding complete");
    Ok(())
}
