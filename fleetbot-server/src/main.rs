//! fleetbot-server: webhook backend for several Telegram bots sharing one
//! process. Config from env (.env supported); CLI flags override the basics.

use std::net::SocketAddr;
use std::sync::Arc;

use ai_client::{create_provider, AiSettings};
use anyhow::{Context, Result};
use bot_handlers::{BotContext, UpdateRouter};
use clap::Parser;
use fleetbot_server::app::{build_router, AppState};
use fleetbot_server::config::AppConfig;
use fleetbot_server::seed;
use session::{PromptStateMachine, SessionSweeper};
use storage::{BotUserRepository, SessionRepository, SqlitePoolManager};
use telegram_api::{BotApi, TelegramApi};
use tracing::info;

#[derive(Parser)]
#[command(name = "fleetbot-server")]
#[command(about = "Multi-bot Telegram webhook backend", long_about = None)]
#[command(version)]
struct Cli {
    /// Override PORT from the environment.
    #[arg(short, long)]
    port: Option<u16>,
    /// Override DATABASE_URL from the environment.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Load configuration from environment")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }

    fleetbot_core::init_tracing(config.log_file.as_deref())?;

    let pool_manager = SqlitePoolManager::new(&config.database_url)
        .await
        .context("Open SQLite database (check DATABASE_URL)")?;
    let users_bots = Arc::new(BotUserRepository::new(pool_manager.clone()).await?);
    let sessions = Arc::new(SessionRepository::new(pool_manager.clone()).await?);

    seed::seed_bots(&users_bots, &config.bots).await?;

    let settings = AiSettings::from_env()?;
    let ai = create_provider(settings.text_provider, &settings)
        .context("Initialize text-generation provider (AI_PROVIDER)")?;
    let asr = if settings.asr_provider == settings.text_provider {
        ai.clone()
    } else {
        create_provider(settings.asr_provider, &settings)
            .context("Initialize transcription provider (ASR_PROVIDER)")?
    };

    let api: Arc<dyn BotApi> = Arc::new(TelegramApi::new());
    let machine = Arc::new(PromptStateMachine::new(
        sessions.clone(),
        users_bots.clone(),
        api.clone(),
    ));

    let sweeper = Arc::new(
        SessionSweeper::new(sessions.clone(), machine.clone())
            .with_interval(config.sweep_interval),
    );
    sweeper.start();

    let ctx = BotContext {
        sessions,
        users_bots,
        machine,
        api,
        ai,
        asr,
    };
    let state = AppState {
        router: Arc::new(UpdateRouter::new(ctx)),
        webhook_secret: config.webhook_secret.clone(),
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Parse HOST/PORT into a socket address")?;
    info!(%addr, "Starting webhook server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The sweeper must be fully stopped before the process exits.
    sweeper.stop().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
