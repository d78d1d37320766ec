//! The axum application: webhook intake and health probe.
//!
//! `POST /telegram/webhook/:bot_token` validates the shared secret (when one is
//! configured), unwraps the update, and hands the message to the dispatcher.
//! Handling is awaited before responding; collaborator latency is bounded only
//! by the collaborators themselves.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bot_handlers::UpdateRouter;
use serde_json::json;
use telegram_api::{mask_token, TelegramUpdate};
use tracing::{error, info, warn};

const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<UpdateRouter>,
    pub webhook_secret: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/telegram/webhook/:bot_token", post(telegram_webhook))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "fleetbot-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn telegram_webhook(
    State(state): State<AppState>,
    Path(bot_token): Path<String>,
    headers: HeaderMap,
    Json(update): Json<TelegramUpdate>,
) -> impl IntoResponse {
    if let Some(expected) = &state.webhook_secret {
        let received = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if received != Some(expected.as_str()) {
            error!(
                bot = %mask_token(&bot_token),
                "Webhook error: Invalid X-Telegram-Bot-Api-Secret-Token"
            );
            return (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "status": "error",
                    "message": "Forbidden: Invalid secret token",
                })),
            );
        }
    }

    info!(bot = %mask_token(&bot_token), update_id = update.update_id, "Webhook event received");

    let Some(message) = &update.message else {
        warn!(
            update_id = update.update_id,
            "Received an update without a message body"
        );
        return (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "message": "Non-message update received",
            })),
        );
    };

    info!(
        message_id = message.message_id,
        chat_id = message.chat.id,
        "Processing message update"
    );
    state.router.dispatch(&bot_token, message).await;

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "message": "Webhook processed",
        })),
    )
}
