//! Telegram webhook schema and handler.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::server::AppState;

// ============================================================================
// Webhook Schema
// ============================================================================

/// One update pushed by Telegram to the webhook.
///
/// Only the fields the dialog engine needs are modeled; everything else in
/// the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// Reply relayed back in the webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub bot_text: String,
}

// ============================================================================
// Handler
// ============================================================================

/// POST /{bot_token}/
pub async fn webhook(
    State(state): State<AppState>,
    Json(update): Json<TelegramUpdate>,
) -> Json<WebhookResponse> {
    let Some(message) = update.message else {
        debug!(update_id = update.update_id, "ignoring update without message");
        return Json(WebhookResponse {
            bot_text: String::new(),
        });
    };
    let Some(text) = message.text else {
        debug!(update_id = update.update_id, "ignoring message without text");
        return Json(WebhookResponse {
            bot_text: String::new(),
        });
    };

    let chat_id = message.chat.id.to_string();
    let dialog = state.telegram.get_or_create(&chat_id);
    let bot_text = dialog.lock().await.consume(&text).await;

    Json(WebhookResponse { bot_text })
}
