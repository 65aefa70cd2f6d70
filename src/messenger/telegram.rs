//! Telegram delivery over the Bot API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use super::Messenger;

const TELEGRAM_API_HOST: &str = "https://api.telegram.org";

/// Messenger that calls the Bot API `sendMessage` method directly.
pub struct TelegramMessenger {
    client: Client,
    base_url: String,
}

impl TelegramMessenger {
    pub fn new(bot_token: &str) -> Self {
        Self::with_api_host(bot_token, TELEGRAM_API_HOST)
    }

    /// Point at a different API host (used by tests).
    pub fn with_api_host(bot_token: &str, api_host: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: format!("{api_host}/bot{bot_token}"),
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, chat_id: &str, text: &str) -> bool {
        let result = self
            .client
            .get(format!("{}/sendMessage", self.base_url))
            .query(&[("chat_id", chat_id), ("text", text)])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    status = %response.status(),
                    chat_id = %chat_id,
                    "telegram rejected message"
                );
                false
            }
            Err(e) => {
                warn!(error = %e, chat_id = %chat_id, "failed to reach telegram");
                false
            }
        }
    }
}
