//! Outbound message delivery to chat channels.

mod telegram;

pub use telegram::TelegramMessenger;

use async_trait::async_trait;

/// Delivers a bot utterance to a channel.
///
/// Returns whether delivery succeeded. The dialog treats a failure as a
/// signal to abandon the order in progress; nothing is retried.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> bool;
}
