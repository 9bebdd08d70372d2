// Notifier port - how core services reach users outside the Mini App.
//
// The only implementation that matters in production talks to the
// Telegram Bot API (see infra), but core code depends on this trait so
// tests can record messages instead of sending them.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram api error: {0}")]
    Api(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a plain-text message to a Telegram chat. Chat ids equal
    /// user ids for direct messages.
    async fn send_message(&self, chat_id: u64, text: &str) -> Result<(), NotifyError>;
}
