// Telegram Bot API client implementing the core Notifier port.
//
// One method is all we need: sendMessage. The Bot API wraps every
// response in {"ok": bool, "description": ...}, so a 200 can still be a
// failure and we check both layers.

use crate::core::notifications::{Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

pub struct TelegramNotifier {
    client: Client,
    /// None means notifications are disabled (no token configured).
    token: Option<String>,
}

impl TelegramNotifier {
    pub fn new(token: Option<String>) -> Self {
        if token.is_none() {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set, notifications are disabled");
        }
        Self {
            client: Client::new(),
            token,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, chat_id: u64, text: &str) -> Result<(), NotifyError> {
        let Some(token) = &self.token else {
            tracing::debug!(chat_id, "dropping notification, no bot token");
            return Ok(());
        };

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api(format!("{} - {}", status, body)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !body["ok"].as_bool().unwrap_or(false) {
            let description = body["description"].as_str().unwrap_or("unknown error");
            return Err(NotifyError::Api(description.to_string()));
        }

        Ok(())
    }
}
