use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::{ChatId, Notifier};
use crate::config::TelegramConfig;

/// Minimal Bot API client: sendMessage + getUpdates long polling.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base: String, // {api_base}/bot{token}
    long_poll_secs: u64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl TelegramClient {
    pub fn new(cfg: &TelegramConfig) -> Result<Self> {
        // Request timeout must outlast the long poll.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(cfg.long_poll_secs + 15))
            .build()
            .context("building telegram http client")?;
        Ok(Self {
            client,
            base: format!(
                "{}/bot{}",
                cfg.api_base.trim_end_matches('/'),
                cfg.bot_token
            ),
            long_poll_secs: cfg.long_poll_secs,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base)
    }

    pub async fn send_message(&self, chat: ChatId, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat.0,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        let rsp: ApiResponse<serde_json::Value> = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .context("telegram sendMessage")?
            .json()
            .await
            .context("telegram sendMessage body")?;
        if !rsp.ok {
            return Err(anyhow!(
                "telegram sendMessage rejected: {}",
                rsp.description.unwrap_or_default()
            ));
        }
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": self.long_poll_secs,
            "allowed_updates": ["message"],
        });
        let rsp: ApiResponse<Vec<Update>> = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&body)
            .send()
            .await
            .context("telegram getUpdates")?
            .json()
            .await
            .context("telegram getUpdates body")?;
        if !rsp.ok {
            return Err(anyhow!(
                "telegram getUpdates rejected: {}",
                rsp.description.unwrap_or_default()
            ));
        }
        Ok(rsp.result.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, chat: ChatId, text: &str) -> Result<()> {
        self.send_message(chat, text).await
    }
}
