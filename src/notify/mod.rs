// src/notify/mod.rs
//! Delivery of relevant postings to a subscriber chat.

pub mod telegram;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::ingest::types::Candidate;

/// Telegram chat id; the delivery target of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which kind of pass produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// First cycle right after /start.
    Initial,
    /// Scheduled cycle.
    Periodic,
    /// /start on an already monitored chat.
    Manual,
}

impl Pass {
    fn prefix(self) -> &'static str {
        match self {
            Pass::Initial | Pass::Manual => "📌",
            Pass::Periodic => "🆕",
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// `text` is Telegram HTML.
    async fn send(&self, chat: ChatId, text: &str) -> Result<()>;
}

pub type DynNotifier = Arc<dyn Notifier>;

/// `📌 <b>title</b>\n🔗 url`, title HTML-escaped.
pub fn format_candidate(pass: Pass, c: &Candidate) -> String {
    format!(
        "{} <b>{}</b>\n🔗 {}",
        pass.prefix(),
        html_escape::encode_text(&c.title),
        c.url
    )
}

/// Prints messages instead of delivering them (dry runs).
pub struct StdoutNotifier;

#[async_trait::async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, chat: ChatId, text: &str) -> Result<()> {
        println!("[chat {chat}]\n{text}\n");
        Ok(())
    }
}
