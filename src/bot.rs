// src/bot.rs
//! Telegram command surface: `/start` begins monitoring a chat, `/stop` ends it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::engine::{CycleReport, DiscoveryCycle};
use crate::error::FetchError;
use crate::notify::telegram::TelegramClient;
use crate::notify::{ChatId, DynNotifier, Pass};
use crate::scheduler::start_monitoring;
use crate::session::SessionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

/// `/start`, `/start@SomeBot`, `/start payload` → `Start`. Anything else is ignored.
pub fn parse_command(text: &str) -> Option<Command> {
    let head = text.split_whitespace().next()?;
    let name = head.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    match name.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "stop" => Some(Command::Stop),
        _ => None,
    }
}

/// "каждый час", "каждые 15 мин.", "каждые 90 сек."
pub fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        3600 => "каждый час".to_string(),
        s if s % 3600 == 0 => format!("каждые {} ч.", s / 3600),
        s if s % 60 == 0 => format!("каждые {} мин.", s / 60),
        s => format!("каждые {s} сек."),
    }
}

pub struct BotDispatcher {
    replies: DynNotifier,
    cycle: Arc<DiscoveryCycle>,
    registry: Arc<SessionRegistry>,
    interval: Duration,
}

impl BotDispatcher {
    pub fn new(
        replies: DynNotifier,
        cycle: Arc<DiscoveryCycle>,
        registry: Arc<SessionRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            replies,
            cycle,
            registry,
            interval,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    async fn reply(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.replies.send(chat, text).await {
            warn!(error = %format!("{e:#}"), %chat, "reply failed");
        }
    }

    async fn report_cycle(&self, chat: ChatId, result: &Result<CycleReport, FetchError>) {
        match result {
            Ok(report) => self.reply(chat, &report.outcome().message()).await,
            Err(e) => {
                let text = format!(
                    "⚠️ Не удалось загрузить список вакансий ({}). Попробую снова при следующей проверке.",
                    html_escape::encode_text(&e.to_string())
                );
                self.reply(chat, &text).await;
            }
        }
    }

    /// Handle one incoming text message.
    pub async fn handle_text(&self, chat: ChatId, text: &str) {
        match parse_command(text) {
            Some(Command::Start) => self.start(chat).await,
            Some(Command::Stop) => self.stop(chat).await,
            None => {}
        }
    }

    async fn start(&self, chat: ChatId) {
        let (session, fresh) = self.registry.get_or_create(chat);
        if !fresh {
            // Already monitored: one extra pass over the same ledger, no second loop.
            self.reply(chat, "🔄 Мониторинг уже включён. Проверяю текущие вакансии...")
                .await;
            let result = self.cycle.run_once(&session, Pass::Manual).await;
            if !session.is_cancelled() {
                self.report_cycle(chat, &result).await;
            }
            return;
        }

        info!(%chat, "monitoring requested");
        self.reply(chat, "🚀 Парсер запущен! Проверяю текущие вакансии...")
            .await;

        let (first, handle) =
            start_monitoring(self.cycle.clone(), session.clone(), self.interval).await;
        if !self.registry.attach(&session, handle) {
            info!(%chat, "monitoring stopped before the first cycle finished");
            return;
        }
        self.report_cycle(chat, &first).await;

        let text = format!(
            "Мониторинг включён. Буду присылать новые вакансии {}.",
            describe_interval(self.interval)
        );
        self.reply(chat, &text).await;
    }

    async fn stop(&self, chat: ChatId) {
        if self.registry.stop(chat) {
            info!(%chat, "monitoring stopped");
            self.reply(chat, "⏹ Мониторинг остановлен.").await;
        } else {
            self.reply(chat, "Мониторинг не запущен. Отправьте /start.")
                .await;
        }
    }

    /// Long-poll Telegram until `shutdown` fires. Each update is handled on its own task.
    pub async fn run(self: Arc<Self>, api: TelegramClient, shutdown: CancellationToken) -> Result<()> {
        let mut offset: i64 = 0;
        info!("bot dispatcher started");
        loop {
            let updates = tokio::select! {
                _ = shutdown.cancelled() => break,
                res = api.get_updates(offset) => res,
            };
            let updates = match updates {
                Ok(u) => u,
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "getUpdates failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(3)) => continue,
                    }
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(msg) = update.message else { continue };
                let Some(text) = msg.text else { continue };
                let chat = ChatId(msg.chat.id);
                let this = self.clone();
                tokio::spawn(async move {
                    this.handle_text(chat, &text).await;
                });
            }
        }

        self.registry.shutdown().await;
        info!("bot dispatcher stopped");
        Ok(())
    }
}
