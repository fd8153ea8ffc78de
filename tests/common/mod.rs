// tests/common/mod.rs
// Shared test doubles: scripted listing, scripted AI, recording notifier, stub HTTP server.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::Router;
use freelance_watch::ai_adapter::AiClassifier;
use freelance_watch::config::WatchConfig;
use freelance_watch::error::{ClassifierError, FetchError};
use freelance_watch::notify::{ChatId, Notifier};
use freelance_watch::{Candidate, DiscoveryCycle, SourceProvider};
use parking_lot::Mutex;
use reqwest::StatusCode;

pub const LISTING_HTML: &str = include_str!("../fixtures/listing.html");

pub fn cand(id: &str, title: &str, description: &str) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://x/{id}.html"),
        description: description.to_string(),
    }
}

/// The three postings used throughout the scenarios.
pub fn scenario_listing() -> Vec<Candidate> {
    vec![
        cand("123", "Нужен телеграм бот", ""),
        cand("456", "Продажа ботинок", "недорого"),
        cand("789", "Нужен помощник", "разобраться с настройками"),
    ]
}

/// Listing whose contents and health can be changed between cycles.
pub struct ScriptedSource {
    items: Mutex<Vec<Candidate>>,
    failing: AtomicBool,
    calls: AtomicUsize,
    delay: Mutex<Duration>,
}

impl ScriptedSource {
    pub fn new(items: Vec<Candidate>) -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(items),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn set_items(&self, items: Vec<Candidate>) {
        *self.items.lock() = items;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every fetch take `delay` (tokio time, so paused clocks apply).
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }
}

#[async_trait]
impl SourceProvider for ScriptedSource {
    async fn fetch_latest(&self) -> Result<Vec<Candidate>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Status(StatusCode::BAD_GATEWAY));
        }
        Ok(self.items.lock().clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// AI double: per-title answers, `Err` for titles marked as failing, `false` otherwise.
#[derive(Default)]
pub struct ScriptedAi {
    answers: Mutex<HashMap<String, bool>>,
    failing: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, title: &str, relevant: bool) {
        self.answers.lock().insert(title.to_string(), relevant);
    }

    pub fn fail_on(&self, title: &str) {
        self.failing.lock().push(title.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AiClassifier for ScriptedAi {
    async fn classify(&self, title: &str, _description: &str) -> Result<bool, ClassifierError> {
        self.calls.lock().push(title.to_string());
        if self.failing.lock().iter().any(|t| t == title) {
            return Err(ClassifierError::MissingContent);
        }
        Ok(self.answers.lock().get(title).copied().unwrap_or(false))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Records every message; messages containing a marker in `fail_on` fail to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ChatId, String)>>,
    fail_on: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, marker: &str) {
        self.fail_on.lock().push(marker.to_string());
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn sent_to(&self, chat: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(c, _)| *c == chat)
            .map(|(_, t)| t.clone())
            .collect()
    }

    /// Messages that carry a project link.
    pub fn project_messages(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.contains("🔗"))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        if self.fail_on.lock().iter().any(|m| text.contains(m.as_str())) {
            return Err(anyhow!("chat not found"));
        }
        self.sent.lock().push((chat, text.to_string()));
        Ok(())
    }
}

/// Cycle with the default keyword vocabularies and the given doubles.
pub fn make_cycle(
    source: Arc<ScriptedSource>,
    ai: Arc<ScriptedAi>,
    notifier: Arc<RecordingNotifier>,
) -> DiscoveryCycle {
    DiscoveryCycle::with_source(&WatchConfig::default(), source, ai, notifier)
}

/// Serve `router` on an ephemeral local port; returns the base url.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
