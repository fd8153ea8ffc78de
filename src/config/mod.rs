// src/config/mod.rs
//! Watch configuration: TOML file + env overrides + secret resolution.
//!
//! Lookup order for the file:
//! 1) $WATCH_CONFIG_PATH
//! 2) config/watch.toml
//! 3) built-in defaults
//!
//! Secrets use the `"ENV"` indirection (`telegram.bot_token`, `ai.api_key`).

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use ai::AiConfig;

pub const ENV_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/watch.toml";
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub source: SourceConfig,
    pub keywords: KeywordsConfig,
    pub ai: AiConfig,
    pub poll: PollConfig,
    pub telegram: TelegramConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Listing page; query parameters are fixed here.
    pub url: String,
    /// Prefix for relative project links.
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://freelance.ru/project/search?q=&a=0&a=1&v=0&v=1&c=&c%5B%5D=724&c%5B%5D=4"
                .to_string(),
            base_url: "https://freelance.ru".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordsConfig {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        let positive = [
            "телеграм", "telegram", "бот", "бота", "чат-бот", "чатбот", "tg bot", "ботов",
        ];
        let negative = ["ботинки", "ботаник", "ботва", "ботинок"];
        Self {
            positive: positive.iter().map(|s| s.to_string()).collect(),
            negative: negative.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// "ENV" means: read from BOT_TOKEN
    pub bot_token: String,
    pub api_base: String,
    /// Long-poll timeout for getUpdates.
    pub long_poll_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: "ENV".to_string(),
            api_base: "https://api.telegram.org".to_string(),
            long_poll_secs: 30,
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token_len", &self.bot_token.len())
            .field("api_base", &self.api_base)
            .field("long_poll_secs", &self.long_poll_secs)
            .finish()
    }
}

impl TelegramConfig {
    pub fn resolve_token(&mut self) -> Result<()> {
        if self.bot_token.trim().eq_ignore_ascii_case("env") {
            self.bot_token = env::var(ENV_BOT_TOKEN)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("Missing {ENV_BOT_TOKEN} env var"))?;
        }
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token is empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// e.g. "127.0.0.1:9100"; metrics server stays off when unset.
    pub listen: Option<String>,
}

impl WatchConfig {
    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading watch config from {}", path.display()))?;
        let mut cfg: WatchConfig = toml::from_str(&content)
            .with_context(|| format!("parsing watch config {}", path.display()))?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load using env var + fallbacks (see module docs).
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let mut cfg = WatchConfig::default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(secs) = parse_interval_env(env::var(ENV_POLL_INTERVAL_SECS).ok()) {
            self.poll.interval_secs = secs;
        }
        if self.poll.interval_secs == 0 {
            self.poll.interval_secs = DEFAULT_POLL_INTERVAL_SECS;
        }
        if let Ok(addr) = env::var(ENV_METRICS_ADDR) {
            if !addr.trim().is_empty() {
                self.metrics.listen = Some(addr.trim().to_string());
            }
        }
        self.keywords.positive = clean_list(std::mem::take(&mut self.keywords.positive));
        self.keywords.negative = clean_list(std::mem::take(&mut self.keywords.negative));
        self.ai.apply_env_overrides();
    }
}

// Positive integers only; anything else keeps the configured value.
fn parse_interval_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::BTreeSet;
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim().to_lowercase();
        if !t.is_empty() {
            set.insert(t);
        }
    }
    set.into_iter().collect()
}
