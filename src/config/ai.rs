// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_AI_MODEL: &str = "AI_MODEL";

pub const DEFAULT_PROMPT: &str = "Определи, относится ли проект к разработке Telegram-ботов. \
Учитывай только задачи по написанию, настройке, запуску или правке Telegram-ботов. \
Игнорируй любые работы, не связанные с Telegram.\n\
Ответь строго одним словом: да или нет.";

fn default_enabled() -> bool {
    true
}
fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_max_tokens() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}
fn default_yes_token() -> String {
    "да".to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// OpenRouter-compatible chat completions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENROUTER_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Instruction placed before the project title and description.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// The single answer counted as "relevant" after cleanup.
    #[serde(default = "default_yes_token")]
    pub yes_token: String,
    /// Emit raw AI responses on the `ai_debug` tracing target.
    #[serde(default)]
    pub debug_raw: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: default_api_key(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            prompt: default_prompt(),
            yes_token: default_yes_token(),
            debug_raw: false,
        }
    }
}

// Keeps the key out of logs.
impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("enabled", &self.enabled)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("key_len", &self.api_key.len())
            .field("max_tokens", &self.max_tokens)
            .field("yes_token", &self.yes_token)
            .field("debug_raw", &self.debug_raw)
            .finish()
    }
}

impl AiConfig {
    /// Resolve `api_key = "ENV"` from the environment.
    /// A disabled classifier needs no key.
    pub fn resolve_api_key(&mut self) -> anyhow::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_OPENROUTER_API_KEY)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("Missing {ENV_OPENROUTER_API_KEY} env var"))?;
        }
        if self.api_key.trim().is_empty() {
            anyhow::bail!("ai.api_key is empty while AI classification is enabled");
        }
        Ok(())
    }

    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(model) = env::var(ENV_AI_MODEL) {
            let model = model.trim();
            if !model.is_empty() {
                self.model = model.to_string();
            }
        }
        // Sanitize: at least one token so the service can say "да".
        if self.max_tokens == 0 {
            self.max_tokens = default_max_tokens();
        }
        self.yes_token = self.yes_token.trim().to_lowercase();
        if self.yes_token.is_empty() {
            self.yes_token = default_yes_token();
        }
    }
}
