//! AI adapter: yes/no relevance check through an OpenRouter-compatible chat API.
//!
//! Fail-closed: any transport error, non-2xx status, malformed body or answer
//! other than the yes token counts as "not relevant". Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::ClassifierError;
use crate::relevance::anon_hash;

/// Max chars of a raw response emitted on the `ai_debug` target.
const DEBUG_RAW_CAP: usize = 800;

#[async_trait]
pub trait AiClassifier: Send + Sync {
    /// One classification call. Errors stay typed so callers can log them.
    async fn classify(&self, title: &str, description: &str) -> Result<bool, ClassifierError>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;

    /// Fail-closed wrapper: errors become `false`.
    async fn is_relevant(&self, title: &str, description: &str) -> bool {
        counter!("watch_ai_calls_total").increment(1);
        match self.classify(title, description).await {
            Ok(v) => v,
            Err(e) => {
                counter!("watch_ai_failures_total").increment(1);
                tracing::warn!(
                    error = %e,
                    provider = self.provider_name(),
                    id = %anon_hash(title),
                    "ai classification failed, treating as not relevant"
                );
                false
            }
        }
    }
}

pub type DynAiClassifier = Arc<dyn AiClassifier>;

/// Build a classifier according to config.
pub fn build_classifier(cfg: &AiConfig) -> anyhow::Result<DynAiClassifier> {
    if !cfg.enabled {
        return Ok(Arc::new(DisabledClassifier));
    }
    Ok(Arc::new(OpenRouterClassifier::new(cfg)?))
}

/// Prompt sent for one project.
pub fn build_prompt(instruction: &str, title: &str, description: &str) -> String {
    format!("{instruction}\n\nНазвание: {title}\nОписание: {description}")
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMsg>,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

/// Interpret a raw chat-completions body.
///
/// Takes the first choice's message content, lower-cases it, drops every
/// non-alphabetic char and compares with `yes_token`.
pub fn parse_verdict(raw: &str, yes_token: &str) -> Result<bool, ClassifierError> {
    let body: Resp = serde_json::from_str(raw)?;
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or(ClassifierError::MissingContent)?;

    let clean: String = content
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    Ok(clean == yes_token.to_lowercase())
}

fn raw_excerpt(raw: &str) -> String {
    raw.chars().take(DEBUG_RAW_CAP).collect()
}

/// Chat Completions over HTTP with bearer auth.
pub struct OpenRouterClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    instruction: String,
    yes_token: String,
    debug_raw: bool,
}

impl OpenRouterClassifier {
    pub fn new(cfg: &AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("freelance-watch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .context("building ai http client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            instruction: cfg.prompt.clone(),
            yes_token: cfg.yes_token.clone(),
            debug_raw: cfg.debug_raw,
        })
    }

    // Diagnostic side channel: raw bodies go to a dedicated tracing target only.
    fn debug_sink(&self, prompt: &str, status: reqwest::StatusCode, raw: &str) {
        if !self.debug_raw {
            return;
        }
        let shown = raw_excerpt(raw);
        tracing::debug!(
            target: "ai_debug",
            prompt = %anon_hash(prompt),
            status = status.as_u16(),
            raw = %shown,
            "ai raw response"
        );
    }
}

#[async_trait]
impl AiClassifier for OpenRouterClassifier {
    async fn classify(&self, title: &str, description: &str) -> Result<bool, ClassifierError> {
        if self.api_key.is_empty() {
            return Err(ClassifierError::MissingKey);
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        let prompt = build_prompt(&self.instruction, title, description);
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;
        self.debug_sink(&prompt, status, &raw);

        if !status.is_success() {
            return Err(ClassifierError::Status(status));
        }
        let verdict = parse_verdict(&raw, &self.yes_token)?;
        tracing::debug!(id = %anon_hash(title), verdict, "ai verdict");
        Ok(verdict)
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}

/// Always answers "not relevant"; used when AI is disabled.
pub struct DisabledClassifier;

#[async_trait]
impl AiClassifier for DisabledClassifier {
    async fn classify(&self, _title: &str, _description: &str) -> Result<bool, ClassifierError> {
        Ok(false)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}
