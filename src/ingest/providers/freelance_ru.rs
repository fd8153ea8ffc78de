// src/ingest/providers/freelance_ru.rs
use anyhow::Context;
use async_trait::async_trait;
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::ingest::types::{Candidate, SourceProvider};
use crate::ingest::{absolute_url, normalize_text};

static CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.project-item-default-card").expect("card selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2.title").expect("title selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("link selector"));
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.description").expect("description selector"));

/// Listing page provider for freelance.ru project search.
pub struct FreelanceRuProvider {
    client: reqwest::Client,
    url: String,
    base_url: String,
}

impl FreelanceRuProvider {
    pub fn new(cfg: &SourceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .context("building listing http client")?;
        Ok(Self {
            client,
            url: cfg.url.clone(),
            base_url: cfg.base_url.clone(),
        })
    }
}

/// Extract candidates from a listing page, in page order.
/// Cards without a title heading or title link are skipped.
pub fn parse_listing(html: &str, base_url: &str) -> Vec<Candidate> {
    let t0 = std::time::Instant::now();
    let doc = Html::parse_document(html);

    let mut out = Vec::new();
    for card in doc.select(&CARD) {
        let Some(title_tag) = card.select(&TITLE).next() else {
            continue;
        };
        let Some(link_tag) = title_tag.select(&LINK).next() else {
            continue;
        };

        let href = link_tag.value().attr("href").unwrap_or_default();
        let url = absolute_url(base_url, href);
        let title = element_text(link_tag);
        let description = card
            .select(&DESCRIPTION)
            .next()
            .map(element_text)
            .unwrap_or_default();

        out.push(Candidate::from_link(&title, &url, &description));
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("watch_parse_ms").record(ms);
    out
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<String>())
}

#[async_trait]
impl SourceProvider for FreelanceRuProvider {
    async fn fetch_latest(&self) -> Result<Vec<Candidate>, FetchError> {
        let resp = self.client.get(&self.url).send().await.inspect_err(|e| {
            tracing::warn!(error = %e, provider = "freelance.ru", "listing http error");
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = resp.text().await?;
        let items = parse_listing(&body, &self.base_url);
        counter!("watch_candidates_total").increment(items.len() as u64);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "freelance.ru"
    }
}
