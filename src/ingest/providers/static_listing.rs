// src/ingest/providers/static_listing.rs
use async_trait::async_trait;

use crate::error::FetchError;
use crate::ingest::providers::freelance_ru::parse_listing;
use crate::ingest::types::{Candidate, SourceProvider};

/// Serves a saved listing page instead of hitting the network.
/// Used by `scan_once --fixture` and tests.
pub struct StaticListingProvider {
    // Own copy, so callers can hand in freshly read files.
    html: String,
    base_url: String,
}

impl StaticListingProvider {
    pub fn from_fixture(html: &str, base_url: &str) -> Self {
        Self {
            html: html.to_string(),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl SourceProvider for StaticListingProvider {
    async fn fetch_latest(&self) -> Result<Vec<Candidate>, FetchError> {
        Ok(parse_listing(&self.html, &self.base_url))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
