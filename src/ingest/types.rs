// src/ingest/types.rs
use crate::error::FetchError;

/// One posting discovered on the listing page.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,          // derived from url, sole dedup key
    pub title: String,       // normalized text
    pub url: String,         // absolute link, sent verbatim
    pub description: String, // may be empty
}

impl Candidate {
    /// Build a candidate whose id is derived from `url`.
    pub fn from_link(title: &str, url: &str, description: &str) -> Self {
        Self {
            id: crate::ingest::project_id_from_url(url),
            title: title.to_string(),
            url: url.to_string(),
            description: description.to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    /// One best-effort fetch of the listing. No retries, no filtering.
    async fn fetch_latest(&self) -> Result<Vec<Candidate>, FetchError>;
    fn name(&self) -> &'static str;
}
