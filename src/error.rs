// src/error.rs
//! Error taxonomy for the watch pipeline.
//!
//! Fetch errors abort a single cycle. Classifier errors never leave the candidate
//! they belong to: callers collapse them into "not relevant".

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("listing request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("listing returned HTTP {0}")]
    Status(StatusCode),
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classifier returned HTTP {0}")]
    Status(StatusCode),
    #[error("classifier response is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("classifier response has no message content")]
    MissingContent,
    #[error("classifier has no API key configured")]
    MissingKey,
}
