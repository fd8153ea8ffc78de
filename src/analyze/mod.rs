// src/analyze/mod.rs
//! Two-stage relevance: keyword gate first, AI only for undecided postings.

pub mod ai_adapter;

use crate::analyze::ai_adapter::DynAiClassifier;
use crate::relevance::{KeywordClassifier, Verdict};

/// Which stage produced the final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Keyword,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub relevant: bool,
    pub stage: Stage,
}

pub struct RelevanceClassifier {
    keywords: KeywordClassifier,
    ai: DynAiClassifier,
}

impl RelevanceClassifier {
    pub fn new(keywords: KeywordClassifier, ai: DynAiClassifier) -> Self {
        Self { keywords, ai }
    }

    /// Never fails: AI errors were already collapsed to "not relevant".
    pub async fn classify(&self, title: &str, description: &str) -> Classification {
        match self.keywords.classify(title, description) {
            Verdict::Relevant => Classification {
                relevant: true,
                stage: Stage::Keyword,
            },
            Verdict::Irrelevant => Classification {
                relevant: false,
                stage: Stage::Keyword,
            },
            Verdict::Undecided => Classification {
                relevant: self.ai.is_relevant(title, description).await,
                stage: Stage::Ai,
            },
        }
    }
}
