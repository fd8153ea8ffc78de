// src/relevance.rs
//! Keyword relevance gate: tokenizer and the tri-state keyword classifier.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Outcome of the keyword stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Relevant,
    Irrelevant,
    Undecided,
}

// \w is Unicode-aware by default, so Cyrillic words stay whole.
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("tokenizer regex"));

/// Lower-case and split into word tokens; any run of non-word characters is a boundary.
pub fn tokenize(input: &str) -> Vec<String> {
    let lower = input.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Short, non-reversible id for log lines. Raw posting text is never logged.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Deterministic keyword filter. Negative vocabulary wins over positive.
///
/// Each configured keyword is tokenized with the same tokenizer as the input, so
/// `"чат-бот"` and `"tg bot"` become two-token phrases that must appear
/// contiguously. Single-word keywords match whole tokens only: `"бот"` never
/// matches inside `"ботинок"`.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    positive: Vec<Vec<String>>,
    negative: Vec<Vec<String>>,
}

impl KeywordClassifier {
    pub fn new<S: AsRef<str>>(positive: &[S], negative: &[S]) -> Self {
        Self {
            positive: compile_phrases(positive),
            negative: compile_phrases(negative),
        }
    }

    pub fn classify(&self, title: &str, description: &str) -> Verdict {
        let tokens = tokenize(&format!("{title} {description}"));

        let verdict = if let Some(hit) = first_hit(&tokens, &self.negative) {
            debug!(target: "relevance", keyword = %hit, "negative keyword");
            Verdict::Irrelevant
        } else if let Some(hit) = first_hit(&tokens, &self.positive) {
            debug!(target: "relevance", keyword = %hit, "positive keyword");
            Verdict::Relevant
        } else {
            Verdict::Undecided
        };

        debug!(
            target: "relevance",
            id = %anon_hash(title),
            tokens = tokens.len(),
            ?verdict
        );
        verdict
    }
}

fn compile_phrases<S: AsRef<str>>(words: &[S]) -> Vec<Vec<String>> {
    words
        .iter()
        .map(|w| tokenize(w.as_ref()))
        .filter(|p| !p.is_empty())
        .collect()
}

fn first_hit(tokens: &[String], phrases: &[Vec<String>]) -> Option<String> {
    phrases
        .iter()
        .find(|p| contains_phrase(tokens, p))
        .map(|p| p.join(" "))
}

fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    match phrase {
        [] => false,
        [single] => tokens.iter().any(|t| t == single),
        _ => tokens.windows(phrase.len()).any(|w| w == phrase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::new(
            &["телеграм", "telegram", "бот", "бота", "чат-бот", "tg bot"],
            &["ботинки", "ботинок", "ботаник"],
        )
    }

    #[test]
    fn tokenizer_splits_on_punctuation_and_lowercases() {
        let toks = tokenize("Нужен Telegram-бот, срочно!");
        assert_eq!(toks, vec!["нужен", "telegram", "бот", "срочно"]);
    }

    #[test]
    fn negative_short_circuits_positive() {
        let c = classifier();
        assert_eq!(c.classify("Бот и ботинки", ""), Verdict::Irrelevant);
    }

    #[test]
    fn substring_does_not_match() {
        let c = classifier();
        // "ботинками" is neither a positive nor a negative token.
        assert_eq!(c.classify("Чистка обуви", "ботинками"), Verdict::Undecided);
    }

    #[test]
    fn multi_token_phrase_needs_adjacency() {
        let c = KeywordClassifier::new(&["tg bot"], &[] as &[&str]);
        assert_eq!(c.classify("Need a TG bot", ""), Verdict::Relevant);
        assert_eq!(c.classify("tg channel and a bot", ""), Verdict::Undecided);
    }

    #[test]
    fn description_is_searched_too() {
        let c = classifier();
        assert_eq!(c.classify("Нужен помощник", "сделать бота"), Verdict::Relevant);
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        assert_eq!(anon_hash("x").len(), 12);
        assert_eq!(anon_hash("x"), anon_hash("x"));
    }
}
