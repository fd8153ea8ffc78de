// src/engine.rs
//! Discovery cycle: fetch → skip seen → classify → record → notify.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::analyze::ai_adapter::{build_classifier, DynAiClassifier};
use crate::analyze::{RelevanceClassifier, Stage};
use crate::config::WatchConfig;
use crate::error::FetchError;
use crate::ingest::providers::freelance_ru::FreelanceRuProvider;
use crate::ingest::types::SourceProvider;
use crate::notify::{format_candidate, DynNotifier, Pass};
use crate::relevance::KeywordClassifier;
use crate::session::PollSession;

/// One-time metrics registration (so series show up on /metrics with help text).
pub fn describe_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watch_cycles_total", "Discovery cycles started.");
        describe_counter!(
            "watch_poll_ticks_total",
            "Scheduled poll ticks that started a cycle."
        );
        describe_counter!(
            "watch_fetch_errors_total",
            "Listing fetches that failed and aborted a cycle."
        );
        describe_counter!("watch_candidates_total", "Candidates parsed from the listing.");
        describe_counter!("watch_ai_calls_total", "AI classifier calls.");
        describe_counter!(
            "watch_ai_failures_total",
            "AI classifier calls that failed and were treated as not relevant."
        );
        describe_counter!("watch_notified_total", "Notifications delivered.");
        describe_counter!("watch_notify_errors_total", "Notifications that failed to send.");
        describe_histogram!("watch_cycle_ms", "Discovery cycle duration in milliseconds.");
        describe_histogram!("watch_parse_ms", "Listing parse time in milliseconds.");
        describe_gauge!("watch_last_cycle_ts", "Unix ts when a cycle last finished.");
    });
}

/// Result of one pass over the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub skipped_seen: usize,
    pub relevant: usize,
    pub notified: usize,
    pub notify_failed: usize,
    pub ai_calls: usize,
    pub cancelled: bool,
    pub finished_at: DateTime<Utc>,
}

/// What the subscriber is told after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    NoItems,
    NoneRelevant,
    Sent(usize),
    /// Some relevant postings were recorded but could not be delivered.
    PartlyDelivered { sent: usize, failed: usize },
}

impl CycleReport {
    fn new() -> Self {
        Self {
            fetched: 0,
            skipped_seen: 0,
            relevant: 0,
            notified: 0,
            notify_failed: 0,
            ai_calls: 0,
            cancelled: false,
            finished_at: Utc::now(),
        }
    }

    pub fn outcome(&self) -> CycleOutcome {
        if self.fetched == 0 {
            CycleOutcome::NoItems
        } else if self.relevant == 0 {
            CycleOutcome::NoneRelevant
        } else if self.notify_failed > 0 {
            CycleOutcome::PartlyDelivered {
                sent: self.notified,
                failed: self.notify_failed,
            }
        } else {
            CycleOutcome::Sent(self.notified)
        }
    }
}

impl CycleOutcome {
    /// Chat reply for the subscriber.
    pub fn message(self) -> String {
        match self {
            CycleOutcome::NoItems => "На данный момент вакансий нет.".to_string(),
            CycleOutcome::NoneRelevant => "На данный момент подходящих вакансий нет.".to_string(),
            CycleOutcome::Sent(n) => format!("Отправлено подходящих вакансий: {n}."),
            CycleOutcome::PartlyDelivered { sent, failed } => format!(
                "Отправлено подходящих вакансий: {sent}. Не удалось доставить: {failed}."
            ),
        }
    }
}

pub struct DiscoveryCycle {
    source: Arc<dyn SourceProvider>,
    classifier: RelevanceClassifier,
    notifier: DynNotifier,
}

impl DiscoveryCycle {
    pub fn new(
        source: Arc<dyn SourceProvider>,
        classifier: RelevanceClassifier,
        notifier: DynNotifier,
    ) -> Self {
        describe_metrics();
        Self {
            source,
            classifier,
            notifier,
        }
    }

    /// Wire the live freelance.ru provider and the configured classifiers.
    pub fn from_config(cfg: &WatchConfig, notifier: DynNotifier) -> anyhow::Result<Self> {
        let source = Arc::new(FreelanceRuProvider::new(&cfg.source)?);
        let ai: DynAiClassifier = build_classifier(&cfg.ai)?;
        Ok(Self::with_source(cfg, source, ai, notifier))
    }

    pub fn with_source(
        cfg: &WatchConfig,
        source: Arc<dyn SourceProvider>,
        ai: DynAiClassifier,
        notifier: DynNotifier,
    ) -> Self {
        let keywords = KeywordClassifier::new(&cfg.keywords.positive, &cfg.keywords.negative);
        Self::new(source, RelevanceClassifier::new(keywords, ai), notifier)
    }

    /// One pass over the current listing for `session`.
    ///
    /// Only a failed fetch is an error. Classifier and delivery failures stay
    /// with their candidate. Cancellation is honoured during the fetch and
    /// between candidates, never in the middle of one.
    pub async fn run_once(&self, session: &PollSession, pass: Pass) -> Result<CycleReport, FetchError> {
        let t0 = std::time::Instant::now();
        counter!("watch_cycles_total").increment(1);
        let mut report = CycleReport::new();

        let fetched = tokio::select! {
            _ = session.cancel_token().cancelled() => {
                report.cancelled = true;
                report.finished_at = Utc::now();
                return Ok(report);
            }
            res = self.source.fetch_latest() => res,
        };
        let candidates = match fetched {
            Ok(v) => v,
            Err(e) => {
                counter!("watch_fetch_errors_total").increment(1);
                return Err(e);
            }
        };
        report.fetched = candidates.len();

        let ledger = session.ledger();
        for candidate in &candidates {
            if session.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if ledger.contains(&candidate.id) {
                report.skipped_seen += 1;
                continue;
            }

            let verdict = self
                .classifier
                .classify(&candidate.title, &candidate.description)
                .await;
            if verdict.stage == Stage::Ai {
                report.ai_calls += 1;
            }
            debug!(id = %candidate.id, ?verdict, "classified");
            if !verdict.relevant {
                continue;
            }

            // Insert before send: a failed send is dropped, never repeated.
            if !ledger.insert_if_absent(&candidate.id) {
                report.skipped_seen += 1;
                continue;
            }
            report.relevant += 1;

            let text = format_candidate(pass, candidate);
            match self.notifier.send(session.chat(), &text).await {
                Ok(()) => {
                    report.notified += 1;
                    counter!("watch_notified_total").increment(1);
                }
                Err(e) => {
                    report.notify_failed += 1;
                    counter!("watch_notify_errors_total").increment(1);
                    warn!(
                        error = %format!("{e:#}"),
                        id = %candidate.id,
                        chat = %session.chat(),
                        "notification failed, project will not be resent"
                    );
                }
            }
        }

        report.finished_at = Utc::now();
        histogram!("watch_cycle_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        gauge!("watch_last_cycle_ts").set(report.finished_at.timestamp() as f64);

        info!(
            target: "watch",
            source = self.source.name(),
            chat = %session.chat(),
            ?pass,
            fetched = report.fetched,
            skipped = report.skipped_seen,
            relevant = report.relevant,
            notified = report.notified,
            notify_failed = report.notify_failed,
            ai_calls = report.ai_calls,
            cancelled = report.cancelled,
            "cycle finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(fetched: usize, notified: usize) -> CycleReport {
        CycleReport {
            fetched,
            relevant: notified,
            notified,
            ..CycleReport::new()
        }
    }

    #[test]
    fn outcome_distinguishes_empty_irrelevant_and_sent() {
        assert_eq!(report(0, 0).outcome(), CycleOutcome::NoItems);
        assert_eq!(report(5, 0).outcome(), CycleOutcome::NoneRelevant);
        assert_eq!(report(5, 2).outcome(), CycleOutcome::Sent(2));
    }

    #[test]
    fn failed_deliveries_are_not_reported_as_nothing_relevant() {
        let all_failed = CycleReport {
            fetched: 3,
            relevant: 1,
            notify_failed: 1,
            ..CycleReport::new()
        };
        assert_eq!(
            all_failed.outcome(),
            CycleOutcome::PartlyDelivered { sent: 0, failed: 1 }
        );

        let some_failed = CycleReport {
            relevant: 3,
            notified: 2,
            notify_failed: 1,
            ..report(4, 0)
        };
        assert_eq!(
            some_failed.outcome(),
            CycleOutcome::PartlyDelivered { sent: 2, failed: 1 }
        );
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(CycleOutcome::NoItems.message(), "На данный момент вакансий нет.");
        assert_eq!(
            CycleOutcome::NoneRelevant.message(),
            "На данный момент подходящих вакансий нет."
        );
        assert_eq!(CycleOutcome::Sent(3).message(), "Отправлено подходящих вакансий: 3.");
        assert_eq!(
            CycleOutcome::PartlyDelivered { sent: 0, failed: 2 }.message(),
            "Отправлено подходящих вакансий: 0. Не удалось доставить: 2."
        );
    }
}
