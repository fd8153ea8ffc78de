// src/scheduler.rs
//! Poller: first cycle inline, then one cycle per interval until cancelled.
//!
//! The interval is measured from the end of one cycle to the start of the next,
//! so cycles of a session never overlap and there is no drift correction.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::{CycleReport, DiscoveryCycle};
use crate::error::FetchError;
use crate::notify::Pass;
use crate::session::PollSession;

/// Handle to a running poll loop.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel and wait until the loop has exited.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "poll loop ended abnormally");
        }
    }
}

/// Run the first cycle, hand its result back, then start the periodic loop.
pub async fn start_monitoring(
    cycle: Arc<DiscoveryCycle>,
    session: Arc<PollSession>,
    interval: Duration,
) -> (Result<CycleReport, FetchError>, PollHandle) {
    let first = cycle.run_once(&session, Pass::Initial).await;
    if let Err(e) = &first {
        tracing::warn!(error = %e, chat = %session.chat(), "first cycle failed");
    }
    let handle = spawn_poller(cycle, session, interval);
    (first, handle)
}

/// Spawn the periodic loop: sleep, cycle, repeat.
pub fn spawn_poller(
    cycle: Arc<DiscoveryCycle>,
    session: Arc<PollSession>,
    interval: Duration,
) -> PollHandle {
    let cancel = session.cancel_token().clone();
    let token = cancel.clone();
    let join = tokio::spawn(async move {
        tracing::info!(chat = %session.chat(), interval_secs = interval.as_secs(), "poller started");
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            counter!("watch_poll_ticks_total").increment(1);
            match cycle.run_once(&session, Pass::Periodic).await {
                Ok(report) if report.cancelled => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, chat = %session.chat(), "scheduled cycle failed");
                }
            }
        }
        tracing::info!(chat = %session.chat(), seen = session.ledger().len(), "poller stopped");
    });
    PollHandle { cancel, join }
}
