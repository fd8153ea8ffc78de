// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyze;
pub mod bot;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod ledger;
pub mod notify;
pub mod relevance;
pub mod scheduler;
pub mod session;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use crate::engine::{CycleOutcome, CycleReport, DiscoveryCycle};
pub use crate::ingest::types::{Candidate, SourceProvider};
pub use crate::ledger::DedupLedger;
pub use crate::notify::{ChatId, Notifier, Pass};
pub use crate::session::{PollSession, SessionRegistry};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `freelance_watch=info,warn`.
/// `LOG_FORMAT=json` switches to JSON lines; otherwise compact text.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("freelance_watch=info,watch=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}
