//! Dry run: one discovery cycle, relevant projects printed to stdout.
//!
//! `scan_once` hits the live listing; `scan_once --fixture page.html` parses a
//! saved page instead. AI classification follows `config/watch.toml`.

use std::sync::Arc;

use anyhow::Context;
use freelance_watch::ai_adapter::build_classifier;
use freelance_watch::config::WatchConfig;
use freelance_watch::ingest::providers::freelance_ru::FreelanceRuProvider;
use freelance_watch::ingest::providers::static_listing::StaticListingProvider;
use freelance_watch::notify::StdoutNotifier;
use freelance_watch::{ChatId, DiscoveryCycle, Pass, PollSession, SourceProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    freelance_watch::init_tracing();

    let mut cfg = WatchConfig::load_default()?;
    cfg.ai.resolve_api_key()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let source: Arc<dyn SourceProvider> = match args.as_slice() {
        [flag, path] if flag == "--fixture" => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("reading fixture {path}"))?;
            Arc::new(StaticListingProvider::from_fixture(&html, &cfg.source.base_url))
        }
        [] => Arc::new(FreelanceRuProvider::new(&cfg.source)?),
        _ => anyhow::bail!("usage: scan_once [--fixture <page.html>]"),
    };

    let ai = build_classifier(&cfg.ai)?;
    let cycle = DiscoveryCycle::with_source(&cfg, source, ai, Arc::new(StdoutNotifier));
    let session = PollSession::new(ChatId(0));

    let report = cycle.run_once(&session, Pass::Initial).await?;
    println!("{}", report.outcome().message());
    println!(
        "fetched={} relevant={} notified={} ai_calls={}",
        report.fetched, report.relevant, report.notified, report.ai_calls
    );
    Ok(())
}
