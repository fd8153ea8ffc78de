//! freelance-watch — Binary Entrypoint
//! Loads config, starts the optional metrics server and runs the Telegram
//! dispatcher until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use freelance_watch::bot::BotDispatcher;
use freelance_watch::config::WatchConfig;
use freelance_watch::notify::telegram::TelegramClient;
use freelance_watch::telemetry::Metrics;
use freelance_watch::{DiscoveryCycle, SessionRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    freelance_watch::init_tracing();

    let mut cfg = WatchConfig::load_default()?;
    // Missing credentials are the only startup-fatal problems.
    cfg.telegram.resolve_token()?;
    cfg.ai.resolve_api_key()?;
    info!(
        source = %cfg.source.url,
        interval_secs = cfg.poll.interval_secs,
        ai = ?cfg.ai,
        telegram = ?cfg.telegram,
        "config loaded"
    );

    if let Some(addr) = cfg.metrics.listen.clone() {
        let metrics = Metrics::init()?;
        tokio::spawn(async move {
            if let Err(e) = metrics.serve(&addr).await {
                warn!(error = %format!("{e:#}"), "metrics server stopped");
            }
        });
    }

    let telegram = TelegramClient::new(&cfg.telegram)?;
    let notifier = Arc::new(telegram.clone());
    let cycle = Arc::new(DiscoveryCycle::from_config(&cfg, notifier.clone())?);
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = Arc::new(BotDispatcher::new(
        notifier,
        cycle,
        registry,
        cfg.poll.interval(),
    ));

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
        }
        on_signal.cancel();
    });

    dispatcher
        .run(telegram, shutdown)
        .await
        .context("bot dispatcher")?;
    Ok(())
}
