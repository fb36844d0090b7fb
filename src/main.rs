//! Joke refresher — binary entrypoint.
//! Loads config, wires the scheduler and the HTTP API, and serves until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use joke_refresher::{
    build_app, config, fetch::providers::icanhazdadjoke::HttpJokeSource, metrics::Metrics,
};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` wins; otherwise info for this crate. `LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new("joke_refresher=info,scheduler=info,fetcher=info,api=info,control=info,warn")
        });

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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default()?;
    let addr = cfg.server_addr()?;

    // Recorder first, so series described during wiring are kept.
    let metrics = if cfg.metrics_enabled {
        Some(Metrics::init()?)
    } else {
        None
    };

    let source = Arc::new(HttpJokeSource::from_config(&cfg)?);
    let app = build_app(&cfg, source)?;
    app.scheduler.activate();

    let mut router = app.router;
    if let Some(metrics) = &metrics {
        router = router.merge(metrics.router());
    }

    tracing::info!(
        %addr,
        api_url = %cfg.api_url,
        interval_ms = cfg.refresh_rate_ms,
        enabled = cfg.auto_refresh_enabled,
        "starting joke refresher"
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("http server")?;

    app.scheduler.stop();
    tracing::info!("shut down");
    Ok(())
}
