use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("joke_fetch_total", "Provider calls made by the fetcher.");
        describe_counter!(
            "joke_fetch_fallback_total",
            "Provider calls that failed and were replaced by the fallback joke."
        );
        describe_counter!("refresh_ticks_total", "Scheduled ticks that ran a fetch.");
        describe_counter!(
            "refresh_ticks_skipped_total",
            "Scheduled ticks that found auto-refresh disabled."
        );
        describe_counter!(
            "refresh_tick_failures_total",
            "Scheduled ticks that panicked and were contained."
        );
        describe_counter!(
            "refresh_timer_restarts_total",
            "Timers installed by start/reconfigure."
        );
        describe_gauge!("refresh_interval_ms", "Current refresh interval in milliseconds.");
        describe_gauge!("refresh_enabled", "1 when auto-refresh is enabled.");
        describe_gauge!("joke_history_size", "Jokes currently held in history.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
