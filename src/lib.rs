// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod control;
pub mod error;
pub mod fetch;
pub mod history;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod scheduler;

use std::sync::Arc;

use axum::Router;

pub use crate::api::create_router as router;
pub use crate::config::RefresherConfig;
pub use crate::control::{RateSpec, RefreshControl};
pub use crate::error::RefreshError;
pub use crate::fetch::{types::JokeSource, Fetcher};
pub use crate::model::Joke;
pub use crate::notify::{BroadcastHub, Publisher};
pub use crate::scheduler::{Scheduler, SchedulerCfg};

/// Wired application: the router plus handles the binary and tests need.
pub struct App {
    pub router: Router,
    pub scheduler: Arc<Scheduler>,
    pub hub: Arc<BroadcastHub>,
}

/// Builds scheduler, hub and router around `source`. Must run inside a Tokio
/// runtime; no timer runs until `app.scheduler.activate()`.
pub fn build_app(cfg: &RefresherConfig, source: Arc<dyn JokeSource>) -> anyhow::Result<App> {
    let hub = Arc::new(BroadcastHub::new(cfg.broadcast_capacity));
    let scheduler = Arc::new(Scheduler::new(
        Fetcher::new(source),
        hub.clone(),
        SchedulerCfg {
            interval_ms: cfg.refresh_rate_ms,
            enabled: cfg.auto_refresh_enabled,
            topic: cfg.topic.clone(),
        },
    )?);
    let state = api::AppState {
        control: RefreshControl::new(scheduler.clone()),
    };
    Ok(App {
        router: router(state),
        scheduler,
        hub,
    })
}
