// tests/common/mod.rs
// Scripted joke providers shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use joke_refresher::{
    BroadcastHub, Fetcher, Joke, JokeSource, RefresherConfig, Scheduler, SchedulerCfg,
};

/// Returns `joke-<n>` on call n (or a fixed id with changing text),
/// optionally after a delay.
pub struct CountingSource {
    calls: AtomicUsize,
    fixed_id: Option<String>,
    delay: Option<Duration>,
}

impl CountingSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fixed_id: None,
            delay: None,
        })
    }

    pub fn with_fixed_id(id: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fixed_id: Some(id.to_string()),
            delay: None,
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fixed_id: None,
            delay: Some(delay),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl JokeSource for CountingSource {
    async fn fetch_joke(&self) -> Result<Option<Joke>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        let id = self
            .fixed_id
            .clone()
            .unwrap_or_else(|| format!("joke-{n}"));
        Ok(Some(Joke::new(id, format!("text-{n}"), "200")))
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Always fails like an unreachable provider.
pub struct FailingSource;

#[async_trait::async_trait]
impl JokeSource for FailingSource {
    async fn fetch_joke(&self) -> Result<Option<Joke>> {
        Err(anyhow!("connect timeout"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Panics on the first call, then behaves like [`CountingSource`].
pub struct PanicOnceSource {
    inner: Arc<CountingSource>,
    panicked: AtomicUsize,
}

impl PanicOnceSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: CountingSource::new(),
            panicked: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait::async_trait]
impl JokeSource for PanicOnceSource {
    async fn fetch_joke(&self) -> Result<Option<Joke>> {
        if self.panicked.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("provider blew up");
        }
        self.inner.fetch_joke().await
    }

    fn name(&self) -> &'static str {
        "panic-once"
    }
}

pub fn scheduler_with(
    source: Arc<dyn JokeSource>,
    hub: Arc<BroadcastHub>,
    enabled: bool,
    interval_ms: u64,
) -> Arc<Scheduler> {
    Arc::new(
        Scheduler::new(
            Fetcher::new(source),
            hub,
            SchedulerCfg {
                interval_ms,
                enabled,
                ..SchedulerCfg::default()
            },
        )
        .expect("valid scheduler cfg"),
    )
}

pub fn test_config(enabled: bool) -> RefresherConfig {
    RefresherConfig {
        auto_refresh_enabled: enabled,
        ..RefresherConfig::default()
    }
}
