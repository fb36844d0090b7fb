// src/fetch/mod.rs
pub mod providers;
pub mod types;

use metrics::counter;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::fetch::types::JokeSource;
use crate::model::Joke;

pub const FALLBACK_ID_PREFIX: &str = "fallback-";
pub const FALLBACK_TEXT: &str =
    "Why don't scientists trust atoms? Because they make up everything!";
/// Kept as "success" on purpose: consumers treat a degraded joke as better than none.
pub const FALLBACK_STATUS: &str = "success";

/// Wraps a [`JokeSource`] and never lets a provider failure escape.
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn JokeSource>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn JokeSource>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// One provider call. Errors become the fallback joke; `None` only when
    /// the provider answered with nothing.
    pub async fn fetch(&self) -> Option<Joke> {
        crate::metrics::ensure_metrics_described();
        counter!("joke_fetch_total").increment(1);

        match self.source.fetch_joke().await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    target: "fetcher",
                    error = ?e,
                    provider = self.source.name(),
                    "failed to fetch joke from provider, using fallback"
                );
                counter!("joke_fetch_fallback_total").increment(1);
                Some(fallback_joke())
            }
        }
    }
}

/// Synthesized joke used when the provider is unreachable.
pub fn fallback_joke() -> Joke {
    Joke::new(
        format!("{FALLBACK_ID_PREFIX}{}", next_fallback_stamp()),
        FALLBACK_TEXT,
        FALLBACK_STATUS,
    )
    .stamped(chrono::Utc::now())
}

pub fn is_fallback(joke: &Joke) -> bool {
    joke.id.starts_with(FALLBACK_ID_PREFIX)
}

/// Wall-clock millis, bumped so that two fallbacks never share an id.
fn next_fallback_stamp() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);
    let now = chrono::Utc::now().timestamp_millis();
    let mut prev = LAST.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST.compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}
