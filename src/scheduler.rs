// src/scheduler.rs
//! Dynamic-interval refresh scheduler.
//!
//! Owns the joke history and the schedule state. One timer task exists while
//! auto-refresh is enabled; every reconfiguration swaps it under a single lock.
//! Cancelling a timer only prevents future ticks: a fetch already in flight
//! runs to completion and still records its result.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use metrics::{counter, gauge};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{RefreshError, Result};
use crate::fetch::Fetcher;
use crate::history::HistoryStore;
use crate::model::Joke;
use crate::notify::Publisher;

pub const MIN_INTERVAL_MS: u64 = 1_000;
pub const MAX_INTERVAL_MS: u64 = 300_000;
pub const DEFAULT_INTERVAL_MS: u64 = 2_000;

#[derive(Clone, Debug)]
pub struct SchedulerCfg {
    pub interval_ms: u64,
    pub enabled: bool,
    pub topic: String,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            enabled: true,
            topic: "/topic/jokes".to_string(),
        }
    }
}

pub fn validate_interval(ms: u64) -> Result<u64> {
    if ms < MIN_INTERVAL_MS {
        return Err(RefreshError::invalid(format!(
            "Refresh rate must be at least {MIN_INTERVAL_MS} milliseconds (1 second)"
        )));
    }
    if ms > MAX_INTERVAL_MS {
        return Err(RefreshError::invalid(format!(
            "Refresh rate cannot exceed {MAX_INTERVAL_MS} milliseconds (5 minutes)"
        )));
    }
    Ok(ms)
}

/// Everything a running timer (and a running tick) needs. Timers hold this,
/// never the [`Scheduler`], so dropping the scheduler ends its timer.
struct Shared {
    fetcher: Fetcher,
    history: HistoryStore,
    publisher: Arc<dyn Publisher>,
    topic: String,
    // Mirrors of `ScheduleState`, written only while its lock is held.
    enabled: AtomicBool,
    interval_ms: AtomicU64,
    live_timers: AtomicUsize,
}

impl Shared {
    async fn tick(self: Arc<Self>) {
        if !self.enabled.load(Ordering::Acquire) {
            counter!("refresh_ticks_skipped_total").increment(1);
            tracing::trace!(target: "scheduler", "auto-refresh disabled, skipping tick");
            return;
        }
        counter!("refresh_ticks_total").increment(1);
        self.fetch_and_record("scheduled").await;
    }

    async fn fetch_and_record(&self, trigger: &'static str) -> Option<Joke> {
        let Some(joke) = self.fetcher.fetch().await else {
            tracing::debug!(target: "scheduler", trigger, "provider returned no joke");
            return None;
        };
        let joke = joke.stamped(Utc::now());
        self.history.put(joke.clone());
        self.publisher.publish(&self.topic, &joke);
        tracing::info!(
            target: "scheduler",
            trigger,
            joke_id = %joke.id,
            "fetched new joke: {}",
            joke.preview()
        );
        Some(joke)
    }
}

/// Decrements the live-timer count however the timer task ends.
struct LiveTimer(Arc<Shared>);

impl LiveTimer {
    fn enter(shared: Arc<Shared>) -> Self {
        shared.live_timers.fetch_add(1, Ordering::AcqRel);
        Self(shared)
    }
}

impl Drop for LiveTimer {
    fn drop(&mut self) {
        self.0.live_timers.fetch_sub(1, Ordering::AcqRel);
    }
}

struct TimerHandle {
    stop: oneshot::Sender<()>,
    generation: u64,
    _task: JoinHandle<()>,
}

impl TimerHandle {
    /// Non-blocking: the loop notices between ticks.
    fn cancel(self) {
        let _ = self.stop.send(());
    }
}

fn spawn_timer(
    runtime: &Handle,
    shared: Arc<Shared>,
    period: Duration,
    generation: u64,
) -> TimerHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let task = runtime.spawn(async move {
        let live = LiveTimer::enter(shared);
        let shared = &live.0;

        // First fire after one full period, not immediately.
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {}
            }

            // Own task so a panic surfaces as a JoinError instead of killing the loop.
            let run = tokio::spawn(Arc::clone(shared).tick());
            if let Err(e) = run.await {
                counter!("refresh_tick_failures_total").increment(1);
                tracing::error!(target: "scheduler", error = %e, generation, "tick failed");
            }
        }
        tracing::debug!(target: "scheduler", generation, "timer stopped");
    });

    TimerHandle {
        stop: stop_tx,
        generation,
        _task: task,
    }
}

struct ScheduleState {
    enabled: bool,
    interval_ms: u64,
    timer: Option<TimerHandle>,
    generation: u64,
}

pub struct Scheduler {
    shared: Arc<Shared>,
    state: Mutex<ScheduleState>,
    // Captured at construction so control calls work from threads outside the runtime.
    runtime: Handle,
}

impl Scheduler {
    /// Builds the scheduler without starting a timer. Must be called inside a
    /// Tokio runtime: timers are spawned on that runtime from whichever thread
    /// later reconfigures the scheduler. An out-of-range `cfg.interval_ms` is rejected.
    pub fn new(
        fetcher: Fetcher,
        publisher: Arc<dyn Publisher>,
        cfg: SchedulerCfg,
    ) -> anyhow::Result<Self> {
        let runtime = Handle::try_current().context("scheduler needs a Tokio runtime")?;
        let interval_ms = validate_interval(cfg.interval_ms)?;
        crate::metrics::ensure_metrics_described();
        gauge!("refresh_interval_ms").set(interval_ms as f64);
        gauge!("refresh_enabled").set(if cfg.enabled { 1.0 } else { 0.0 });

        Ok(Self {
            shared: Arc::new(Shared {
                fetcher,
                history: HistoryStore::new(),
                publisher,
                topic: cfg.topic,
                enabled: AtomicBool::new(cfg.enabled),
                interval_ms: AtomicU64::new(interval_ms),
                live_timers: AtomicUsize::new(0),
            }),
            state: Mutex::new(ScheduleState {
                enabled: cfg.enabled,
                interval_ms,
                timer: None,
                generation: 0,
            }),
            runtime,
        })
    }

    /// Installs the timer if auto-refresh is enabled and none is running yet.
    pub fn activate(&self) {
        let mut st = self.lock();
        if st.enabled && st.timer.is_none() {
            let interval_ms = st.interval_ms;
            self.install_timer(&mut st, interval_ms);
        }
    }

    /// Enables auto-refresh at `interval_ms`, replacing any running timer.
    pub fn start(&self, interval_ms: u64) -> Result<()> {
        let interval_ms = validate_interval(interval_ms)?;
        let mut st = self.lock();
        self.install_timer(&mut st, interval_ms);
        self.store_interval(&mut st, interval_ms);
        self.store_enabled(&mut st, true);
        Ok(())
    }

    /// Disables auto-refresh and cancels the timer. Idempotent.
    pub fn stop(&self) {
        let mut st = self.lock();
        self.store_enabled(&mut st, false);
        Self::cancel_timer(&mut st);
    }

    pub fn set_interval_ms(&self, interval_ms: u64) -> Result<u64> {
        let interval_ms = validate_interval(interval_ms)?;
        let mut st = self.lock();
        if st.enabled {
            self.install_timer(&mut st, interval_ms);
        }
        self.store_interval(&mut st, interval_ms);
        tracing::info!(target: "scheduler", interval_ms, "refresh rate updated");
        Ok(interval_ms)
    }

    /// Returns the resulting state. Setting the current value is a no-op.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let mut st = self.lock();
        self.apply_enabled(&mut st, enabled);
        st.enabled
    }

    /// Flips auto-refresh under the same lock as `set_enabled`; returns the new state.
    pub fn toggle(&self) -> bool {
        let mut st = self.lock();
        let next = !st.enabled;
        self.apply_enabled(&mut st, next);
        tracing::info!(target: "scheduler", enabled = next, "auto-refresh toggled");
        next
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Acquire)
    }

    pub fn interval_ms(&self) -> u64 {
        self.shared.interval_ms.load(Ordering::Acquire)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.shared.history
    }

    pub fn topic(&self) -> &str {
        &self.shared.topic
    }

    /// Generation of the installed timer, `None` when no timer is installed.
    /// Bumped on every install.
    pub fn timer_generation(&self) -> Option<u64> {
        self.lock().timer.as_ref().map(|t| t.generation)
    }

    /// Timer tasks still looping. Briefly above one right after a swap, until
    /// the cancelled loop observes its stop signal.
    pub fn running_timers(&self) -> usize {
        self.shared.live_timers.load(Ordering::Acquire)
    }

    /// Runs one fetch, store and publish now, whether or not auto-refresh is
    /// enabled. `None` if the provider gave nothing or the fetch panicked.
    pub async fn fetch_now(&self) -> Option<Joke> {
        let shared = Arc::clone(&self.shared);
        let run = self
            .runtime
            .spawn(async move { shared.fetch_and_record("manual").await });
        match run.await {
            Ok(joke) => joke,
            Err(e) => {
                tracing::error!(target: "scheduler", error = %e, "manual fetch failed");
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScheduleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_enabled(&self, st: &mut ScheduleState, enabled: bool) {
        if st.enabled == enabled {
            return;
        }
        // Timer first, so the flag never claims a timer that does not exist.
        if enabled {
            let interval_ms = st.interval_ms;
            self.install_timer(st, interval_ms);
        } else {
            Self::cancel_timer(st);
        }
        self.store_enabled(st, enabled);
        tracing::info!(
            target: "scheduler",
            enabled,
            "auto-refresh {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    fn store_enabled(&self, st: &mut ScheduleState, enabled: bool) {
        st.enabled = enabled;
        self.shared.enabled.store(enabled, Ordering::Release);
        gauge!("refresh_enabled").set(if enabled { 1.0 } else { 0.0 });
    }

    fn store_interval(&self, st: &mut ScheduleState, interval_ms: u64) {
        st.interval_ms = interval_ms;
        self.shared.interval_ms.store(interval_ms, Ordering::Release);
        gauge!("refresh_interval_ms").set(interval_ms as f64);
    }

    fn install_timer(&self, st: &mut ScheduleState, interval_ms: u64) {
        let generation = st.generation + 1;
        let timer = spawn_timer(
            &self.runtime,
            Arc::clone(&self.shared),
            Duration::from_millis(interval_ms),
            generation,
        );
        Self::cancel_timer(st);
        st.generation = generation;
        st.timer = Some(timer);
        counter!("refresh_timer_restarts_total").increment(1);
        tracing::debug!(
            target: "scheduler",
            generation,
            interval_ms,
            "timer installed"
        );
    }

    fn cancel_timer(st: &mut ScheduleState) {
        if let Some(old) = st.timer.take() {
            tracing::debug!(target: "scheduler", generation = old.generation, "timer cancelled");
            old.cancel();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        Self::cancel_timer(&mut self.lock());
    }
}
