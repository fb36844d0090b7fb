// tests/scheduler_timing.rs
//
// Cadence and timer-replacement behavior, on Tokio's paused clock so tick
// counts are exact.

mod common;

use std::sync::Arc;
use std::time::Duration;

use joke_refresher::BroadcastHub;
use tokio::time::sleep;

use common::{scheduler_with, CountingSource, PanicOnceSource};

#[tokio::test(start_paused = true)]
async fn one_second_interval_ticks_within_bounds_over_three_seconds() {
    let src = CountingSource::new();
    let s = scheduler_with(src.clone(), Arc::new(BroadcastHub::default()), true, 1_000);
    s.activate();

    sleep(Duration::from_millis(3_500)).await;
    let ticks = src.calls();
    assert!((2..=4).contains(&ticks), "got {ticks} ticks");
    assert_eq!(s.history().count(), ticks);
}

#[tokio::test(start_paused = true)]
async fn interval_change_replaces_timer_exactly_once() {
    let src = CountingSource::new();
    let s = scheduler_with(src.clone(), Arc::new(BroadcastHub::default()), true, 1_000);
    s.activate();

    sleep(Duration::from_millis(2_500)).await;
    assert_eq!(src.calls(), 2);
    let before = s.timer_generation().expect("timer installed");

    s.set_interval_ms(5_000).unwrap();
    assert_eq!(s.timer_generation(), Some(before + 1));

    // Old cadence must not leak: next tick only 5s after the change.
    sleep(Duration::from_millis(4_900)).await;
    assert_eq!(src.calls(), 2);
    assert_eq!(s.running_timers(), 1);

    sleep(Duration::from_millis(5_200)).await;
    assert_eq!(src.calls(), 4, "ticks at +5s and +10s only");
    assert_eq!(s.running_timers(), 1);
}

#[tokio::test(start_paused = true)]
async fn disabling_stops_ticks_and_enabling_restarts_from_full_interval() {
    let src = CountingSource::new();
    let s = scheduler_with(src.clone(), Arc::new(BroadcastHub::default()), true, 1_000);
    s.activate();

    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(src.calls(), 1);

    assert!(!s.set_enabled(false));
    sleep(Duration::from_secs(10)).await;
    assert_eq!(src.calls(), 1);
    assert_eq!(s.running_timers(), 0);

    assert!(s.set_enabled(true));
    sleep(Duration::from_millis(900)).await;
    assert_eq!(src.calls(), 1);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(src.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn start_while_running_replaces_the_timer() {
    let src = CountingSource::new();
    let s = scheduler_with(src.clone(), Arc::new(BroadcastHub::default()), false, 1_000);

    s.start(2_000).unwrap();
    s.start(2_000).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(s.running_timers(), 1);

    sleep(Duration::from_millis(4_100)).await;
    assert_eq!(src.calls(), 2);
    assert!(s.is_enabled());
    assert!(s.start(999).is_err());
    assert_eq!(s.interval_ms(), 2_000);
}

#[tokio::test(start_paused = true)]
async fn in_flight_fetch_completes_after_stop() {
    let src = CountingSource::slow(Duration::from_secs(2));
    let s = scheduler_with(src.clone(), Arc::new(BroadcastHub::default()), true, 1_000);
    s.activate();

    // Tick fires at 1s, fetch runs until 3s.
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(src.calls(), 1);
    s.stop();
    assert_eq!(s.history().count(), 0);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(s.history().count(), 1, "in-flight result still recorded");

    sleep(Duration::from_secs(5)).await;
    assert_eq!(src.calls(), 1, "no ticks after stop");
    assert_eq!(s.running_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn panicking_tick_does_not_kill_the_timer() {
    let src = PanicOnceSource::new();
    let s = scheduler_with(src.clone(), Arc::new(BroadcastHub::default()), true, 1_000);
    s.activate();

    sleep(Duration::from_millis(3_500)).await;
    // First tick panicked before counting; the next two ran normally.
    assert_eq!(src.calls(), 2);
    assert_eq!(s.history().count(), 2);
    assert_eq!(s.running_timers(), 1);
}
