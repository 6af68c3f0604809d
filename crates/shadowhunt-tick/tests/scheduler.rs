//! Scheduler timing on a paused Tokio clock.
//!
//! `start_paused = true` makes Tokio jump straight to the next timer, so
//! `sleep_until` resolves instantly and deadlines are exact.

use std::time::Duration;

use shadowhunt_tick::{OverrunPolicy, TickConfig, TickScheduler};

fn running(config: TickConfig) -> TickScheduler {
    let mut s = TickScheduler::new(config);
    s.resume();
    s
}

#[tokio::test(start_paused = true)]
async fn test_ticks_are_numbered_with_fixed_dt() {
    let mut s = running(TickConfig::with_rate(10));
    for expected in 1..=4 {
        let tick = s.next_tick().await;
        assert_eq!(tick.number, expected);
        assert_eq!(tick.dt, Duration::from_millis(100));
        assert!(!tick.is_late());
    }
    assert_eq!(s.tick_count(), 4);
    assert_eq!(s.stats().ticks, 4);
}

#[tokio::test(start_paused = true)]
async fn test_idle_scheduler_never_fires() {
    let mut s = TickScheduler::new(TickConfig::with_rate(10));
    let result = tokio::time::timeout(Duration::from_secs(1), s.next_tick()).await;
    assert!(result.is_err(), "a scheduler that was never resumed must pend");
}

#[tokio::test(start_paused = true)]
async fn test_disabled_scheduler_ignores_resume() {
    let mut s = running(TickConfig::with_rate(0));
    assert!(s.is_disabled());
    assert!(s.is_paused());
    let result = tokio::time::timeout(Duration::from_secs(5), s.next_tick()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_pause_then_resume_continues_numbering() {
    let mut s = running(TickConfig::with_rate(10));
    s.next_tick().await;
    s.pause();
    s.pause();
    let result = tokio::time::timeout(Duration::from_secs(2), s.next_tick()).await;
    assert!(result.is_err());

    s.resume();
    let tick = s.next_tick().await;
    assert_eq!(tick.number, 2);
    // Two idle seconds are not made up for.
    assert_eq!(tick.skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_skip_policy_drops_missed_ticks() {
    let mut s = running(TickConfig {
        policy: OverrunPolicy::Skip,
        ..TickConfig::with_rate(10)
    });
    s.next_tick().await;
    // Stall for 4.5 steps before asking again.
    tokio::time::advance(Duration::from_millis(450)).await;
    let tick = s.next_tick().await;
    assert!(tick.is_late());
    assert_eq!(tick.skipped, 3);
    assert_eq!(s.stats().late_ticks, 1);
    assert_eq!(s.stats().skipped_ticks, 3);
}

#[tokio::test(start_paused = true)]
async fn test_catch_up_policy_runs_missed_ticks_back_to_back() {
    let mut s = running(TickConfig {
        policy: OverrunPolicy::CatchUp,
        ..TickConfig::with_rate(10)
    });
    s.next_tick().await;
    tokio::time::advance(Duration::from_millis(450)).await;
    let start = tokio::time::Instant::now();
    for _ in 0..4 {
        let tick = s.next_tick().await;
        assert_eq!(tick.skipped, 0);
    }
    assert_eq!(tokio::time::Instant::now(), start, "no waiting while behind");
}
