//! Fixed-timestep tick scheduler.
//!
//! A scheduler starts idle. The session actor resumes it when a match
//! begins and pauses it when the match ends, so a lobby never ticks.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the actor wakes up late for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverrunPolicy {
    /// Drop the missed ticks and schedule the next one a full step from
    /// now. The game clock then falls behind wall time instead of bursting.
    #[default]
    Skip,
    /// Keep the cadence: the next deadline is `previous + dt` even if that
    /// is already past, so missed ticks run back to back.
    CatchUp,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Tick rate in Hz. 0 disables ticking altogether.
    pub tick_rate_hz: u32,
    pub policy: OverrunPolicy,
    /// Share of the tick budget (0.0–1.0) a tick's work may take before it
    /// is logged as a warning.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            policy: OverrunPolicy::default(),
            budget_warn_threshold: 0.8,
        }
    }
}

impl TickConfig {
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps the rate to [`MAX_TICK_RATE_HZ`](Self::MAX_TICK_RATE_HZ) and
    /// the threshold to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick rate too high, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// The fixed step, or `None` when ticking is disabled.
    pub fn tick_duration(&self) -> Option<Duration> {
        (self.tick_rate_hz > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz)))
    }
}

// ---------------------------------------------------------------------------
// Tick + stats
// ---------------------------------------------------------------------------

/// One fired tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Starts at 1 and keeps counting across pauses.
    pub number: u64,
    /// The fixed step. Simulation code advances by this, never by wall time.
    pub dt: Duration,
    /// How far past its deadline the tick fired.
    pub late: Duration,
    /// Ticks dropped under [`OverrunPolicy::Skip`] just before this one.
    pub skipped: u64,
}

impl Tick {
    /// Late by more than a tenth of a step.
    pub fn is_late(&self) -> bool {
        self.late > self.dt / 10
    }
}

/// Counters kept by a scheduler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStats {
    pub ticks: u64,
    pub late_ticks: u64,
    pub skipped_ticks: u64,
    /// Longest work span reported through [`TickScheduler::finish_tick`].
    pub slowest_tick: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Wakes one session actor at a fixed rate while a match runs.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    step: Option<Duration>,
    ticks: u64,
    /// `None` while idle.
    deadline: Option<TokioInstant>,
    work_started: Option<Instant>,
    stats: TickStats,
}

impl TickScheduler {
    /// An idle scheduler. Call [`resume`](Self::resume) to start ticking.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let step = config.tick_duration();
        debug!(rate_hz = config.tick_rate_hz, policy = ?config.policy, "tick scheduler created");
        Self {
            config,
            step,
            ticks: 0,
            deadline: None,
            work_started: None,
            stats: TickStats::default(),
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next deadline.
    ///
    /// Pends forever while idle or disabled, so it can sit in a
    /// `tokio::select!` next to the command channel.
    pub async fn next_tick(&mut self) -> Tick {
        let (Some(deadline), Some(step)) = (self.deadline, self.step) else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        let now = TokioInstant::now();
        let late = now.saturating_duration_since(deadline);
        let skipped = self.schedule_next(deadline, now, step);
        self.ticks += 1;
        self.work_started = Some(Instant::now());

        let tick = Tick {
            number: self.ticks,
            dt: step,
            late,
            skipped,
        };
        self.stats.ticks += 1;
        self.stats.skipped_ticks += skipped;
        if tick.is_late() {
            self.stats.late_ticks += 1;
        }
        trace!(tick = tick.number, late_us = late.as_micros() as u64, "tick fired");
        tick
    }

    /// Sets the following deadline. Returns how many ticks were dropped.
    fn schedule_next(&mut self, deadline: TokioInstant, now: TokioInstant, step: Duration) -> u64 {
        let late = now.saturating_duration_since(deadline);
        let (next, skipped) = match self.config.policy {
            OverrunPolicy::Skip => (now + step, (late.as_nanos() / step.as_nanos()) as u64),
            OverrunPolicy::CatchUp => (deadline + step, 0),
        };
        if skipped > 0 {
            warn!(
                tick = self.ticks + 1,
                skipped,
                late_ms = late.as_secs_f64() * 1000.0,
                "session fell behind, skipping ticks"
            );
        }
        self.deadline = Some(next);
        skipped
    }

    /// Marks the end of the current tick's work and checks it against the
    /// budget. A call without a preceding tick does nothing.
    pub fn finish_tick(&mut self) {
        let Some(started) = self.work_started.take() else {
            return;
        };
        let elapsed = started.elapsed();
        self.stats.slowest_tick = self.stats.slowest_tick.max(elapsed);

        let Some(step) = self.step else {
            return;
        };
        if elapsed.as_secs_f64() >= step.as_secs_f64() * self.config.budget_warn_threshold {
            warn!(
                tick = self.ticks,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = step.as_secs_f64() * 1000.0,
                "tick work near budget"
            );
        }
    }

    /// Starts ticking one step from now. No-op if already running or
    /// disabled.
    pub fn resume(&mut self) {
        if self.deadline.is_some() {
            return;
        }
        if let Some(step) = self.step {
            self.deadline = Some(TokioInstant::now() + step);
            debug!(tick = self.ticks, "tick scheduler resumed");
        }
    }

    /// Stops ticking. The paused span never turns into a burst on resume.
    pub fn pause(&mut self) {
        if self.deadline.take().is_some() {
            self.work_started = None;
            debug!(tick = self.ticks, "tick scheduler paused");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.deadline.is_none()
    }

    /// `true` when the rate is 0.
    pub fn is_disabled(&self) -> bool {
        self.step.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.step
    }
}
