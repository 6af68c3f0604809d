//! Time for Shadowhunt's authority.
//!
//! Nothing in the match core ever sleeps or suspends mid-tick. Instead:
//!
//! - [`TickScheduler`] wakes the session actor at a fixed rate and hands it
//!   a fixed `dt`.
//! - [`Countdown`] is the game clock: decremented once per tick, clamped at
//!   zero, reports expiry exactly once.
//! - [`Stopwatch`] accumulates `dt` and is compared against a threshold once
//!   per tick. Dive timers, regen cooldowns and charging sessions all use it.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* queue for next tick */ }
//!         tick = scheduler.next_tick() => {
//!             session.tick(tick.dt);
//!             scheduler.finish_tick();
//!         }
//!     }
//! }
//! ```

mod clock;
mod scheduler;

pub use clock::{Countdown, Stopwatch};
pub use scheduler::{OverrunPolicy, Tick, TickConfig, TickScheduler, TickStats};
