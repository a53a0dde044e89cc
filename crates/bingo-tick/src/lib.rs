//! Periodic sweep scheduler for Bingo Hall rooms.
//!
//! A room's countdown is evaluated lazily whenever someone reads the lobby
//! state. The scheduler here is the optional second driver: it wakes a room
//! actor at a fixed interval so a waiting room starts on time even when no
//! client happens to poll.
//!
//! # Idle mode
//!
//! When `interval` is `None`, or while the scheduler is paused,
//! [`TickScheduler::wait_for_tick`] pends forever. Rooms pause their
//! scheduler once the round is running and resume it on reset.
//!
//! # Integration
//!
//! The scheduler sits inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = inbox.recv() => { /* handle commands */ }
//!         _ = scheduler.wait_for_tick() => {
//!             room.try_auto_start(SystemTime::now());
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the sweep scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between sweeps. `None` = idle (never fires).
    pub interval: Option<Duration>,
    /// Random delay (0..max) added to the *first* sweep so rooms created in
    /// the same instant don't all wake together.
    pub initial_jitter: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Some(Duration::from_secs(1)),
            initial_jitter: Duration::from_millis(250),
        }
    }
}

impl TickConfig {
    /// Shortest interval accepted. Anything faster is clamped.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    /// A config that sweeps every `interval` with the default jitter.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            ..Default::default()
        }
    }

    /// A config that never fires.
    pub fn idle() -> Self {
        Self {
            interval: None,
            initial_jitter: Duration::ZERO,
        }
    }

    /// Clamp out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if let Some(interval) = self.interval {
            if interval < Self::MIN_INTERVAL {
                warn!(
                    interval_ms = interval.as_millis() as u64,
                    min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                    "sweep interval below minimum, clamping"
                );
                self.interval = Some(Self::MIN_INTERVAL);
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// TickInfo
// ---------------------------------------------------------------------------

/// Information about a fired sweep.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing sweep number (starts at 1).
    pub tick: u64,
    /// How late the sweep woke up relative to its schedule.
    pub late_by: Duration,
    /// Whole intervals that were skipped because the actor was busy.
    pub skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval sweep scheduler. One per room actor.
///
/// Missed sweeps are never replayed: after a late wake-up the next sweep is
/// scheduled one interval from now. A countdown check is idempotent, so
/// running it twice in a row would only waste work.
pub struct TickScheduler {
    interval: Option<Duration>,
    next_tick: Option<Instant>,
    tick_count: u64,
    paused: bool,
}

impl TickScheduler {
    /// Create a scheduler. The first sweep is delayed by up to
    /// `initial_jitter` on top of one interval.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();

        let next_tick = config.interval.map(|d| {
            Instant::now() + d + start_jitter(config.initial_jitter)
        });

        match config.interval {
            Some(d) => debug!(interval_ms = d.as_millis() as u64, "sweep scheduler created"),
            None => debug!("sweep scheduler created in idle mode"),
        }

        Self {
            interval: config.interval,
            next_tick,
            tick_count: 0,
            paused: false,
        }
    }

    /// Shorthand for [`TickScheduler::new`] with [`TickConfig::every`].
    pub fn every(interval: Duration) -> Self {
        Self::new(TickConfig::every(interval))
    }

    /// Wait until the next sweep is due.
    ///
    /// Pends forever in idle mode or while paused, which lets
    /// `tokio::select!` keep serving its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, interval) = match (self.next_tick, self.interval) {
            (Some(next), Some(interval)) if !self.paused => (next, interval),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let skipped = (late_by.as_nanos() / interval.as_nanos()) as u64;
        if skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "sweep overrun, skipping ahead"
            );
        }

        // Always schedule from now, not from the missed deadline.
        self.next_tick = Some(now + interval);

        trace!(tick = self.tick_count, "sweep fired");

        TickInfo {
            tick: self.tick_count,
            late_by,
            skipped,
        }
    }

    /// Stop firing until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "sweep scheduler paused");
        }
    }

    /// Start firing again, one full interval from now.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(interval) = self.interval {
                self.next_tick = Some(Instant::now() + interval);
            }
            debug!(tick = self.tick_count, "sweep scheduler resumed");
        }
    }

    /// Whether the scheduler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the scheduler was built without an interval.
    pub fn is_idle(&self) -> bool {
        self.interval.is_none()
    }

    /// Sweeps fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured interval, or `None` in idle mode.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

/// A random delay below `max`, in whole microseconds. Anything under one
/// microsecond means no delay.
fn start_jitter(max: Duration) -> Duration {
    match max.as_micros() as u64 {
        0 => Duration::ZERO,
        max => Duration::from_micros(rand::rng().random_range(0..max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_jitter_below_a_microsecond_is_zero() {
        assert_eq!(start_jitter(Duration::ZERO), Duration::ZERO);
        assert_eq!(start_jitter(Duration::from_nanos(500)), Duration::ZERO);
    }

    #[test]
    fn test_start_jitter_stays_below_max() {
        let max = Duration::from_millis(5);
        for _ in 0..100 {
            assert!(start_jitter(max) < max);
        }
    }
}
