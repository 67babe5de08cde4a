//! Clock-agnostic periodic tick schedule.

use std::time::{Duration, Instant};

/// Default display refresh rate.
pub const DEFAULT_TICK_HZ: u32 = 10;

/// Periodic schedule with explicit start/stop.
///
/// The ticker never reads the clock itself; callers pass `now`, which
/// keeps it usable from any event loop and from tests.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    /// Ticker firing `hz` times per second (at least once per second).
    pub fn from_hz(hz: u32) -> Self {
        Self::new(Duration::from_secs(1) / hz.max(1))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Begin ticking. The first tick is due one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns true if a tick is due at `now` and schedules the next one.
    ///
    /// Ticks missed while the loop was busy are skipped, not replayed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let next = due + self.interval;
        self.next_due = Some(if next <= now { now + self.interval } else { next });
        true
    }

    /// Time left until the next tick, or `None` when stopped.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::from_hz(DEFAULT_TICK_HZ)
    }
}
