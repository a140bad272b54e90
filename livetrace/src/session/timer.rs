//! Fixed-period poll timer driven by the caller's event loop.
//!
//! The timer never sleeps or spawns anything. The loop asks it whether a
//! period has elapsed (`poll`) and can use `deadline` to decide how long it
//! may wait for input before the next request is due.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PollTimer {
    interval: Duration,
    next: Option<Instant>,
}

impl PollTimer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, next: None }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the timer; the first tick fires one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    /// When the next tick is due, if the timer is running.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Returns true if a tick is due at `now`, and schedules the next one.
    ///
    /// Missed periods collapse into a single tick; the next tick is scheduled
    /// one interval after `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next {
            Some(due) if now >= due => {
                self.next = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}
