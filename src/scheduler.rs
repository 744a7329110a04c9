//! Render coalescing.
//!
//! A single optional deadline.  `request` arms it unless it is already armed;
//! `poll` fires once the deadline has passed and disarms it.  A burst of
//! parameter edits within one delay window therefore produces one render.

use std::time::{Duration, Instant};

pub const DEFAULT_RENDER_DELAY: Duration = Duration::from_millis(16);

#[derive(Debug, Clone)]
pub struct RenderScheduler {
    delay: Duration,
    pending: Option<Instant>,
}

impl RenderScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the slot.  Returns `false` when a render was already pending (the
    /// request is absorbed by the scheduled one).
    pub fn request(&mut self, now: Instant) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(now + self.delay);
        true
    }

    /// Returns `true` exactly once per armed deadline, when it has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending render, if any.  Used to schedule repaints.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending.map(|d| d.saturating_duration_since(now))
    }

    /// Drop a pending render (an immediate render superseded it).
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_DELAY)
    }
}
