//! Presence monitor.
//! Turns raw motion readings into debounced edges using the timestamp of the
//! last positive reading, so there is no timer to cancel or re-arm.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    /// First motion after an absence (or at startup).
    MotionResumed,
    /// No motion for at least the configured timeout.
    Absent,
}

#[derive(Debug)]
pub struct PresenceMonitor {
    timeout: Duration,
    last_motion: Option<Instant>,
    present: bool,
}

impl PresenceMonitor {
    pub fn new(timeout: Duration) -> Self {
        PresenceMonitor {
            timeout,
            last_motion: None,
            present: false,
        }
    }

    /// Feed one reading taken at `now`.
    ///
    /// Every positive reading re-arms the window, but only the first one
    /// after an absence produces an event.
    pub fn observe(&mut self, motion: bool, now: Instant) -> Option<PresenceEvent> {
        if motion {
            self.last_motion = Some(now);
            if !self.present {
                self.present = true;
                return Some(PresenceEvent::MotionResumed);
            }
            return None;
        }

        if self.present && self.quiet_for(now) >= self.timeout {
            self.present = false;
            return Some(PresenceEvent::Absent);
        }
        None
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    #[cfg(test)]
    pub(crate) fn last_motion(&self) -> Option<Instant> {
        self.last_motion
    }

    fn quiet_for(&self, now: Instant) -> Duration {
        self.last_motion
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(Duration::MAX)
    }
}
