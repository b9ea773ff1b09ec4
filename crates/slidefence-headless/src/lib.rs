#![forbid(unsafe_code)]

//! `slidefence-headless` provides an in-memory [`DocumentHost`] for running
//! the overflow engine without a browser.
//!
//! Design goals:
//! - **Host-driven changes**: tests (or a headless renderer) mutate the tree
//!   and drain the resulting notifications explicitly.
//! - **Deterministic time**: the clock only moves when advanced.
//! - **Static box model**: element rects are declared up front; the only
//!   geometry feedback comes from the handful of inline styles the engine
//!   writes (`max-width`, `max-height`, `left`, `top`, `font-size`,
//!   `padding`). This is a test double for a rendering engine, not a layout
//!   engine.
//!
//! [`DocumentHost`]: slidefence_backend::DocumentHost

mod document;

pub use document::{ElementSpec, HeadlessDocument, StyleWrite};

use core::time::Duration;

use slidefence_backend::HostClock;

/// Document time for the headless host.
///
/// Sweeps, readiness timeouts, and ledger timestamps all read this clock
/// through [`HostClock`]. It starts at zero and only moves when the test
/// moves it; it never runs backwards, so `set` to an earlier instant is
/// ignored.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Jump to `now` if it is not earlier than the current time.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl HostClock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn document_time_never_runs_backwards() {
        let mut clock = DeterministicClock::new();
        assert_eq!(clock.now_mono(), Duration::ZERO);

        clock.advance(Duration::from_millis(250));
        clock.set(Duration::from_millis(100));
        assert_eq!(clock.now_mono(), Duration::from_millis(250));

        clock.set(Duration::from_secs(5));
        assert_eq!(clock.now_mono(), Duration::from_secs(5));
    }

    #[test]
    fn document_time_saturates() {
        let mut clock = DeterministicClock::new();
        clock.set(Duration::MAX);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now_mono(), Duration::MAX);
    }

    #[test]
    fn headless_document_reads_its_clock() {
        let mut doc = HeadlessDocument::new(800.0, 600.0);
        doc.advance(Duration::from_millis(40));
        doc.set_time(Duration::from_millis(10));
        assert_eq!(doc.now_mono(), Duration::from_millis(40));
    }
}
