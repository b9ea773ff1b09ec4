//! Readiness gating for full scans.
//!
//! Slides measured before their images and web fonts settle report boxes
//! that are about to change. The engine asks the host
//! [`is_ready`](slidefence_backend::DocumentHost::is_ready) before every full
//! scan and defers it while the answer is no, bounded by the configured
//! readiness timeout.
//!
//! # Invariants
//!
//! 1. A ready answer always opens the gate and resets any running wait.
//! 2. With a timeout, the gate reports [`Readiness::TimedOut`] exactly once
//!    per wait. It then stays open for not-ready answers until the host
//!    next reports ready, which re-arms it.
//! 3. Without a timeout the gate never opens on its own.

use core::time::Duration;

/// Outcome of consulting the readiness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Host not ready; defer and ask again on a later tick.
    Wait,
    /// Host still not ready but the timeout elapsed; proceed anyway.
    TimedOut,
}

/// Defers full scans until the host reports its resources settled.
///
/// The wait starts at the first not-ready answer and ends at the first
/// ready answer or when `timeout` elapses. `None` waits indefinitely.
/// After a timeout the gate stays open until the host next reports ready.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    timeout: Option<Duration>,
    waiting_since: Option<Duration>,
    expired: bool,
}

impl ReadinessGate {
    pub const fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            waiting_since: None,
            expired: false,
        }
    }

    pub fn check(&mut self, ready: bool, now: Duration) -> Readiness {
        if ready {
            self.waiting_since = None;
            self.expired = false;
            return Readiness::Ready;
        }
        if self.expired {
            return Readiness::Ready;
        }
        let since = *self.waiting_since.get_or_insert(now);
        match self.timeout {
            Some(limit) if now.saturating_sub(since) >= limit => {
                self.waiting_since = None;
                self.expired = true;
                Readiness::TimedOut
            }
            _ => Readiness::Wait,
        }
    }

    #[inline]
    pub fn is_waiting(&self) -> bool {
        self.waiting_since.is_some()
    }

    pub fn reset(&mut self) {
        self.waiting_since = None;
        self.expired = false;
    }
}
