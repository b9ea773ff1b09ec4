//! Host-driven periodic sweep timer.
//!
//! The sweeper never reads a clock; the engine passes the host's monotonic
//! time to [`Sweeper::poll`].
//!
//! # Invariants
//!
//! 1. At most one sweep is in flight. Ticks that come due while a sweep is in
//!    flight (or the caller reports itself busy) are skipped and counted.
//! 2. Missed intervals coalesce: however late a poll arrives, it yields at
//!    most one sweep, and the next deadline is `now + interval`.
//! 3. A cancelled sweeper is never due until re-armed.

use core::time::Duration;

/// Result of polling the sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDecision {
    /// Not due (or not armed).
    Idle,
    /// A sweep should run now. The sweeper is in flight until
    /// [`Sweeper::finish`].
    Due,
    /// The deadline passed but a sweep was already in progress.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct Sweeper {
    interval: Duration,
    next_due: Option<Duration>,
    in_flight: bool,
    sweeps: u64,
    skipped: u64,
}

impl Sweeper {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            in_flight: false,
            sweeps: 0,
            skipped: 0,
        }
    }

    #[inline]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule the first sweep one interval after `now`.
    pub fn arm(&mut self, now: Duration) {
        self.next_due = Some(now.saturating_add(self.interval));
    }

    pub fn poll(&mut self, now: Duration, busy: bool) -> SweepDecision {
        let Some(due) = self.next_due else {
            return SweepDecision::Idle;
        };
        if now < due {
            return SweepDecision::Idle;
        }
        self.next_due = Some(now.saturating_add(self.interval));
        if self.in_flight || busy {
            self.skipped += 1;
            return SweepDecision::Skipped;
        }
        self.in_flight = true;
        SweepDecision::Due
    }

    /// Mark the in-flight sweep as complete.
    pub fn finish(&mut self) {
        if self.in_flight {
            self.in_flight = false;
            self.sweeps += 1;
        }
    }

    /// Stop scheduling. Drops any in-flight sweep without counting it.
    pub fn cancel(&mut self) {
        self.next_due = None;
        self.in_flight = false;
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    #[inline]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    #[inline]
    pub fn next_due(&self) -> Option<Duration> {
        self.next_due
    }

    /// Completed sweeps.
    #[inline]
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn unarmed_is_idle() {
        let mut s = Sweeper::new(ms(100));
        assert_eq!(s.poll(ms(1_000), false), SweepDecision::Idle);
    }

    #[test]
    fn due_after_interval() {
        let mut s = Sweeper::new(ms(100));
        s.arm(ms(0));
        assert_eq!(s.poll(ms(99), false), SweepDecision::Idle);
        assert_eq!(s.poll(ms(100), false), SweepDecision::Due);
        s.finish();
        assert_eq!(s.sweeps(), 1);
        assert_eq!(s.next_due(), Some(ms(200)));
    }

    #[test]
    fn missed_intervals_coalesce() {
        let mut s = Sweeper::new(ms(100));
        s.arm(ms(0));
        assert_eq!(s.poll(ms(1_050), false), SweepDecision::Due);
        s.finish();
        assert_eq!(s.next_due(), Some(ms(1_150)));
        assert_eq!(s.poll(ms(1_100), false), SweepDecision::Idle);
    }

    #[test]
    fn in_flight_ticks_are_skipped() {
        let mut s = Sweeper::new(ms(100));
        s.arm(ms(0));
        assert_eq!(s.poll(ms(100), false), SweepDecision::Due);
        assert_eq!(s.poll(ms(200), false), SweepDecision::Skipped);
        assert_eq!(s.poll(ms(300), false), SweepDecision::Skipped);
        assert_eq!(s.skipped(), 2);
        s.finish();
        assert_eq!(s.poll(ms(400), false), SweepDecision::Due);
    }

    #[test]
    fn busy_caller_skips() {
        let mut s = Sweeper::new(ms(100));
        s.arm(ms(0));
        assert_eq!(s.poll(ms(100), true), SweepDecision::Skipped);
        assert!(!s.is_in_flight());
    }

    #[test]
    fn cancelled_is_never_due() {
        let mut s = Sweeper::new(ms(100));
        s.arm(ms(0));
        assert_eq!(s.poll(ms(100), false), SweepDecision::Due);
        s.cancel();
        assert!(!s.is_armed());
        assert!(!s.is_in_flight());
        assert_eq!(s.poll(ms(10_000), false), SweepDecision::Idle);
        assert_eq!(s.sweeps(), 0);
    }
}
