//! Violation ledger.
//!
//! # Invariants
//!
//! 1. An element has at most one entry.
//! 2. An entry exists iff the most recent check of that element exceeded
//!    the threshold; a passing check removes it.
//! 3. `attempts` survives re-detection of the same element and resets only
//!    when the entry is removed.
//! 4. [`Ledger::prune`] drops entries for nodes that left the document, so
//!    the ledger never keeps stale ids around.

use core::time::Duration;

use rustc_hash::FxHashMap;
use slidefence_backend::NodeId;
use slidefence_core::Overflow;

/// Current overflow record for one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    pub element: NodeId,
    pub overflow: Overflow,
    /// Host monotonic time of the most recent detection.
    pub timestamp: Duration,
    /// A remediation action was applied after the most recent detection.
    pub fixed: bool,
    /// Remediation actions applied since the entry was created.
    pub attempts: u32,
}

#[derive(Debug, Default, Clone)]
pub struct Ledger {
    entries: FxHashMap<NodeId, Violation>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh the entry for `element` with `fixed = false`.
    pub fn record(&mut self, element: NodeId, overflow: Overflow, now: Duration) -> &mut Violation {
        self.record_with(element, overflow, now, false)
    }

    pub fn record_with(
        &mut self,
        element: NodeId,
        overflow: Overflow,
        now: Duration,
        fixed: bool,
    ) -> &mut Violation {
        let entry = self.entries.entry(element).or_insert(Violation {
            element,
            overflow,
            timestamp: now,
            fixed,
            attempts: 0,
        });
        entry.overflow = overflow;
        entry.timestamp = now;
        entry.fixed = fixed;
        entry
    }

    /// Remove the entry for `element`, returning it if present.
    pub fn clear(&mut self, element: NodeId) -> Option<Violation> {
        self.entries.remove(&element)
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, element: NodeId) -> Option<&Violation> {
        self.entries.get(&element)
    }

    pub fn get_mut(&mut self, element: NodeId) -> Option<&mut Violation> {
        self.entries.get_mut(&element)
    }

    /// Set `fixed` on an existing entry. Returns `false` if there is none.
    pub fn mark_fixed(&mut self, element: NodeId) -> bool {
        match self.entries.get_mut(&element) {
            Some(v) => {
                v.fixed = true;
                true
            }
            None => false,
        }
    }

    /// Snapshot of all entries, ordered by element id.
    pub fn all(&self) -> Vec<Violation> {
        let mut out: Vec<Violation> = self.entries.values().copied().collect();
        out.sort_by_key(|v| v.element);
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove entries whose element fails `is_live`. Returns how many were
    /// removed.
    pub fn prune(&mut self, mut is_live: impl FnMut(NodeId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| is_live(*id));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn over(bottom: f64) -> Overflow {
        Overflow {
            bottom,
            ..Overflow::NONE
        }
    }

    #[test]
    fn record_updates_in_place() {
        let mut l = Ledger::new();
        let n = NodeId::new(1, 0);
        l.record(n, over(10.0), Duration::from_millis(5)).attempts = 2;
        l.record_with(n, over(4.0), Duration::from_millis(9), true);
        assert_eq!(l.len(), 1);
        let v = l.get(n).unwrap();
        assert_eq!(v.overflow.bottom, 4.0);
        assert_eq!(v.timestamp, Duration::from_millis(9));
        assert!(v.fixed);
        assert_eq!(v.attempts, 2);

        l.record(n, over(4.0), Duration::from_millis(10));
        assert!(!l.get(n).unwrap().fixed);
    }

    #[test]
    fn clear_resets_attempts() {
        let mut l = Ledger::new();
        let n = NodeId::new(1, 0);
        l.record(n, over(10.0), Duration::ZERO).attempts = 3;
        assert!(l.clear(n).is_some());
        assert!(l.clear(n).is_none());
        assert_eq!(l.record(n, over(10.0), Duration::ZERO).attempts, 0);
    }

    #[test]
    fn mark_fixed_requires_entry() {
        let mut l = Ledger::new();
        assert!(!l.mark_fixed(NodeId::new(2, 0)));
        l.record(NodeId::new(2, 0), over(1.0), Duration::ZERO);
        assert!(l.mark_fixed(NodeId::new(2, 0)));
    }

    #[test]
    fn prune_and_ordering() {
        let mut l = Ledger::new();
        for i in [5, 1, 3] {
            l.record(NodeId::new(i, 0), over(1.0), Duration::ZERO);
        }
        let ids: Vec<u32> = l.all().iter().map(|v| v.element.index()).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert_eq!(l.prune(|id| id.index() != 3), 1);
        assert_eq!(l.len(), 2);
        assert!(l.get(NodeId::new(3, 0)).is_none());
    }
}
