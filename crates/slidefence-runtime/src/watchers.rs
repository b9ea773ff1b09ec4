//! Observation adapters.
//!
//! Each watcher turns one kind of [`HostNotification`] into [`Recheck`]
//! requests. Watchers hold no reference to the engine; the engine feeds
//! them notifications and executes what they return through a single
//! recheck path.
//!
//! # Invariants
//!
//! 1. A disconnected watcher returns no requests.
//! 2. Notifications for nodes outside the container subtree are ignored.
//! 3. The boundary watcher requests a recheck only when the reported ratio
//!    crosses one of [`BOUNDARY_THRESHOLDS`] relative to the previous report
//!    for that element, and the new ratio is below `1.0`.

use rustc_hash::{FxHashMap, FxHashSet};
use slidefence_backend::{
    DocumentHost, HostCapabilities, HostNotification, IntersectionEntry, MutationRecord, NodeId,
    ObserverKind, ResizeEntry,
};

/// Visibility ratios at which the boundary watcher fires.
pub const BOUNDARY_THRESHOLDS: [f64; 5] = [0.0, 0.1, 0.5, 0.9, 1.0];

/// Attributes whose change can move an element's box.
const WATCHED_ATTRIBUTES: [&str; 2] = ["style", "class"];

/// Work requested by a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recheck {
    /// Re-measure one element.
    Element(NodeId),
    /// Constrain and measure a newly inserted element and its descendants.
    Subtree(NodeId),
    /// Re-measure everything under the container.
    FullScan,
    /// An element left the document; drop state for it.
    Forget(NodeId),
}

/// Child-list and attribute records.
#[derive(Debug, Default, Clone)]
pub struct StructuralWatcher {
    connected: bool,
}

impl StructuralWatcher {
    pub fn translate<H: DocumentHost + ?Sized>(
        &self,
        host: &H,
        container: NodeId,
        record: &MutationRecord,
    ) -> Vec<Recheck> {
        if !self.connected {
            return Vec::new();
        }
        match record {
            MutationRecord::ChildList {
                target,
                added,
                removed,
            } => {
                let mut out: Vec<Recheck> = removed.iter().copied().map(Recheck::Forget).collect();
                if host.contains(container, *target) {
                    out.extend(
                        added
                            .iter()
                            .copied()
                            .filter(|n| host.is_connected(*n))
                            .map(Recheck::Subtree),
                    );
                }
                out
            }
            MutationRecord::Attributes { target, name } => {
                let relevant = WATCHED_ATTRIBUTES.contains(&name.as_str())
                    && *target != container
                    && host.contains(container, *target);
                if relevant {
                    vec![Recheck::Element(*target)]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

/// Box-size changes for observed elements.
#[derive(Debug, Default, Clone)]
pub struct SizeWatcher {
    connected: bool,
    observed: FxHashSet<NodeId>,
}

impl SizeWatcher {
    pub fn observe(&mut self, node: NodeId) {
        self.observed.insert(node);
    }

    pub fn is_observing(&self, node: NodeId) -> bool {
        self.observed.contains(&node)
    }

    pub fn observed_len(&self) -> usize {
        self.observed.len()
    }

    pub fn retain(&mut self, mut is_live: impl FnMut(NodeId) -> bool) {
        self.observed.retain(|id| is_live(*id));
    }

    pub fn translate(&self, container: NodeId, entry: &ResizeEntry) -> Vec<Recheck> {
        if !self.connected {
            return Vec::new();
        }
        if entry.target == container {
            vec![Recheck::FullScan]
        } else if self.observed.contains(&entry.target) {
            vec![Recheck::Element(entry.target)]
        } else {
            Vec::new()
        }
    }
}

/// Visibility ratio reports against the container.
#[derive(Debug, Default, Clone)]
pub struct BoundaryWatcher {
    connected: bool,
    last: FxHashMap<NodeId, f64>,
}

impl BoundaryWatcher {
    pub fn translate<H: DocumentHost + ?Sized>(
        &mut self,
        host: &H,
        container: NodeId,
        entry: &IntersectionEntry,
    ) -> Vec<Recheck> {
        if !self.connected || entry.target == container || !host.contains(container, entry.target)
        {
            return Vec::new();
        }
        let crossed = match self.last.insert(entry.target, entry.ratio) {
            Some(previous) => band(previous) != band(entry.ratio),
            None => true,
        };
        if crossed && entry.ratio < 1.0 {
            vec![Recheck::Element(entry.target)]
        } else {
            Vec::new()
        }
    }

    pub fn retain(&mut self, mut is_live: impl FnMut(NodeId) -> bool) {
        self.last.retain(|id, _| is_live(*id));
    }
}

/// Index of the threshold band `ratio` falls into. The `0.0` threshold is
/// crossed on any transition between "not intersecting" and "intersecting".
fn band(ratio: f64) -> usize {
    BOUNDARY_THRESHOLDS
        .iter()
        .filter(|&&t| if t == 0.0 { ratio > 0.0 } else { ratio >= t })
        .count()
}

/// The three watchers plus their connection state.
#[derive(Debug, Default, Clone)]
pub struct WatcherSet {
    pub structural: StructuralWatcher,
    pub size: SizeWatcher,
    pub boundary: BoundaryWatcher,
}

impl WatcherSet {
    /// Connect `kinds` that `capabilities` supports. Returns the kinds that
    /// could not be connected.
    pub fn connect(
        &mut self,
        kinds: &[ObserverKind],
        capabilities: HostCapabilities,
    ) -> Vec<ObserverKind> {
        let mut unsupported = Vec::new();
        for &kind in kinds {
            if capabilities.contains(kind.required_capability()) {
                self.set_connected(kind, true);
            } else {
                unsupported.push(kind);
            }
        }
        unsupported
    }

    /// Disconnect one watcher. Returns whether it was connected.
    pub fn disconnect(&mut self, kind: ObserverKind) -> bool {
        let was = self.is_connected(kind);
        self.set_connected(kind, false);
        was
    }

    pub fn disconnect_all(&mut self) {
        for kind in ObserverKind::ALL {
            self.set_connected(kind, false);
        }
        self.boundary.last.clear();
    }

    pub fn is_connected(&self, kind: ObserverKind) -> bool {
        match kind {
            ObserverKind::Structural => self.structural.connected,
            ObserverKind::Size => self.size.connected,
            ObserverKind::Boundary => self.boundary.connected,
        }
    }

    pub fn connected(&self) -> Vec<ObserverKind> {
        ObserverKind::ALL
            .into_iter()
            .filter(|k| self.is_connected(*k))
            .collect()
    }

    fn set_connected(&mut self, kind: ObserverKind, on: bool) {
        match kind {
            ObserverKind::Structural => self.structural.connected = on,
            ObserverKind::Size => self.size.connected = on,
            ObserverKind::Boundary => self.boundary.connected = on,
        }
    }

    /// Route one notification to its watcher.
    pub fn translate<H: DocumentHost + ?Sized>(
        &mut self,
        host: &H,
        container: NodeId,
        notification: &HostNotification,
    ) -> Vec<Recheck> {
        match notification {
            HostNotification::Mutation(record) => {
                self.structural.translate(host, container, record)
            }
            HostNotification::Resize(entry) => self.size.translate(container, entry),
            HostNotification::Intersection(entry) => {
                self.boundary.translate(host, container, entry)
            }
        }
    }

    /// Drop per-node state for nodes that fail `is_live`.
    pub fn retain(&mut self, mut is_live: impl FnMut(NodeId) -> bool) {
        self.size.retain(&mut is_live);
        self.boundary.retain(&mut is_live);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use slidefence_headless::{ElementSpec, HeadlessDocument};

    fn setup() -> (HeadlessDocument, NodeId, NodeId) {
        let mut doc = HeadlessDocument::new(1920.0, 1080.0);
        let root = doc.root();
        let section = doc.append(root, ElementSpec::new("section")).unwrap();
        let p = doc.append(section, ElementSpec::new("p")).unwrap();
        (doc, section, p)
    }

    fn connected_all() -> WatcherSet {
        let mut set = WatcherSet::default();
        assert!(set.connect(&ObserverKind::ALL, HostCapabilities::all()).is_empty());
        set
    }

    #[test]
    fn band_edges() {
        assert_eq!(band(0.0), 0);
        assert_eq!(band(0.05), 1);
        assert_eq!(band(0.1), 2);
        assert_eq!(band(0.6), 3);
        assert_eq!(band(0.95), 4);
        assert_eq!(band(1.0), 5);
    }

    #[test]
    fn boundary_fires_on_crossing_below_one() {
        let (doc, section, p) = setup();
        let mut set = connected_all();
        let entry = |ratio| IntersectionEntry { target: p, ratio };

        assert_eq!(
            set.boundary.translate(&doc, section, &entry(0.95)),
            vec![Recheck::Element(p)]
        );
        // Same band: no callback.
        assert!(set.boundary.translate(&doc, section, &entry(0.92)).is_empty());
        // Crossed 0.9.
        assert_eq!(
            set.boundary.translate(&doc, section, &entry(0.7)),
            vec![Recheck::Element(p)]
        );
        // Crossed 1.0 but fully visible: no recheck.
        assert!(set.boundary.translate(&doc, section, &entry(1.0)).is_empty());
    }

    #[test]
    fn structural_filters_attributes() {
        let (doc, section, p) = setup();
        let set = connected_all();
        let rec = |name: &str| MutationRecord::Attributes {
            target: p,
            name: name.to_string(),
        };
        assert_eq!(
            set.structural.translate(&doc, section, &rec("style")),
            vec![Recheck::Element(p)]
        );
        assert_eq!(
            set.structural.translate(&doc, section, &rec("class")),
            vec![Recheck::Element(p)]
        );
        assert!(
            set.structural
                .translate(&doc, section, &rec("data-overflow-constrained"))
                .is_empty()
        );
    }

    #[test]
    fn structural_ignores_outside_container() {
        let (mut doc, section, _) = setup();
        let root = doc.root();
        let other = doc.append(root, ElementSpec::new("div")).unwrap();
        let set = connected_all();
        let rec = MutationRecord::ChildList {
            target: root,
            added: vec![other],
            removed: vec![],
        };
        assert!(set.structural.translate(&doc, section, &rec).is_empty());
    }

    #[test]
    fn size_routes_container_to_full_scan() {
        let (_, section, p) = setup();
        let mut set = connected_all();
        let entry = |target| ResizeEntry {
            target,
            width: 1.0,
            height: 1.0,
        };
        assert!(set.size.translate(section, &entry(p)).is_empty());
        set.size.observe(p);
        assert_eq!(set.size.translate(section, &entry(p)), vec![Recheck::Element(p)]);
        assert_eq!(set.size.translate(section, &entry(section)), vec![Recheck::FullScan]);
    }

    #[test]
    fn connect_reports_missing_capabilities() {
        let mut set = WatcherSet::default();
        let missing = set.connect(&ObserverKind::ALL, HostCapabilities::MUTATION);
        assert_eq!(missing, vec![ObserverKind::Size, ObserverKind::Boundary]);
        assert_eq!(set.connected(), vec![ObserverKind::Structural]);
        assert!(set.disconnect(ObserverKind::Structural));
        assert!(!set.disconnect(ObserverKind::Structural));
        assert!(set.connected().is_empty());
    }
}
