//! Geometry probing against the host.

use slidefence_backend::{DocumentHost, NodeId};
use slidefence_core::{Overflow, Rect};

/// A measurement of one element against the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub element: Rect,
    pub container: Rect,
    pub overflow: Overflow,
}

/// Measures elements against a fixed container.
///
/// Stateless apart from the container id; every call reads fresh rects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prober {
    container: NodeId,
}

impl Prober {
    pub const fn new(container: NodeId) -> Self {
        Self { container }
    }

    #[inline]
    pub const fn container(&self) -> NodeId {
        self.container
    }

    /// Measure `element`. `None` when either box is unavailable (detached
    /// or not rendered), which callers treat as "not checkable".
    pub fn probe<H: DocumentHost + ?Sized>(&self, host: &H, element: NodeId) -> Option<Probe> {
        if !host.is_connected(element) {
            return None;
        }
        let container = host.bounding_rect(self.container)?;
        let rect = host.bounding_rect(element)?;
        Some(Probe {
            element: rect,
            container,
            overflow: Overflow::measure(&rect, &container),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidefence_headless::{ElementSpec, HeadlessDocument};

    #[test]
    fn measures_wide_child() {
        let mut doc = HeadlessDocument::new(1920.0, 1080.0);
        let root = doc.root();
        let section = doc
            .append(root, ElementSpec::new("section").rect(0.0, 0.0, 1920.0, 1080.0))
            .unwrap();
        let wide = doc
            .append(section, ElementSpec::new("div").rect(0.0, 0.0, 2000.0, 100.0))
            .unwrap();
        let probe = Prober::new(section).probe(&doc, wide).unwrap();
        assert_eq!(probe.overflow.right, 80.0);
        assert_eq!(probe.overflow.bottom, 0.0);
        assert_eq!(probe.overflow.top, 0.0);
        assert_eq!(probe.overflow.left, 0.0);
    }

    #[test]
    fn detached_element_is_not_checkable() {
        let mut doc = HeadlessDocument::new(100.0, 100.0);
        let root = doc.root();
        let section = doc.append(root, ElementSpec::new("section")).unwrap();
        let child = doc.append(section, ElementSpec::new("p")).unwrap();
        doc.remove(child).unwrap();
        assert!(Prober::new(section).probe(&doc, child).is_none());
    }
}
