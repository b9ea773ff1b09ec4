#![forbid(unsafe_code)]
#![doc = "Host traits for slidefence: the boundary between the overflow engine and a rendered document."]
#![doc = ""]
#![doc = "The engine never computes layout. Everything it knows about the document"]
#![doc = "(tree shape, rendered boxes, computed and inline styles, readiness, time)"]
#![doc = "flows through [`DocumentHost`]. Change detection is host-driven: the host"]
#![doc = "pushes [`HostNotification`] values, and advances its monotonic clock."]

use core::fmt;
use core::time::Duration;

use bitflags::bitflags;
use slidefence_core::{ElementDescriptor, Rect, StyleProperty};
use thiserror::Error;

mod view;

pub use view::DocumentView;

/// Stable identity of a rendered element.
///
/// Generational: once a node is removed, its id is never reused for a
/// different node, so a stale id held by the engine simply stops resolving.
/// Holding a `NodeId` does not keep the node alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a single integer for logs and serialized snapshots.
    #[inline]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}v{}", self.index, self.generation)
    }
}

bitflags! {
    /// Change-observation facilities a host provides.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HostCapabilities: u8 {
        /// Subtree insertion/removal and attribute change records.
        const MUTATION = 0b001;
        /// Per-element box size change entries.
        const RESIZE = 0b010;
        /// Visibility ratio entries against a root element.
        const INTERSECTION = 0b100;
    }
}

/// One of the three change-detection sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObserverKind {
    Structural,
    Size,
    Boundary,
}

impl ObserverKind {
    pub const ALL: [ObserverKind; 3] = [Self::Structural, Self::Size, Self::Boundary];

    /// Host capability this source depends on.
    pub const fn required_capability(self) -> HostCapabilities {
        match self {
            Self::Structural => HostCapabilities::MUTATION,
            Self::Size => HostCapabilities::RESIZE,
            Self::Boundary => HostCapabilities::INTERSECTION,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Size => "size",
            Self::Boundary => "boundary",
        }
    }
}

impl fmt::Display for ObserverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-side failure for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("node {0} is not attached to the document")]
    Detached(NodeId),

    #[error("host rejected {property}: {value:?}")]
    RejectedStyle {
        property: StyleProperty,
        value: String,
    },

    #[error("host rejected attribute {name}")]
    RejectedAttribute { name: String },
}

/// Scroll extent vs visible client box of a scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_width: f64,
    pub scroll_height: f64,
    pub client_width: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Hidden horizontal extent.
    pub fn horizontal_excess(&self) -> f64 {
        (self.scroll_width - self.client_width).max(0.0)
    }

    /// Hidden vertical extent.
    pub fn vertical_excess(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }
}

/// A structural change record.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationRecord {
    /// Children inserted into and/or removed from `target`.
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// Attribute `name` changed on `target`.
    Attributes { target: NodeId, name: String },
}

/// A box-size change for one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEntry {
    pub target: NodeId,
    pub width: f64,
    pub height: f64,
}

/// A visibility ratio report for one element against the observation root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    /// Visible fraction of the target's box in `[0, 1]`.
    pub ratio: f64,
}

/// Change notification pushed by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostNotification {
    Mutation(MutationRecord),
    Resize(ResizeEntry),
    Intersection(IntersectionEntry),
}

impl HostNotification {
    /// Observation source this notification belongs to.
    pub const fn kind(&self) -> ObserverKind {
        match self {
            Self::Mutation(_) => ObserverKind::Structural,
            Self::Resize(_) => ObserverKind::Size,
            Self::Intersection(_) => ObserverKind::Boundary,
        }
    }
}

/// Monotonic clock abstraction.
///
/// Browser hosts map this to `performance.now()`; headless hosts advance it
/// explicitly. The engine never reads wall-clock time directly.
pub trait HostClock {
    /// Elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;
}

/// A rendered document the engine can inspect and patch.
///
/// Read methods return `None` for nodes that are unknown or detached.
/// Implementations must be deterministic between mutations: two reads with
/// no intervening write return the same value.
pub trait DocumentHost: HostClock {
    /// Observation facilities this host can deliver notifications for.
    fn capabilities(&self) -> HostCapabilities;

    /// Whether `node` is currently attached to the document.
    fn is_connected(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Element children in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Tag, id, classes, and attributes of `node`.
    fn describe(&self, node: NodeId) -> Option<ElementDescriptor>;

    /// Border-box rect in viewport coordinates.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Explicit inline value, if one is set.
    fn inline_style(&self, node: NodeId, property: StyleProperty) -> Option<String>;

    /// Resolved value after cascade.
    fn computed_style(&self, node: NodeId, property: StyleProperty) -> Option<String>;

    fn set_inline_style(
        &mut self,
        node: NodeId,
        property: StyleProperty,
        value: &str,
    ) -> Result<(), HostError>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), HostError>;

    /// Whether resources under `node` (images, fonts) have settled.
    fn is_ready(&self, node: NodeId) -> bool {
        let _ = node;
        true
    }

    /// Concatenated text of `node` and its descendants.
    fn text_content(&self, node: NodeId) -> Option<String> {
        let _ = node;
        None
    }

    /// Scroll extent of `node`, when the host can report it.
    fn scroll_metrics(&self, node: NodeId) -> Option<ScrollMetrics> {
        let _ = node;
        None
    }

    /// Start reporting visibility ratios of `root`'s descendants against
    /// `root`. Hosts without [`HostCapabilities::INTERSECTION`] ignore this.
    fn observe_intersections(&mut self, root: NodeId) {
        let _ = root;
    }

    /// All element descendants of `node` in document order (pre-order),
    /// excluding `node` itself.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// Whether `node` is `ancestor` or lies inside it.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }
}
