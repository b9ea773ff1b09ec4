//! Baseline containment styles.
//!
//! # Invariants
//!
//! 1. An inline property that already has a value is never overwritten.
//! 2. Applying to an element that is already marked performs no writes.
//! 3. An element is marked only after all of its writes succeeded, so a
//!    failed pass is retried on the next insertion or scan.

use rustc_hash::FxHashSet;
use slidefence_backend::{DocumentHost, HostError, NodeId};
use slidefence_core::{Position, StyleProperty};

/// Attribute set on elements that received baseline constraints.
pub const CONSTRAINED_ATTR: &str = "data-overflow-constrained";

/// Attribute set on a hardened container.
pub const PREVENTED_ATTR: &str = "data-overflow-prevented";

const CONTAINER_STYLES: [(StyleProperty, &str); 6] = [
    (StyleProperty::Overflow, "hidden"),
    (StyleProperty::OverflowX, "hidden"),
    (StyleProperty::OverflowY, "hidden"),
    (StyleProperty::Contain, "layout style paint"),
    (StyleProperty::Position, "relative"),
    (StyleProperty::BoxSizing, "border-box"),
];

/// Per-engine record of which elements have been constrained.
#[derive(Debug, Default, Clone)]
pub struct Constraints {
    marked: FxHashSet<NodeId>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply baseline constraints to `element`.
    ///
    /// Returns `true` if this call marked the element, `false` if it was
    /// already marked.
    pub fn apply<H: DocumentHost + ?Sized>(
        &mut self,
        host: &mut H,
        element: NodeId,
    ) -> Result<bool, HostError> {
        if self.marked.contains(&element) {
            return Ok(false);
        }
        if !host.is_connected(element) {
            return Err(HostError::Detached(element));
        }

        set_if_unset(host, element, StyleProperty::BoxSizing, "border-box")?;
        set_if_unset(host, element, StyleProperty::MaxWidth, "100%")?;

        let position = host
            .computed_style(element, StyleProperty::Position)
            .map(|v| Position::parse(&v))
            .unwrap_or_default();
        if position.is_out_of_flow() {
            set_if_unset(host, element, StyleProperty::MaxHeight, "100%")?;
        }

        host.set_attribute(element, CONSTRAINED_ATTR, "true")?;
        self.marked.insert(element);
        Ok(true)
    }

    #[inline]
    pub fn is_marked(&self, element: NodeId) -> bool {
        self.marked.contains(&element)
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Drop marks for nodes that fail `is_live`.
    pub fn retain(&mut self, mut is_live: impl FnMut(NodeId) -> bool) {
        self.marked.retain(|id| is_live(*id));
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }
}

fn set_if_unset<H: DocumentHost + ?Sized>(
    host: &mut H,
    element: NodeId,
    property: StyleProperty,
    value: &str,
) -> Result<(), HostError> {
    let existing = host.inline_style(element, property);
    if existing.as_deref().is_some_and(|v| !v.is_empty()) {
        return Ok(());
    }
    host.set_inline_style(element, property, value)
}

/// Force the container to clip and isolate its content.
///
/// Writes only properties whose inline value differs, so repeated calls are
/// silent.
pub fn harden_container<H: DocumentHost + ?Sized>(
    host: &mut H,
    container: NodeId,
) -> Result<(), HostError> {
    for (property, value) in CONTAINER_STYLES {
        if host.inline_style(container, property).as_deref() != Some(value) {
            host.set_inline_style(container, property, value)?;
        }
    }
    let already = host
        .describe(container)
        .and_then(|d| d.attribute(PREVENTED_ATTR).map(|s| s.into_owned()));
    if already.as_deref() != Some("true") {
        host.set_attribute(container, PREVENTED_ATTR, "true")?;
    }
    Ok(())
}
