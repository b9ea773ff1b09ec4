//! In-memory document with a static box model.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};
use slidefence_backend::{
    DocumentHost, HostCapabilities, HostClock, HostError, HostNotification, IntersectionEntry,
    MutationRecord, NodeId, ResizeEntry, ScrollMetrics,
};
use slidefence_core::{ElementDescriptor, Position, Rect, StyleProperty, format_px, parse_px};

use crate::DeterministicClock;

const DEFAULT_FONT_SIZE_PX: f64 = 16.0;

/// Declarative description of an element (and optional subtree) to insert.
#[derive(Debug, Clone)]
pub struct ElementSpec {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    rect: Rect,
    stylesheet: BTreeMap<StyleProperty, String>,
    inline: BTreeMap<StyleProperty, String>,
    text: String,
    ready: bool,
    children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            rect: Rect::default(),
            stylesheet: BTreeMap::new(),
            inline: BTreeMap::new(),
            text: String::new(),
            ready: true,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Rendered border box in viewport coordinates.
    #[must_use]
    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Rect::new(x, y, width, height);
        self
    }

    /// Cascaded (non-inline) style value.
    #[must_use]
    pub fn computed(mut self, property: StyleProperty, value: impl Into<String>) -> Self {
        self.stylesheet.insert(property, value.into());
        self
    }

    /// Author-written inline style value.
    #[must_use]
    pub fn inline(mut self, property: StyleProperty, value: impl Into<String>) -> Self {
        self.inline.insert(property, value.into());
        self
    }

    #[must_use]
    pub fn position(self, position: Position) -> Self {
        let value = match position {
            Position::Static => "static",
            Position::Relative => "relative",
            Position::Absolute => "absolute",
            Position::Fixed => "fixed",
            Position::Sticky => "sticky",
        };
        self.computed(StyleProperty::Position, value)
    }

    #[must_use]
    pub fn font_size(self, px: f64) -> Self {
        self.computed(StyleProperty::FontSize, format_px(px))
    }

    #[must_use]
    pub fn padding(self, px: f64) -> Self {
        self.computed(StyleProperty::Padding, format_px(px))
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Mark resources under this element (e.g. an image) as still loading.
    #[must_use]
    pub fn pending(mut self) -> Self {
        self.ready = false;
        self
    }

    #[must_use]
    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// One inline style write, captured for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleWrite {
    pub node: NodeId,
    pub property: StyleProperty,
    pub value: String,
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    layout: Rect,
    stylesheet: BTreeMap<StyleProperty, String>,
    inline: BTreeMap<StyleProperty, String>,
    text: String,
    ready: bool,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// Host-driven in-memory document.
///
/// Every change made through this type queues the notification a browser
/// would deliver: child-list and attribute records immediately, resize and
/// intersection entries when [`flush_layout`](Self::flush_layout) runs
/// (the analogue of a rendering frame). Notifications for capabilities the
/// document does not advertise are never queued.
#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    clock: DeterministicClock,
    capabilities: HostCapabilities,
    queue: VecDeque<HostNotification>,
    intersection_roots: Vec<NodeId>,
    reported_sizes: FxHashMap<NodeId, (f64, f64)>,
    reported_ratios: FxHashMap<NodeId, f64>,
    writes: Vec<StyleWrite>,
    rejecting: FxHashSet<NodeId>,
}

impl HeadlessDocument {
    /// Create a document whose root (`html`) covers a viewport of the given
    /// size. All capabilities are enabled.
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        let root_data = NodeData {
            tag: "html".to_string(),
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
            layout: Rect::from_size(viewport_width, viewport_height),
            stylesheet: BTreeMap::new(),
            inline: BTreeMap::new(),
            text: String::new(),
            ready: true,
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                data: Some(root_data),
            }],
            free: Vec::new(),
            root: NodeId::new(0, 0),
            clock: DeterministicClock::new(),
            capabilities: HostCapabilities::all(),
            queue: VecDeque::new(),
            intersection_roots: Vec::new(),
            reported_sizes: FxHashMap::default(),
            reported_ratios: FxHashMap::default(),
            writes: Vec::new(),
            rejecting: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn set_capabilities(&mut self, capabilities: HostCapabilities) {
        self.capabilities = capabilities;
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Advance the monotonic clock.
    pub fn advance(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Jump the clock forward to `now`; earlier instants are ignored.
    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Insert `spec` (and its subtree) as the last child of `parent`.
    ///
    /// Queues one child-list record naming the subtree root.
    pub fn append(&mut self, parent: NodeId, spec: ElementSpec) -> Result<NodeId, HostError> {
        if self.get(parent).is_none() {
            return Err(HostError::Detached(parent));
        }
        let id = self.insert_subtree(parent, spec);
        self.emit_mutation(MutationRecord::ChildList {
            target: parent,
            added: vec![id],
            removed: Vec::new(),
        });
        Ok(id)
    }

    fn insert_subtree(&mut self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let ElementSpec {
            tag,
            id,
            classes,
            attributes,
            rect,
            stylesheet,
            inline,
            text,
            ready,
            children,
        } = spec;
        let node = self.alloc(NodeData {
            tag,
            id,
            classes,
            attributes,
            parent: Some(parent),
            children: Vec::new(),
            layout: rect,
            stylesheet,
            inline,
            text,
            ready,
        });
        if let Some(p) = self.get_mut(parent) {
            p.children.push(node);
        }
        for child in children {
            self.insert_subtree(node, child);
        }
        node
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = Some(data);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(data),
            });
            NodeId::new(index, 0)
        }
    }

    /// Remove `node` and its subtree. Outstanding ids stop resolving.
    pub fn remove(&mut self, node: NodeId) -> Result<(), HostError> {
        if node == self.root {
            return Err(HostError::RejectedAttribute {
                name: "root".to_string(),
            });
        }
        let parent = self
            .get(node)
            .ok_or(HostError::Detached(node))?
            .parent
            .ok_or(HostError::Detached(node))?;
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|c| *c != node);
        }
        let mut stack = vec![node];
        while let Some(next) = stack.pop() {
            let index = next.index() as usize;
            if let Some(data) = self.slots[index].data.take() {
                stack.extend(data.children);
                self.slots[index].generation = self.slots[index].generation.wrapping_add(1);
                self.free.push(next.index());
                self.reported_sizes.remove(&next);
                self.reported_ratios.remove(&next);
            }
        }
        self.emit_mutation(MutationRecord::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![node],
        });
        Ok(())
    }

    /// Replace the class list; queues a `class` attribute record.
    pub fn set_classes<I, S>(&mut self, node: NodeId, classes: I) -> Result<(), HostError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data = self.get_mut(node).ok_or(HostError::Detached(node))?;
        data.classes = classes.into_iter().map(Into::into).collect();
        self.emit_mutation(MutationRecord::Attributes {
            target: node,
            name: "class".to_string(),
        });
        Ok(())
    }

    /// Change the declared box, as an external reflow would.
    pub fn set_layout(&mut self, node: NodeId, rect: Rect) -> Result<(), HostError> {
        self.get_mut(node).ok_or(HostError::Detached(node))?.layout = rect;
        Ok(())
    }

    pub fn set_ready(&mut self, node: NodeId, ready: bool) -> Result<(), HostError> {
        self.get_mut(node).ok_or(HostError::Detached(node))?.ready = ready;
        Ok(())
    }

    /// Make every subsequent style write to `node` fail.
    pub fn reject_style_writes(&mut self, node: NodeId) {
        self.rejecting.insert(node);
    }

    /// Inline style writes made through the host API, oldest first.
    pub fn style_writes(&self) -> &[StyleWrite] {
        &self.writes
    }

    /// Style writes targeting `node`.
    pub fn style_writes_to(&self, node: NodeId) -> Vec<&StyleWrite> {
        self.writes.iter().filter(|w| w.node == node).collect()
    }

    pub fn clear_style_writes(&mut self) {
        self.writes.clear();
    }

    /// Queue a notification directly.
    pub fn push_notification(&mut self, notification: HostNotification) {
        self.queue.push_back(notification);
    }

    /// Compare current geometry against what was last reported and queue
    /// resize/intersection entries for every element that changed.
    pub fn flush_layout(&mut self) {
        let elements = self.descendants(self.root);

        for node in elements {
            let Some(rect) = self.effective_rect(node) else {
                continue;
            };
            if self.capabilities.contains(HostCapabilities::RESIZE) {
                let size = (rect.width, rect.height);
                if self.reported_sizes.get(&node) != Some(&size) {
                    self.reported_sizes.insert(node, size);
                    self.queue.push_back(HostNotification::Resize(ResizeEntry {
                        target: node,
                        width: rect.width,
                        height: rect.height,
                    }));
                }
            }
            if !self.capabilities.contains(HostCapabilities::INTERSECTION) {
                continue;
            }
            let root_rect = self
                .intersection_roots
                .iter()
                .find(|r| **r != node && self.contains(**r, node))
                .and_then(|r| self.effective_rect(*r));
            if let Some(root_rect) = root_rect {
                let ratio = rect.visible_ratio_in(&root_rect);
                if self.reported_ratios.get(&node) != Some(&ratio) {
                    self.reported_ratios.insert(node, ratio);
                    self.queue
                        .push_back(HostNotification::Intersection(IntersectionEntry {
                            target: node,
                            ratio,
                        }));
                }
            }
        }
    }

    /// Flush layout, then drain all queued notifications.
    pub fn drain_notifications(&mut self) -> Vec<HostNotification> {
        self.flush_layout();
        self.queue.drain(..).collect()
    }

    /// Drop queued notifications without delivering them.
    pub fn discard_notifications(&mut self) {
        self.flush_layout();
        self.queue.clear();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn get(&self, id: NodeId) -> Option<&NodeData> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.data.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.data.as_mut()
    }

    fn emit_mutation(&mut self, record: MutationRecord) {
        if self.capabilities.contains(HostCapabilities::MUTATION) {
            self.queue.push_back(HostNotification::Mutation(record));
        }
    }

    fn resolved(&self, data: &NodeData, property: StyleProperty) -> Option<String> {
        data.inline
            .get(&property)
            .or_else(|| data.stylesheet.get(&property))
            .cloned()
    }

    fn position_of(&self, data: &NodeData) -> Position {
        self.resolved(data, StyleProperty::Position)
            .map(|v| Position::parse(&v))
            .unwrap_or_default()
    }

    /// Resolve a `max-*` limit against the parent's extent.
    fn limit(value: Option<&String>, parent_extent: Option<f64>) -> Option<f64> {
        let value = value?.trim();
        if let Some(pct) = value.strip_suffix('%') {
            let pct = parse_px(pct)?;
            return parent_extent.map(|extent| extent * pct / 100.0);
        }
        if value.ends_with("px") {
            return parse_px(value);
        }
        None
    }

    /// The box this model reports for `id`.
    ///
    /// Declared rect, scaled by any inline font-size change on text boxes,
    /// shrunk by inline padding reductions, re-anchored by inline
    /// `left`/`top` for out-of-flow elements, then clamped by inline
    /// `max-width`/`max-height`.
    /// `display: none` on `node` or any ancestor below `within` removes it
    /// from layout.
    fn is_displayed(&self, node: NodeId, within: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == within {
                return true;
            }
            let Some(data) = self.get(current) else {
                return false;
            };
            if self.resolved(data, StyleProperty::Display).as_deref() == Some("none") {
                return false;
            }
            cursor = data.parent;
        }
        true
    }

    fn effective_rect(&self, id: NodeId) -> Option<Rect> {
        let data = self.get(id)?;
        let parent_rect = data.parent.and_then(|p| self.effective_rect(p));
        let mut rect = data.layout;

        if !data.text.is_empty() {
            if let Some(font) = data.inline.get(&StyleProperty::FontSize).and_then(|v| parse_px(v)) {
                let base = data
                    .stylesheet
                    .get(&StyleProperty::FontSize)
                    .and_then(|v| parse_px(v))
                    .unwrap_or(DEFAULT_FONT_SIZE_PX);
                if base > 0.0 {
                    let k = font / base;
                    rect.width *= k;
                    rect.height *= k;
                }
            }
        }

        if let Some(padding) = data.inline.get(&StyleProperty::Padding).and_then(|v| parse_px(v)) {
            let base = data
                .stylesheet
                .get(&StyleProperty::Padding)
                .and_then(|v| parse_px(v))
                .unwrap_or(0.0);
            let shrink = (base - padding).max(0.0) * 2.0;
            rect.width = (rect.width - shrink).max(0.0);
            rect.height = (rect.height - shrink).max(0.0);
        }

        if self.position_of(data).is_out_of_flow() {
            if let Some(parent) = parent_rect {
                if let Some(left) = data.inline.get(&StyleProperty::Left).and_then(|v| parse_px(v)) {
                    rect.x = parent.x + left;
                }
                if let Some(top) = data.inline.get(&StyleProperty::Top).and_then(|v| parse_px(v)) {
                    rect.y = parent.y + top;
                }
            }
        }

        if let Some(max) = Self::limit(
            data.inline.get(&StyleProperty::MaxWidth),
            parent_rect.map(|p| p.width),
        ) {
            rect.width = rect.width.min(max.max(0.0));
        }
        if let Some(max) = Self::limit(
            data.inline.get(&StyleProperty::MaxHeight),
            parent_rect.map(|p| p.height),
        ) {
            rect.height = rect.height.min(max.max(0.0));
        }
        Some(rect)
    }

    fn default_computed(&self, id: NodeId, data: &NodeData, property: StyleProperty) -> String {
        match property {
            StyleProperty::BoxSizing => "content-box".to_string(),
            StyleProperty::Contain => "none".to_string(),
            StyleProperty::Display => "block".to_string(),
            StyleProperty::FontSize => format_px(DEFAULT_FONT_SIZE_PX),
            StyleProperty::Padding => "0px".to_string(),
            StyleProperty::Position => "static".to_string(),
            StyleProperty::Visibility => "visible".to_string(),
            StyleProperty::Overflow | StyleProperty::OverflowX | StyleProperty::OverflowY => {
                "visible".to_string()
            }
            StyleProperty::TextOverflow => "clip".to_string(),
            StyleProperty::MaxWidth | StyleProperty::MaxHeight => "none".to_string(),
            StyleProperty::Left | StyleProperty::Top => {
                let parent = data.parent.and_then(|p| self.effective_rect(p));
                match (self.position_of(data).is_out_of_flow(), parent) {
                    (true, Some(parent)) => {
                        let offset = if property == StyleProperty::Left {
                            data.layout.x - parent.x
                        } else {
                            data.layout.y - parent.y
                        };
                        format_px(offset)
                    }
                    _ => "auto".to_string(),
                }
            }
            StyleProperty::Width | StyleProperty::Height => {
                let rect = self.effective_rect(id).unwrap_or_default();
                if property == StyleProperty::Width {
                    format_px(rect.width)
                } else {
                    format_px(rect.height)
                }
            }
        }
    }
}

impl HostClock for HeadlessDocument {
    fn now_mono(&self) -> Duration {
        self.clock.now_mono()
    }
}

impl DocumentHost for HeadlessDocument {
    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node).map(|d| d.children.clone()).unwrap_or_default()
    }

    fn describe(&self, node: NodeId) -> Option<ElementDescriptor> {
        let data = self.get(node)?;
        Some(ElementDescriptor {
            tag: data.tag.clone(),
            id: data.id.clone(),
            classes: data.classes.clone(),
            attributes: data.attributes.clone(),
        })
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.effective_rect(node)
    }

    fn inline_style(&self, node: NodeId, property: StyleProperty) -> Option<String> {
        self.get(node)?.inline.get(&property).cloned()
    }

    fn computed_style(&self, node: NodeId, property: StyleProperty) -> Option<String> {
        let data = self.get(node)?;
        match property {
            // Used values reflect clamping, like a real engine.
            StyleProperty::Width | StyleProperty::Height => {
                Some(self.default_computed(node, data, property))
            }
            _ => Some(
                self.resolved(data, property)
                    .unwrap_or_else(|| self.default_computed(node, data, property)),
            ),
        }
    }

    fn set_inline_style(
        &mut self,
        node: NodeId,
        property: StyleProperty,
        value: &str,
    ) -> Result<(), HostError> {
        if self.rejecting.contains(&node) {
            return Err(HostError::RejectedStyle {
                property,
                value: value.to_string(),
            });
        }
        let data = self.get_mut(node).ok_or(HostError::Detached(node))?;
        if value.is_empty() {
            data.inline.remove(&property);
        } else {
            data.inline.insert(property, value.to_string());
        }
        self.writes.push(StyleWrite {
            node,
            property,
            value: value.to_string(),
        });
        self.emit_mutation(MutationRecord::Attributes {
            target: node,
            name: "style".to_string(),
        });
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), HostError> {
        let data = self.get_mut(node).ok_or(HostError::Detached(node))?;
        match data.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => data.attributes.push((name.to_string(), value.to_string())),
        }
        self.emit_mutation(MutationRecord::Attributes {
            target: node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn is_ready(&self, node: NodeId) -> bool {
        let Some(data) = self.get(node) else {
            return true;
        };
        data.ready
            && self
                .descendants(node)
                .into_iter()
                .all(|d| self.get(d).is_none_or(|n| n.ready))
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        let mut out = self.get(node)?.text.clone();
        for d in self.descendants(node) {
            if let Some(data) = self.get(d) {
                out.push_str(&data.text);
            }
        }
        Some(out)
    }

    fn observe_intersections(&mut self, root: NodeId) {
        if !self.intersection_roots.contains(&root) {
            self.intersection_roots.push(root);
        }
    }

    fn scroll_metrics(&self, node: NodeId) -> Option<ScrollMetrics> {
        let rect = self.effective_rect(node)?;
        let mut right = rect.right();
        let mut bottom = rect.bottom();
        for d in self.descendants(node) {
            if !self.is_displayed(d, node) {
                continue;
            }
            if let Some(r) = self.effective_rect(d) {
                right = right.max(r.right());
                bottom = bottom.max(r.bottom());
            }
        }
        Some(ScrollMetrics {
            scroll_width: right - rect.x,
            scroll_height: bottom - rect.y,
            client_width: rect.width,
            client_height: rect.height,
        })
    }
}
