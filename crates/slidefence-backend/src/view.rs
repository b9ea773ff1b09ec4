//! Selector-matching snapshot of a host document.
//!
//! Sibling combinators and structural pseudo-classes need the whole tree,
//! not just an ancestor chain, so exclusion checks run against a
//! [`DocumentView`] captured once per scan.

use rustc_hash::FxHashMap;
use slidefence_core::{ElementIx, ElementTree, TreeElement};

use crate::{DocumentHost, NodeId};

/// [`ElementTree`] of one document plus the host ids of its elements.
#[derive(Debug, Clone, Default)]
pub struct DocumentView {
    tree: ElementTree,
    index: FxHashMap<NodeId, ElementIx>,
}

impl DocumentView {
    /// Capture the document that contains `node`, from its topmost ancestor
    /// down, in document order.
    pub fn capture<H: DocumentHost + ?Sized>(host: &H, node: NodeId) -> Self {
        let mut root = node;
        while let Some(parent) = host.parent(root) {
            root = parent;
        }

        let mut view = Self::default();
        let mut stack = vec![(root, None)];
        while let Some((current, parent)) = stack.pop() {
            let Some(desc) = host.describe(current) else {
                continue;
            };
            let ix = view.tree.push(parent, desc);
            view.index.insert(current, ix);
            let children = host.children(current);
            if children.is_empty() {
                let has_text = host
                    .text_content(current)
                    .is_some_and(|text| !text.is_empty());
                view.tree.set_has_text(ix, has_text);
            }
            stack.extend(children.into_iter().rev().map(|child| (child, Some(ix))));
        }
        view
    }

    /// Matching handle for `node`; `None` if it was not part of the capture.
    pub fn element(&self, node: NodeId) -> Option<TreeElement<'_>> {
        self.index.get(&node).and_then(|&ix| self.tree.element(ix))
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
