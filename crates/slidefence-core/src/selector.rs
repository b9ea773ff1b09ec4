#![forbid(unsafe_code)]

//! Element selectors for scan exclusion.
//!
//! Selector text is parsed with `cssparser` and matched with the `selectors`
//! engine, so exclusion lists accept ordinary CSS: compound selectors, every
//! combinator, attribute operators, `:not()`, `:is()`, `:where()`, and the
//! tree-structural pseudo-classes.
//!
//! Matching runs against an [`ElementTree`], an arena snapshot of element
//! descriptors. Hosts capture one per scan; tests build one from an ancestor
//! chain with [`ElementTree::from_chain`].
//!
//! # Invariants
//!
//! 1. The document is treated as HTML in no-quirks mode: tag and attribute
//!    names match ASCII case-insensitively, ids and classes case-sensitively.
//! 2. Dynamic user-action states (`:hover`, `:focus`, `:active`,
//!    `:visited`) never match a snapshot.
//! 3. [`SelectorList::matches_self_or_ancestor`] is `closest()`: an element
//!    is covered when it or any ancestor matches.

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::str::FromStr;

use cssparser::{
    BasicParseErrorKind, CowRcStr, ParseError, ParseErrorKind, Parser as CssParser, ParserInput,
    SourceLocation, ToCss,
};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{
    ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode,
    NeedsSelectorFlags, QuirksMode, SelectorCaches, matches_selector,
};
use selectors::parser::{ParseRelative, SelectorImpl, SelectorParseErrorKind};
use selectors::{Element, OpaqueElement};
use thiserror::Error;

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

// ---------------------------------------------------------------------------
// Element descriptors
// ---------------------------------------------------------------------------

/// Static description of an element used for selector matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementDescriptor {
    /// Lowercase tag name.
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

impl ElementDescriptor {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Attribute value by name. `id` and `class` resolve to the dedicated
    /// fields when no explicit attribute of that name is present.
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        if let Some((_, v)) = self
            .attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            return Some(Cow::Borrowed(v.as_str()));
        }
        if name.eq_ignore_ascii_case("id") {
            return self.id.as_deref().map(Cow::Borrowed);
        }
        if name.eq_ignore_ascii_case("class") && !self.classes.is_empty() {
            return Some(Cow::Owned(self.classes.join(" ")));
        }
        None
    }

    /// Short human-readable identifier, e.g. `<div#hero.wide.card>`.
    pub fn identifier(&self) -> String {
        let mut out = String::with_capacity(self.tag.len() + 8);
        out.push('<');
        out.push_str(&self.tag);
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            out.push('#');
            out.push_str(id);
        }
        for class in &self.classes {
            out.push('.');
            out.push_str(class);
        }
        out.push('>');
        out
    }
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

/// Index of an element inside an [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementIx(usize);

impl ElementIx {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    desc: ElementDescriptor,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Position among the parent's children.
    sibling: usize,
    has_text: bool,
}

/// Arena snapshot of an element tree.
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    nodes: Vec<TreeNode>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree holding a single path: `chain[0]` is the deepest element and
    /// `chain[1..]` its ancestors nearest-first.
    pub fn from_chain(chain: &[ElementDescriptor]) -> Self {
        let mut tree = Self::new();
        let mut parent = None;
        for desc in chain.iter().rev() {
            parent = Some(tree.push(parent, desc.clone()));
        }
        tree
    }

    /// Append `desc` as the last child of `parent`. A missing or unknown
    /// parent makes the element a root.
    pub fn push(&mut self, parent: Option<ElementIx>, desc: ElementDescriptor) -> ElementIx {
        let ix = self.nodes.len();
        let parent = parent.map(ElementIx::index).filter(|&p| p < ix);
        let sibling = match parent {
            Some(p) => {
                let children = &mut self.nodes[p].children;
                children.push(ix);
                children.len() - 1
            }
            None => 0,
        };
        self.nodes.push(TreeNode {
            desc,
            parent,
            children: Vec::new(),
            sibling,
            has_text: false,
        });
        ElementIx(ix)
    }

    /// Record that `ix` has non-empty text of its own, which defeats `:empty`.
    pub fn set_has_text(&mut self, ix: ElementIx, has_text: bool) {
        if let Some(node) = self.nodes.get_mut(ix.0) {
            node.has_text = has_text;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn descriptor(&self, ix: ElementIx) -> Option<&ElementDescriptor> {
        self.nodes.get(ix.0).map(|n| &n.desc)
    }

    pub fn element(&self, ix: ElementIx) -> Option<TreeElement<'_>> {
        (ix.0 < self.nodes.len()).then_some(TreeElement { tree: self, ix: ix.0 })
    }

    /// Most recently pushed element; the subject of a [`from_chain`] tree.
    ///
    /// [`from_chain`]: Self::from_chain
    pub fn last_element(&self) -> Option<TreeElement<'_>> {
        self.nodes
            .len()
            .checked_sub(1)
            .map(|ix| TreeElement { tree: self, ix })
    }
}

/// Borrowed handle to one element of an [`ElementTree`]; the type the
/// selector engine walks.
#[derive(Clone, Copy)]
pub struct TreeElement<'a> {
    tree: &'a ElementTree,
    ix: usize,
}

impl<'a> TreeElement<'a> {
    #[inline]
    fn node(&self) -> &'a TreeNode {
        &self.tree.nodes[self.ix]
    }

    #[inline]
    fn at(&self, ix: usize) -> Self {
        Self { tree: self.tree, ix }
    }

    pub fn ix(&self) -> ElementIx {
        ElementIx(self.ix)
    }

    pub fn descriptor(&self) -> &'a ElementDescriptor {
        &self.node().desc
    }

    pub fn parent(&self) -> Option<Self> {
        self.node().parent.map(|p| self.at(p))
    }

    fn sibling_at(&self, offset: isize) -> Option<Self> {
        let parent = self.node().parent?;
        let pos = self.node().sibling.checked_add_signed(offset)?;
        self.tree.nodes[parent]
            .children
            .get(pos)
            .map(|&ix| self.at(ix))
    }
}

impl fmt::Debug for TreeElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeElement({} {})", self.ix, self.descriptor().identifier())
    }
}

// ---------------------------------------------------------------------------
// Selector implementation
// ---------------------------------------------------------------------------

/// String type for identifiers, local names, and attribute values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CssString(pub String);

impl From<&str> for CssString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Borrow<str> for CssString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssString {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_str(&self.0)
    }
}

impl precomputed_hash::PrecomputedHash for CssString {
    fn precomputed_hash(&self) -> u32 {
        use std::hash::{Hash, Hasher};

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSelectorImpl;

impl SelectorImpl for SlideSelectorImpl {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssString;
    type Identifier = CssString;
    type LocalName = CssString;
    type NamespacePrefix = CssString;
    type NamespaceUrl = CssString;
    type BorrowedLocalName = str;
    type BorrowedNamespaceUrl = str;

    type NonTSPseudoClass = PseudoClass;
    type PseudoElement = PseudoElement;
}

/// Non-tree-structural pseudo-classes accepted in exclusion lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    Link,
    AnyLink,
    Visited,
    Hover,
    Active,
    Focus,
    Checked,
    Disabled,
}

impl selectors::parser::NonTSPseudoClass for PseudoClass {
    type Impl = SlideSelectorImpl;

    fn is_active_or_hover(&self) -> bool {
        matches!(self, Self::Active | Self::Hover)
    }

    fn is_user_action_state(&self) -> bool {
        matches!(self, Self::Active | Self::Hover | Self::Focus)
    }
}

impl ToCss for PseudoClass {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_str(match self {
            Self::Link => ":link",
            Self::AnyLink => ":any-link",
            Self::Visited => ":visited",
            Self::Hover => ":hover",
            Self::Active => ":active",
            Self::Focus => ":focus",
            Self::Checked => ":checked",
            Self::Disabled => ":disabled",
        })
    }
}

/// Pseudo-elements parse so that stylesheet-style selectors are accepted,
/// but they never match an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {
    Before,
    After,
    Marker,
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = SlideSelectorImpl;
}

impl ToCss for PseudoElement {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_str(match self {
            Self::Before => "::before",
            Self::After => "::after",
            Self::Marker => "::marker",
        })
    }
}

struct ExclusionParser;

impl<'i> selectors::parser::Parser<'i> for ExclusionParser {
    type Impl = SlideSelectorImpl;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<PseudoClass, ParseError<'i, Self::Error>> {
        let pseudo = match_ignore_ascii_case(&name, &[
            ("link", PseudoClass::Link),
            ("any-link", PseudoClass::AnyLink),
            ("visited", PseudoClass::Visited),
            ("hover", PseudoClass::Hover),
            ("active", PseudoClass::Active),
            ("focus", PseudoClass::Focus),
            ("checked", PseudoClass::Checked),
            ("disabled", PseudoClass::Disabled),
        ]);
        pseudo.ok_or_else(|| {
            location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name))
        })
    }

    fn parse_pseudo_element(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<PseudoElement, ParseError<'i, Self::Error>> {
        let pseudo = match_ignore_ascii_case(&name, &[
            ("before", PseudoElement::Before),
            ("after", PseudoElement::After),
            ("marker", PseudoElement::Marker),
        ]);
        pseudo.ok_or_else(|| {
            location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name))
        })
    }

    fn parse_is_and_where(&self) -> bool {
        true
    }
}

fn match_ignore_ascii_case<T: Clone>(name: &str, table: &[(&str, T)]) -> Option<T> {
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}

impl<'a> Element for TreeElement<'a> {
    type Impl = SlideSelectorImpl;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.node())
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent()
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling_at(-1)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling_at(1)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.node().children.first().map(|&ix| self.at(ix))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        self.descriptor().tag.eq_ignore_ascii_case(local_name)
    }

    fn has_namespace(&self, ns: &str) -> bool {
        ns.is_empty() || ns == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.descriptor().tag.eq_ignore_ascii_case(&other.descriptor().tag)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssString>,
        local_name: &CssString,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        if let NamespaceConstraint::Specific(url) = ns {
            let url: &str = (*url).borrow();
            if !(url.is_empty() || url == HTML_NAMESPACE) {
                return false;
            }
        }
        let Some(actual) = self.descriptor().attribute(&local_name.0) else {
            return false;
        };
        match operation {
            AttrSelectorOperation::Exists => true,
            AttrSelectorOperation::WithValue {
                operator,
                case_sensitivity,
                value,
            } => {
                let expected: &str = (**value).borrow();
                operator.eval_str(&actual, expected, *case_sensitivity)
            }
        }
    }

    fn match_non_ts_pseudo_class(
        &self,
        pseudo: &PseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match pseudo {
            PseudoClass::Link | PseudoClass::AnyLink => self.is_link(),
            PseudoClass::Visited | PseudoClass::Hover | PseudoClass::Active | PseudoClass::Focus => {
                false
            }
            PseudoClass::Checked => self.descriptor().attribute("checked").is_some(),
            PseudoClass::Disabled => self.descriptor().attribute("disabled").is_some(),
        }
    }

    fn match_pseudo_element(
        &self,
        _pseudo: &PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        false
    }

    fn is_link(&self) -> bool {
        let desc = self.descriptor();
        matches!(desc.tag.as_str(), "a" | "area" | "link") && desc.attribute("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.descriptor().tag == "slot"
    }

    fn has_id(&self, id: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.descriptor()
            .id
            .as_deref()
            .is_some_and(|actual| case_sensitivity.eq(actual.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, class: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.descriptor()
            .classes
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), class.0.as_bytes()))
    }

    fn imported_part(&self, _name: &CssString) -> Option<CssString> {
        None
    }

    fn is_part(&self, _name: &CssString) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        let node = self.node();
        node.children.is_empty() && !node.has_text
    }

    fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn has_custom_state(&self, _name: &CssString) -> bool {
        false
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Selector lists
// ---------------------------------------------------------------------------

/// Selector parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("invalid selector {selector:?} at column {column}: {reason}")]
    Invalid {
        selector: String,
        column: u32,
        reason: String,
    },
}

impl SelectorError {
    fn from_parse(selector: &str, err: &ParseError<'_, SelectorParseErrorKind<'_>>) -> Self {
        let reason = match &err.kind {
            ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
                format!("unexpected token {token:?}")
            }
            ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
                "unexpected end of input".to_owned()
            }
            ParseErrorKind::Basic(other) => format!("{other:?}"),
            ParseErrorKind::Custom(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(
                name,
            )) => format!("unsupported pseudo-class or pseudo-element {:?}", &**name),
            ParseErrorKind::Custom(other) => format!("{other:?}"),
        };
        Self::Invalid {
            selector: selector.to_owned(),
            column: err.location.column,
            reason,
        }
    }
}

/// Comma-separated selector list; matches if any member matches.
#[derive(Clone)]
pub struct SelectorList {
    source: String,
    inner: selectors::parser::SelectorList<SlideSelectorImpl>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parser_input = ParserInput::new(source);
        let mut parser = CssParser::new(&mut parser_input);
        let parsed = parser.parse_entirely(|p| {
            selectors::parser::SelectorList::parse(&ExclusionParser, p, ParseRelative::No)
        });
        match parsed {
            Ok(inner) => Ok(Self {
                source: source.to_owned(),
                inner,
            }),
            Err(err) => Err(SelectorError::from_parse(source, &err)),
        }
    }

    /// Source text as written, trimmed.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of complex selectors in the list.
    pub fn len(&self) -> usize {
        self.inner.slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slice().is_empty()
    }

    pub fn matches(&self, element: &TreeElement<'_>) -> bool {
        let mut caches = SelectorCaches::default();
        let mut context = matching_context(&mut caches);
        self.matches_in(element, &mut context)
    }

    /// Whether the element or any of its ancestors matches (the `closest`
    /// semantics used for exclusion).
    pub fn matches_self_or_ancestor(&self, element: &TreeElement<'_>) -> bool {
        let mut caches = SelectorCaches::default();
        let mut context = matching_context(&mut caches);
        let mut cursor = Some(*element);
        while let Some(current) = cursor {
            if self.matches_in(&current, &mut context) {
                return true;
            }
            cursor = current.parent();
        }
        false
    }

    fn matches_in(
        &self,
        element: &TreeElement<'_>,
        context: &mut MatchingContext<'_, SlideSelectorImpl>,
    ) -> bool {
        self.inner
            .slice()
            .iter()
            .any(|selector| matches_selector(selector, 0, None, element, context))
    }
}

fn matching_context(caches: &mut SelectorCaches) -> MatchingContext<'_, SlideSelectorImpl> {
    MatchingContext::new(
        MatchingMode::Normal,
        None,
        caches,
        QuirksMode::NoQuirks,
        NeedsSelectorFlags::No,
        MatchingForInvalidation::No,
    )
}

impl fmt::Debug for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SelectorList").field(&self.source).finish()
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for SelectorList {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for SelectorList {}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aside_notes() -> ElementDescriptor {
        ElementDescriptor::new("aside").with_class("notes")
    }

    fn matches_chain(selector: &str, chain: &[ElementDescriptor]) -> bool {
        let tree = ElementTree::from_chain(chain);
        let list = SelectorList::parse(selector).unwrap();
        tree.last_element().is_some_and(|el| list.matches(&el))
    }

    /// `<section><h2/><p class="lead"/><aside class="notes"/><p/></section>`
    fn slide_tree() -> (ElementTree, [ElementIx; 5]) {
        let mut tree = ElementTree::new();
        let section = tree.push(None, ElementDescriptor::new("section"));
        let h2 = tree.push(Some(section), ElementDescriptor::new("h2"));
        tree.set_has_text(h2, true);
        let lead = tree.push(Some(section), ElementDescriptor::new("p").with_class("lead"));
        let notes = tree.push(Some(section), aside_notes());
        let tail = tree.push(Some(section), ElementDescriptor::new("p"));
        (tree, [section, h2, lead, notes, tail])
    }

    fn matches_at(tree: &ElementTree, ix: ElementIx, selector: &str) -> bool {
        let list = SelectorList::parse(selector).unwrap();
        tree.element(ix).is_some_and(|el| list.matches(&el))
    }

    #[test]
    fn compound_tag_and_class() {
        assert!(matches_chain("aside.notes", &[aside_notes()]));
        assert!(!matches_chain("aside.notes", &[ElementDescriptor::new("aside")]));
        assert!(!matches_chain(
            "aside.notes",
            &[ElementDescriptor::new("div").with_class("notes")]
        ));
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        assert!(matches_chain("ASIDE", &[ElementDescriptor::new("aside")]));
    }

    #[test]
    fn id_and_attribute_operators() {
        let el = ElementDescriptor::new("div")
            .with_id("hero")
            .with_class("wide")
            .with_attribute("data-no-check", "")
            .with_attribute("data-kind", "wide card");
        let chain = [el];
        assert!(matches_chain("#hero", &chain));
        assert!(matches_chain("[data-no-check]", &chain));
        assert!(matches_chain("[data-kind=\"wide card\"]", &chain));
        assert!(matches_chain("[data-kind^=\"wi\"]", &chain));
        assert!(matches_chain("[data-kind~=card]", &chain));
        assert!(matches_chain("[data-kind=\"WIDE CARD\" i]", &chain));
        assert!(matches_chain("[class~=wide]", &chain));
        assert!(matches_chain("[id=hero]", &chain));
        assert!(!matches_chain("[data-kind=wide]", &chain));
    }

    #[test]
    fn descendant_and_child_combinators_walk_ancestors() {
        let chain = [
            ElementDescriptor::new("p"),
            ElementDescriptor::new("section"),
            ElementDescriptor::new("div").with_class("slides"),
            ElementDescriptor::new("div").with_class("reveal"),
        ];
        assert!(matches_chain(".reveal .slides p", &chain));
        assert!(matches_chain("section > p", &chain));
        assert!(!matches_chain(".slides > p", &chain));
        let wrong_order = [
            ElementDescriptor::new("p"),
            ElementDescriptor::new("div").with_class("reveal"),
            ElementDescriptor::new("div").with_class("slides"),
        ];
        assert!(!matches_chain(".reveal .slides p", &wrong_order));
    }

    #[test]
    fn sibling_combinators_use_document_order() {
        let (tree, [_, h2, lead, notes, tail]) = slide_tree();
        assert!(matches_at(&tree, tail, ".notes ~ p"));
        assert!(matches_at(&tree, tail, ".notes + p"));
        assert!(!matches_at(&tree, lead, ".notes ~ p"));
        assert!(matches_at(&tree, lead, "h2 + p"));
        assert!(!matches_at(&tree, notes, "h2 + aside"));
        assert!(matches_at(&tree, h2, "h2:first-child"));
        assert!(matches_at(&tree, tail, "p:last-child"));
        assert!(matches_at(&tree, lead, "p:nth-child(2)"));
        assert!(matches_at(&tree, tail, "p:nth-of-type(2)"));
    }

    #[test]
    fn negation_and_functional_pseudo_classes() {
        let keep = ElementDescriptor::new("aside").with_class("keep");
        assert!(matches_chain("aside:not(.keep)", &[aside_notes()]));
        assert!(!matches_chain("aside:not(.keep)", &[keep.clone()]));
        assert!(matches_chain(":is(aside, figure).keep", &[keep.clone()]));
        assert!(matches_chain(":where(.keep)", &[keep]));
    }

    #[test]
    fn empty_respects_text_and_children() {
        let (tree, [section, h2, lead, ..]) = slide_tree();
        assert!(matches_at(&tree, lead, "p:empty"));
        assert!(!matches_at(&tree, h2, "h2:empty"));
        assert!(!matches_at(&tree, section, ":empty"));
        assert!(matches_at(&tree, section, ":root"));
    }

    #[test]
    fn dynamic_states_never_match() {
        let link = [ElementDescriptor::new("a").with_attribute("href", "#next")];
        assert!(matches_chain("a:link", &link));
        assert!(matches_chain(":any-link", &link));
        assert!(!matches_chain("a:hover", &link));
        assert!(!matches_chain("a:visited", &link));
        assert!(!matches_chain("p::before", &[ElementDescriptor::new("p")]));
    }

    #[test]
    fn closest_semantics_cover_descendants_of_excluded() {
        let tree = ElementTree::from_chain(&[
            ElementDescriptor::new("span"),
            ElementDescriptor::new("p"),
            aside_notes(),
        ]);
        let list = SelectorList::parse("aside").unwrap();
        let Some(span) = tree.last_element() else {
            panic!("empty tree");
        };
        assert!(!list.matches(&span));
        assert!(list.matches_self_or_ancestor(&span));
    }

    #[test]
    fn selector_list_any_member() {
        let list = SelectorList::parse(" h1, h2 ,h3 ").unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.to_string(), "h1, h2 ,h3");
        assert!(matches_chain("h1, h2 ,h3", &[ElementDescriptor::new("h2")]));
        assert!(!matches_chain("h1, h2, h3", &[ElementDescriptor::new("h4")]));
    }

    #[test]
    fn rejects_malformed_selectors() {
        assert_eq!(SelectorList::parse(""), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("   "), Err(SelectorError::Empty));
        for bad in ["[data-x", "a,,b", "ul >", "a:no-such-state", "div::nope", "#"] {
            assert!(
                matches!(SelectorList::parse(bad), Err(SelectorError::Invalid { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_reports_selector_and_column() {
        let Err(SelectorError::Invalid { selector, column, .. }) = SelectorList::parse("p:wobble")
        else {
            panic!("expected invalid selector");
        };
        assert_eq!(selector, "p:wobble");
        assert!(column >= 2, "column {column}");
    }

    #[test]
    fn universal_matches_everything() {
        assert!(matches_chain("*", &[ElementDescriptor::new("svg")]));
    }

    #[test]
    fn identifier_format() {
        let el = ElementDescriptor::new("DIV")
            .with_id("hero")
            .with_class("wide")
            .with_class("card");
        assert_eq!(el.identifier(), "<div#hero.wide.card>");
        assert_eq!(ElementDescriptor::new("p").identifier(), "<p>");
    }

    #[test]
    fn push_with_unknown_parent_makes_root() {
        let mut tree = ElementTree::new();
        let ix = tree.push(Some(ElementIx(7)), ElementDescriptor::new("div"));
        assert!(tree.element(ix).is_some_and(|el| el.parent().is_none()));
        assert!(tree.element(ElementIx(1)).is_none());
    }
}
