//! CSS selector matching over [`Dom`] elements.
//!
//! Lets classification rules written as CSS selectors match nodes of a
//! parsed fragment.

use std::fmt;

use html5ever::{LocalName, Namespace};
use precomputed_hash::PrecomputedHash;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::context::MatchingContext;
use selectors::matching::ElementSelectorFlags;
use selectors::parser::SelectorParseErrorKind;
use selectors::{OpaqueElement, SelectorImpl};

use super::arena::{Dom, Node, NodeData, NodeId};

/// Selector vocabulary for rules matched against fragment elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestyleSelectors;

/// Newtypes the selector parser stores names and values in.
macro_rules! selector_atom {
    ($(#[$meta:meta])* $name:ident($inner:ty), $hash:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
        pub struct $name($inner);

        impl PrecomputedHash for $name {
            fn precomputed_hash(&self) -> u32 {
                let hash: fn(&$inner) -> u32 = $hash;
                hash(&self.0)
            }
        }

        impl cssparser::ToCss for $name {
            fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
                dest.write_str(self.as_ref())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(<$inner>::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(<$inner>::from(s))
            }
        }
    };
}

selector_atom!(
    /// Class names, ids, prefixes and attribute values.
    SelectorText(String),
    |s| s.bytes().fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)))
);
selector_atom!(
    /// Tag and attribute names.
    SelectorName(LocalName),
    |name| name.precomputed_hash()
);
selector_atom!(SelectorNs(Namespace), |ns| ns.precomputed_hash());

impl<'i> selectors::parser::Parser<'i> for DestyleSelectors {
    type Impl = DestyleSelectors;
    type Error = SelectorParseErrorKind<'i>;
}

/// No pseudo-elements exist inside a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoPseudoElement {}

impl cssparser::ToCss for NoPseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for NoPseudoElement {
    type Impl = DestyleSelectors;
}

/// Dynamic state (`:hover`, `:checked`) never applies to detached markup,
/// so the parser rejects every non-tree-structural pseudo-class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoStatePseudoClass {}

impl cssparser::ToCss for NoStatePseudoClass {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::NonTSPseudoClass for NoStatePseudoClass {
    type Impl = DestyleSelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl SelectorImpl for DestyleSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = SelectorText;
    type Identifier = SelectorText;
    type LocalName = SelectorName;
    type NamespaceUrl = SelectorNs;
    type NamespacePrefix = SelectorText;
    type BorrowedLocalName = SelectorName;
    type BorrowedNamespaceUrl = SelectorNs;
    type NonTSPseudoClass = NoStatePseudoClass;
    type PseudoElement = NoPseudoElement;
}

/// An element of a [`Dom`] as seen by the selector matcher.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    dom: &'a Dom,
    id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn new(dom: &'a Dom, id: NodeId) -> Self {
        Self { dom, id }
    }

    fn at(&self, id: NodeId) -> Option<Self> {
        self.dom.is_element(id).then(|| Self::new(self.dom, id))
    }

    /// First element among the siblings reached by repeatedly applying `step`.
    fn sibling(&self, step: fn(&Node) -> NodeId) -> Option<Self> {
        let dom = self.dom;
        std::iter::successors(dom.get(self.id).map(step), |&n| dom.get(n).map(step))
            .take_while(|n| n.is_some())
            .find_map(|n| self.at(n))
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.dom.element_name(self.id).map(|n| &**n);
        write!(f, "<{}> {:?}", tag.unwrap_or("?"), self.id)
    }
}

impl selectors::Element for ElementRef<'_> {
    type Impl = DestyleSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self)
    }

    fn parent_element(&self) -> Option<Self> {
        self.dom.parent(self.id).and_then(|p| self.at(p))
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
        self.sibling(|n| n.prev_sibling)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling(|n| n.next_sibling)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.dom.children(self.id).find_map(|c| self.at(c))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &SelectorName) -> bool {
        self.dom.element_name(self.id) == Some(&name.0)
    }

    fn has_namespace(&self, ns: &SelectorNs) -> bool {
        self.dom.element_namespace(self.id) == Some(&ns.0)
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.dom.element_name(self.id) == other.dom.element_name(other.id)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&SelectorNs>,
        local_name: &SelectorName,
        operation: &AttrSelectorOperation<&SelectorText>,
    ) -> bool {
        self.dom
            .attrs(self.id)
            .iter()
            .find(|attr| {
                attr.name.local == local_name.0
                    && match ns {
                        NamespaceConstraint::Any => true,
                        NamespaceConstraint::Specific(ns) => attr.name.ns == ns.0,
                    }
            })
            .is_some_and(|attr| operation.eval_str(&attr.value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NoStatePseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        pe: &NoPseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match *pe {}
    }

    fn is_link(&self) -> bool {
        self.dom.element_name(self.id).is_some_and(|n| &**n == "a")
            && self.dom.get_attr(self.id, "href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &SelectorText, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .element_id(self.id)
            .is_some_and(|own| case_sensitivity.eq(own.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &SelectorText, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .element_classes(self.id)
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &SelectorText) -> Option<SelectorText> {
        None
    }

    fn is_part(&self, _name: &SelectorText) -> bool {
        false
    }

    /// Whitespace-only text does not count as content.
    fn is_empty(&self) -> bool {
        self.dom.children(self.id).all(|c| match self.dom.get(c).map(|n| &n.data) {
            Some(NodeData::Element { .. }) => false,
            Some(NodeData::Text(t)) => t.trim().is_empty(),
            _ => true,
        })
    }

    // Fragments are rooted at their body element.
    fn is_root(&self) -> bool {
        self.id == self.dom.root()
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &SelectorText) -> bool {
        false
    }
}
