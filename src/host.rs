//! Host-tree capability traits.
//!
//! Formatting removal never talks to a concrete document. It reads through
//! [`MarkupTree`], edits through [`HostTree`] and reads or restores the
//! selection through [`HostSelection`]. Any quirks of a particular host
//! belong in its implementation of these traits.

use std::fmt::Debug;

use crate::error::Result;
use crate::range::SelectionRange;
use crate::util::char_len;

/// Read access to a tree of markup nodes.
pub trait MarkupTree {
    /// Cheap handle to a node of this tree.
    type Node: Copy + Eq + Debug;

    /// The topmost node that selections may reach.
    fn root(&self) -> Self::Node;

    /// Parent of `node`, or `None` for the root and detached nodes.
    fn parent_of(&self, node: Self::Node) -> Option<Self::Node>;

    /// Children of `node` in document order.
    fn children_of(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Lowercase tag name of an element, `None` for any other node.
    fn tag_of(&self, node: Self::Node) -> Option<&str>;

    /// Attributes of an element in source order. Empty for other nodes.
    fn attributes_of(&self, node: Self::Node) -> Vec<(&str, &str)>;

    /// Content of a text node, `None` for any other node.
    fn text_of(&self, node: Self::Node) -> Option<&str>;

    fn child_count(&self, node: Self::Node) -> usize {
        self.children_of(node).len()
    }

    fn child_at(&self, node: Self::Node, index: usize) -> Option<Self::Node> {
        self.children_of(node).get(index).copied()
    }

    /// Position of `node` among its siblings. Zero for the root.
    fn index_of(&self, node: Self::Node) -> usize {
        self.parent_of(node)
            .and_then(|parent| self.children_of(parent).iter().position(|&c| c == node))
            .unwrap_or(0)
    }

    /// Largest valid boundary offset inside `node`: characters for text,
    /// children for everything else.
    fn node_len(&self, node: Self::Node) -> usize {
        match self.text_of(node) {
            Some(text) => char_len(text),
            None => self.child_count(node),
        }
    }

    fn is_text(&self, node: Self::Node) -> bool {
        self.text_of(node).is_some()
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent_of(n);
        }
        false
    }
}

/// A markup tree that accepts edits.
pub trait HostTree: MarkupTree {
    /// Replace the contents of `range` with parsed `markup`.
    ///
    /// Follows DOM range deletion: elements partially inside `range` keep
    /// the part outside it, and the new nodes go at the start point when it
    /// holds the end, otherwise right after the start's outermost partially
    /// selected ancestor. Partially selected elements left empty may be
    /// removed.
    ///
    /// Returns the range now spanning the inserted nodes. Nodes outside
    /// `range` keep their identity, so boundary points before the range stay
    /// valid.
    fn replace_range(
        &mut self,
        range: &SelectionRange<Self::Node>,
        markup: &str,
    ) -> Result<SelectionRange<Self::Node>>;
}

/// A host that also owns a selection.
pub trait HostSelection: HostTree {
    /// The ranges currently selected. Several ranges arise when separate
    /// table cells are selected.
    fn current_ranges(&self) -> Vec<SelectionRange<Self::Node>>;

    /// Replace the selection with a single range.
    fn set_selection(&mut self, range: SelectionRange<Self::Node>);
}
