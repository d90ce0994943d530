//! An in-memory host document.
//!
//! [`Dom`] implements the host-tree traits directly; [`Document`] adds a
//! selection and helpers for placing it by character offset.
//!
//! ```
//! use destyle::{Document, RemoveFormatting};
//!
//! let mut doc = Document::parse("<p>Some <b>bold</b> text</p>");
//! doc.select_text(5, 9).unwrap();
//! RemoveFormatting::new().apply(&mut doc).unwrap();
//! assert_eq!(doc.to_html(), "<p>Some bold text</p>");
//! ```

use std::cmp::Ordering;

use crate::classify::is_block;
use crate::dom::{
    Dom, NodeData, NodeId, inner_html, is_void, parse_bytes, parse_document, parse_fragment,
};
use crate::error::{Error, Result};
use crate::host::{HostSelection, HostTree, MarkupTree};
use crate::range::{
    BoundaryPoint, SelectionRange, child_containing, common_ancestor, compare_points,
};
use crate::util::char_len;

impl MarkupTree for Dom {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        Dom::root(self)
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node)
    }

    fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node).collect()
    }

    fn tag_of(&self, node: NodeId) -> Option<&str> {
        self.element_name(node).map(|name| name.as_ref())
    }

    fn attributes_of(&self, node: NodeId) -> Vec<(&str, &str)> {
        self.attrs(node)
            .iter()
            .map(|a| (a.name.local.as_ref(), a.value.as_str()))
            .collect()
    }

    fn text_of(&self, node: NodeId) -> Option<&str> {
        self.text_content(node)
    }

    fn child_count(&self, node: NodeId) -> usize {
        Dom::child_count(self, node)
    }

    fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        Dom::child_at(self, node, index)
    }

    fn index_of(&self, node: NodeId) -> usize {
        Dom::index_of(self, node)
    }
}

impl HostTree for Dom {
    fn replace_range(
        &mut self,
        range: &SelectionRange<NodeId>,
        markup: &str,
    ) -> Result<SelectionRange<NodeId>> {
        for point in [range.start, range.end] {
            let len = self.node_len(point.node);
            if point.offset > len {
                return Err(Error::OffsetOutOfRange {
                    offset: point.offset,
                    len,
                });
            }
        }
        if compare_points(self, range.start, range.end) == Ordering::Greater {
            return Err(Error::Host("range start is after its end".into()));
        }

        let point = self.delete_contents(range);
        let (parent, index) = self.insertion_slot(point)?;

        let fragment = parse_fragment(markup);
        let mut inserted = 0;
        for child in fragment.children(fragment.root()) {
            if let Some(copy) = self.import_detached(&fragment, child) {
                self.insert_at(parent, index + inserted, copy);
                inserted += 1;
            }
        }

        Ok(SelectionRange::new(
            BoundaryPoint::new(parent, index),
            BoundaryPoint::new(parent, index + inserted),
        ))
    }
}

/// Where content goes once a range's contents are gone.
enum InsertionPoint {
    /// Right after `node`, or at `index` of `parent` if `node` was pruned.
    After {
        node: NodeId,
        parent: NodeId,
        index: usize,
    },
    At(BoundaryPoint<NodeId>),
}

impl Dom {
    /// Remove the contents of `range` the way DOM ranges do: nodes wholly
    /// inside are removed, partially selected elements keep what lies outside
    /// the range. Partially selected elements left without content are
    /// pruned.
    fn delete_contents(&mut self, range: &SelectionRange<NodeId>) -> InsertionPoint {
        let (start, end) = (range.start, range.end);
        if range.is_collapsed() {
            return InsertionPoint::At(start);
        }

        // New content goes at the start point when it contains the end,
        // otherwise right after the start's outermost partial ancestor.
        let point = if self.is_inclusive_ancestor(start.node, end.node) {
            InsertionPoint::At(start)
        } else {
            let mut reference = start.node;
            while let Some(parent) = self.parent(reference) {
                if self.is_inclusive_ancestor(parent, end.node) {
                    break;
                }
                reference = parent;
            }
            InsertionPoint::After {
                node: reference,
                parent: self.parent(reference).unwrap_or(NodeId::NONE),
                index: self.index_of(reference) + 1,
            }
        };

        if let Some(container) = common_ancestor(self, start.node, end.node) {
            self.delete_partial(container, Some(start), Some(end));
        }
        point
    }

    fn delete_partial(
        &mut self,
        container: NodeId,
        start: Option<BoundaryPoint<NodeId>>,
        end: Option<BoundaryPoint<NodeId>>,
    ) {
        if self.is_text(container) {
            let from = start.map_or(0, |p| p.offset);
            let to = end.map_or(usize::MAX, |p| p.offset);
            self.remove_text(container, from, to);
            return;
        }

        let children: Vec<NodeId> = self.children(container).collect();
        let (first, partial_first) = match start {
            Some(p) if p.node == container => (p.offset, None),
            Some(p) => match child_containing(self, container, p.node) {
                Some(child) => (self.index_of(child), Some(child)),
                None => (0, None),
            },
            None => (0, None),
        };
        let (last, partial_last) = match end {
            Some(p) if p.node == container => (p.offset, None),
            Some(p) => match child_containing(self, container, p.node) {
                Some(child) => (self.index_of(child) + 1, Some(child)),
                None => (children.len(), None),
            },
            None => (children.len(), None),
        };

        for &child in children.iter().take(last).skip(first) {
            let is_first = partial_first == Some(child);
            let is_last = partial_last == Some(child);
            if !is_first && !is_last {
                self.detach(child);
                continue;
            }
            let inner_start = if is_first { start } else { None };
            let inner_end = if is_last { end } else { None };
            self.delete_partial(child, inner_start, inner_end);
            if self.is_element(child) && self.is_emptied(child) {
                self.detach(child);
            }
        }
    }

    /// Remove descendant elements of `id` left without content.
    pub(crate) fn prune_empty(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).collect();
        for child in children {
            if !self.is_element(child) {
                continue;
            }
            if self.is_emptied(child) {
                self.detach(child);
            } else {
                self.prune_empty(child);
            }
        }
    }

    /// An element holding no text at all and no void element.
    fn is_emptied(&self, id: NodeId) -> bool {
        if self.element_name(id).is_some_and(|name| is_void(name.as_ref())) {
            return false;
        }
        self.descendants(id)
            .skip(1)
            .all(|n| match self.get(n).map(|node| &node.data) {
                Some(NodeData::Text(text)) => text.is_empty(),
                Some(NodeData::Element { name, .. }) => !is_void(name.local.as_ref()),
                _ => true,
            })
    }

    /// Resolve an insertion point to a parent and child index, splitting a
    /// text node when the point falls inside one.
    fn insertion_slot(&mut self, point: InsertionPoint) -> Result<(NodeId, usize)> {
        match point {
            InsertionPoint::After {
                node,
                parent,
                index,
            } => match self.parent(node) {
                Some(p) => Ok((p, self.index_of(node) + 1)),
                None if parent.is_some() => Ok((parent, index - 1)),
                None => Err(Error::Host("insertion point was removed".into())),
            },
            InsertionPoint::At(point) => {
                if !self.is_text(point.node) {
                    return Ok((point.node, point.offset));
                }
                let parent = self
                    .parent(point.node)
                    .ok_or_else(|| Error::Host("text node has no parent".into()))?;
                let index = self.index_of(point.node);
                if point.offset == 0 {
                    Ok((parent, index))
                } else if point.offset >= self.node_len(point.node) {
                    Ok((parent, index + 1))
                } else {
                    self.split_text(point.node, point.offset);
                    Ok((parent, index + 1))
                }
            }
        }
    }
}

/// A parsed document with a selection.
pub struct Document {
    dom: Dom,
    ranges: Vec<SelectionRange<NodeId>>,
}

impl Document {
    /// Parse a fragment or a complete document. Editing happens inside the
    /// body.
    pub fn parse(html: &str) -> Self {
        Self::from_dom(parse_document(html))
    }

    /// Parse HTML bytes in any supported encoding.
    pub fn parse_bytes(bytes: &[u8]) -> Self {
        Self::from_dom(parse_bytes(bytes))
    }

    pub fn from_dom(dom: Dom) -> Self {
        Self {
            dom,
            ranges: Vec::new(),
        }
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Serialize the body's contents.
    pub fn to_html(&self) -> String {
        inner_html(&self.dom, self.dom.root())
    }

    /// All text of the document, the space [`select_text`](Self::select_text)
    /// offsets count in.
    pub fn text(&self) -> String {
        self.dom.text_of_subtree(self.dom.root())
    }

    /// The current selection ranges.
    pub fn selection(&self) -> &[SelectionRange<NodeId>] {
        &self.ranges
    }

    /// Replace the selection with one range.
    pub fn select(&mut self, range: SelectionRange<NodeId>) {
        self.ranges = vec![range];
    }

    /// Add a range to the selection, as a multi-cell selection does.
    pub fn add_range(&mut self, range: SelectionRange<NodeId>) {
        self.ranges.push(range);
    }

    pub fn clear_selection(&mut self) {
        self.ranges.clear();
    }

    /// Build a range from character offsets into [`text`](Self::text).
    ///
    /// The start lands at the beginning of the following text node when it
    /// falls between two; the end lands at the end of the preceding one.
    pub fn range_for_text(&self, start: usize, end: usize) -> Result<SelectionRange<NodeId>> {
        let len = char_len(&self.text());
        for offset in [start, end] {
            if offset > len {
                return Err(Error::OffsetOutOfRange { offset, len });
            }
        }
        let (start, end) = (start.min(end), start.max(end));
        let start_point = self.point_for_offset(start, true);
        if start == end {
            return Ok(SelectionRange::collapsed(start_point));
        }
        Ok(SelectionRange::new(
            start_point,
            self.point_for_offset(end, false),
        ))
    }

    /// Select the characters `[start, end)` of [`text`](Self::text).
    pub fn select_text(&mut self, start: usize, end: usize) -> Result<()> {
        let range = self.range_for_text(start, end)?;
        self.select(range);
        Ok(())
    }

    /// Range covering the first occurrence of `needle` in the text.
    pub fn find_text(&self, needle: &str) -> Option<SelectionRange<NodeId>> {
        let text = self.text();
        let byte = text.find(needle)?;
        let start = char_len(&text[..byte]);
        self.range_for_text(start, start + char_len(needle)).ok()
    }

    fn point_for_offset(&self, offset: usize, forward: bool) -> BoundaryPoint<NodeId> {
        let root = self.dom.root();
        let mut seen = 0;
        let mut last = None;
        for id in self.dom.descendants(root) {
            let Some(text) = self.dom.text_content(id) else {
                continue;
            };
            let len = char_len(text);
            let inside = if forward {
                offset < seen + len
            } else {
                offset <= seen + len && len > 0
            };
            if inside {
                return BoundaryPoint::new(id, offset - seen);
            }
            seen += len;
            last = Some((id, len));
        }
        match last {
            Some((id, len)) => BoundaryPoint::new(id, len),
            None => BoundaryPoint::new(root, 0),
        }
    }
}

impl MarkupTree for Document {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.dom.root()
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.dom.parent(node)
    }

    fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.dom.children_of(node)
    }

    fn tag_of(&self, node: NodeId) -> Option<&str> {
        self.dom.tag_of(node)
    }

    fn attributes_of(&self, node: NodeId) -> Vec<(&str, &str)> {
        self.dom.attributes_of(node)
    }

    fn text_of(&self, node: NodeId) -> Option<&str> {
        self.dom.text_content(node)
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.dom.child_count(node)
    }

    fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.dom.child_at(node, index)
    }

    fn index_of(&self, node: NodeId) -> usize {
        self.dom.index_of(node)
    }
}

impl HostTree for Document {
    fn replace_range(
        &mut self,
        range: &SelectionRange<NodeId>,
        markup: &str,
    ) -> Result<SelectionRange<NodeId>> {
        self.dom.replace_range(range, markup)
    }
}

impl HostSelection for Document {
    fn current_ranges(&self) -> Vec<SelectionRange<NodeId>> {
        self.ranges.clone()
    }

    fn set_selection(&mut self, range: SelectionRange<NodeId>) {
        self.select(range);
    }
}

/// Whether a line of inline content continues right after `point`, without
/// leaving `scope`.
pub(crate) fn next_is_inline<T: MarkupTree>(
    tree: &T,
    point: BoundaryPoint<T::Node>,
    scope: T::Node,
) -> bool {
    let mut point = point;
    loop {
        if let Some(text) = tree.text_of(point.node) {
            let rest: String = text.chars().skip(point.offset).collect();
            if !crate::util::is_whitespace_only(&rest) {
                return true;
            }
            match BoundaryPoint::after(tree, point.node) {
                Some(next) => point = next,
                None => return false,
            }
            continue;
        }
        match tree.child_at(point.node, point.offset) {
            Some(child) => {
                if let Some(text) = tree.text_of(child) {
                    if !crate::util::is_whitespace_only(text) {
                        return true;
                    }
                    point.offset += 1;
                    continue;
                }
                return match tree.tag_of(child) {
                    Some(tag) => !(tag == "br" || is_line_boundary(tag)),
                    None => {
                        point.offset += 1;
                        continue;
                    }
                };
            }
            None => {
                if point.node == scope
                    || tree.tag_of(point.node).is_some_and(is_line_boundary)
                {
                    return false;
                }
                match BoundaryPoint::after(tree, point.node) {
                    Some(next) => point = next,
                    None => return false,
                }
            }
        }
    }
}

/// Elements that start or end a line of their own.
fn is_line_boundary(tag: &str) -> bool {
    is_block(tag) || crate::classify::is_table_scaffolding(tag)
}
