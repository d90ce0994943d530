//! Boundary points, selection ranges and document-order comparison.

use std::cmp::Ordering;

use crate::dom::{Attribute, Dom, NodeId, html_name};
use crate::host::MarkupTree;
use crate::util::byte_offset;

/// A position in a markup tree.
///
/// `offset` counts characters inside a text node and children inside any
/// other node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint<N> {
    pub node: N,
    pub offset: usize,
}

impl<N: Copy + Eq> BoundaryPoint<N> {
    pub fn new(node: N, offset: usize) -> Self {
        Self { node, offset }
    }

    /// The point just before `node` in its parent.
    pub fn before<T: MarkupTree<Node = N>>(tree: &T, node: N) -> Option<Self> {
        let parent = tree.parent_of(node)?;
        Some(Self::new(parent, tree.index_of(node)))
    }

    /// The point just after `node` in its parent.
    pub fn after<T: MarkupTree<Node = N>>(tree: &T, node: N) -> Option<Self> {
        let parent = tree.parent_of(node)?;
        Some(Self::new(parent, tree.index_of(node) + 1))
    }

    /// The point before the first child or character of `node`.
    pub fn start_of(node: N) -> Self {
        Self::new(node, 0)
    }

    /// The point after the last child or character of `node`.
    pub fn end_of<T: MarkupTree<Node = N>>(tree: &T, node: N) -> Self {
        Self::new(node, tree.node_len(node))
    }
}

/// A pair of boundary points, start at or before end in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange<N> {
    pub start: BoundaryPoint<N>,
    pub end: BoundaryPoint<N>,
}

impl<N: Copy + Eq> SelectionRange<N> {
    /// Build a range from points already in document order.
    pub fn new(start: BoundaryPoint<N>, end: BoundaryPoint<N>) -> Self {
        Self { start, end }
    }

    /// Build a range from two points given in either order.
    ///
    /// # Panics
    ///
    /// Panics if the points belong to unconnected trees.
    pub fn ordered<T: MarkupTree<Node = N>>(
        tree: &T,
        a: BoundaryPoint<N>,
        b: BoundaryPoint<N>,
    ) -> Self {
        if compare_points(tree, a, b) == Ordering::Greater {
            Self::new(b, a)
        } else {
            Self::new(a, b)
        }
    }

    /// An empty range at `point`.
    pub fn collapsed(point: BoundaryPoint<N>) -> Self {
        Self::new(point, point)
    }

    /// A range spanning the whole contents of `node`.
    pub fn contents_of<T: MarkupTree<Node = N>>(tree: &T, node: N) -> Self {
        Self::new(BoundaryPoint::start_of(node), BoundaryPoint::end_of(tree, node))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Path of nodes from the root of `node`'s tree down to `node`.
fn path_from_root<T: MarkupTree>(tree: &T, node: T::Node) -> Vec<T::Node> {
    let mut path = vec![node];
    let mut current = node;
    while let Some(parent) = tree.parent_of(current) {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

/// Compare two boundary points in document order.
///
/// # Panics
///
/// Panics if the points belong to unconnected trees. Callers must only mix
/// points of one document.
pub fn compare_points<T: MarkupTree>(
    tree: &T,
    a: BoundaryPoint<T::Node>,
    b: BoundaryPoint<T::Node>,
) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }

    let path_a = path_from_root(tree, a.node);
    let path_b = path_from_root(tree, b.node);
    assert!(
        path_a[0] == path_b[0],
        "boundary points {:?} and {:?} are in unconnected trees",
        a.node,
        b.node
    );

    let shared = path_a
        .iter()
        .zip(&path_b)
        .take_while(|(x, y)| x == y)
        .count();

    if shared == path_a.len() {
        // a.node is an ancestor of b.node
        let child = path_b[shared];
        if tree.index_of(child) < a.offset {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    } else if shared == path_b.len() {
        let child = path_a[shared];
        if tree.index_of(child) < b.offset {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    } else {
        tree.index_of(path_a[shared])
            .cmp(&tree.index_of(path_b[shared]))
    }
}

/// The earlier of two points.
pub fn min_point<T: MarkupTree>(
    tree: &T,
    a: BoundaryPoint<T::Node>,
    b: BoundaryPoint<T::Node>,
) -> BoundaryPoint<T::Node> {
    if compare_points(tree, b, a) == Ordering::Less {
        b
    } else {
        a
    }
}

/// The later of two points.
pub fn max_point<T: MarkupTree>(
    tree: &T,
    a: BoundaryPoint<T::Node>,
    b: BoundaryPoint<T::Node>,
) -> BoundaryPoint<T::Node> {
    if compare_points(tree, b, a) == Ordering::Greater {
        b
    } else {
        a
    }
}

/// The minimal range covering both `a` and `b`.
///
/// Ranges may overlap, touch or be disjoint; anything between disjoint
/// ranges is included.
///
/// # Panics
///
/// Panics if the ranges belong to unconnected trees.
pub fn delimit<T: MarkupTree>(
    tree: &T,
    a: &SelectionRange<T::Node>,
    b: &SelectionRange<T::Node>,
) -> SelectionRange<T::Node> {
    SelectionRange::new(
        min_point(tree, a.start, b.start),
        max_point(tree, a.end, b.end),
    )
}

/// Deepest node that is an inclusive ancestor of both `a` and `b`.
pub fn common_ancestor<T: MarkupTree>(tree: &T, a: T::Node, b: T::Node) -> Option<T::Node> {
    let path_a = path_from_root(tree, a);
    let path_b = path_from_root(tree, b);
    path_a
        .iter()
        .zip(&path_b)
        .take_while(|(x, y)| x == y)
        .last()
        .map(|(x, _)| *x)
}

/// The child of `ancestor` that contains `node`, if `node` is a proper
/// descendant of `ancestor`.
pub fn child_containing<T: MarkupTree>(
    tree: &T,
    ancestor: T::Node,
    node: T::Node,
) -> Option<T::Node> {
    let mut current = node;
    loop {
        let parent = tree.parent_of(current)?;
        if parent == ancestor {
            return Some(current);
        }
        current = parent;
    }
}

/// Copy the contents of `range` into a new detached [`Dom`].
///
/// Nodes wholly inside the range are copied deeply. Elements that are only
/// partially inside are copied shallowly, holding the part of their content
/// that is inside. Text nodes at the boundaries are sliced. Comments and
/// other non-element, non-text nodes are left out.
pub fn clone_contents<T: MarkupTree>(tree: &T, range: &SelectionRange<T::Node>) -> Dom {
    let mut dom = Dom::new();
    let root = dom.root();
    if range.is_collapsed() {
        return dom;
    }
    let Some(container) = common_ancestor(tree, range.start.node, range.end.node) else {
        return dom;
    };
    clone_partial(
        tree,
        container,
        Some(range.start),
        Some(range.end),
        &mut dom,
        root,
    );
    dom
}

/// Copy the part of `container`'s contents between the optional bounds
/// under `parent`. A missing bound means the start or end of the container.
fn clone_partial<T: MarkupTree>(
    tree: &T,
    container: T::Node,
    start: Option<BoundaryPoint<T::Node>>,
    end: Option<BoundaryPoint<T::Node>>,
    dom: &mut Dom,
    parent: NodeId,
) {
    if let Some(text) = tree.text_of(container) {
        let from = start.map_or(0, |p| p.offset);
        let to = end.map_or(usize::MAX, |p| p.offset);
        let sliced = &text[byte_offset(text, from)..byte_offset(text, to)];
        if !sliced.is_empty() {
            dom.append_text(parent, sliced);
        }
        return;
    }

    let children = tree.children_of(container);
    let (first, partial_first) = start_child(tree, container, start);
    let (last, partial_last) = match end {
        Some(point) if point.node == container => (point.offset, None),
        Some(point) => match child_containing(tree, container, point.node) {
            Some(child) => (tree.index_of(child) + 1, Some(child)),
            None => (children.len(), None),
        },
        None => (children.len(), None),
    };

    for &child in children.iter().take(last).skip(first) {
        let is_first = partial_first == Some(child);
        let is_last = partial_last == Some(child);
        if !is_first && !is_last {
            import_node(tree, child, dom, parent);
            continue;
        }
        let inner_start = if is_first { start } else { None };
        let inner_end = if is_last { end } else { None };
        if tree.is_text(child) {
            clone_partial(tree, child, inner_start, inner_end, dom, parent);
        } else if let Some(copy) = shallow_copy(tree, child, dom, parent) {
            clone_partial(tree, child, inner_start, inner_end, dom, copy);
        }
    }
}

/// Index of the first child at or after a start bound, plus the child that
/// the bound cuts through, if any.
fn start_child<T: MarkupTree>(
    tree: &T,
    container: T::Node,
    start: Option<BoundaryPoint<T::Node>>,
) -> (usize, Option<T::Node>) {
    match start {
        Some(point) if point.node == container => (point.offset, None),
        Some(point) => match child_containing(tree, container, point.node) {
            Some(child) => (tree.index_of(child), Some(child)),
            None => (0, None),
        },
        None => (0, None),
    }
}

fn shallow_copy<T: MarkupTree>(
    tree: &T,
    node: T::Node,
    dom: &mut Dom,
    parent: NodeId,
) -> Option<NodeId> {
    let tag = tree.tag_of(node)?;
    let attrs = tree
        .attributes_of(node)
        .into_iter()
        .map(|(name, value)| Attribute::new(name, value))
        .collect();
    let copy = dom.create_element(html_name(tag), attrs);
    dom.append(parent, copy);
    Some(copy)
}

/// Deep-copy `node` of any markup tree under `parent`.
pub fn import_node<T: MarkupTree>(tree: &T, node: T::Node, dom: &mut Dom, parent: NodeId) {
    if let Some(text) = tree.text_of(node) {
        dom.append_text(parent, text);
        return;
    }
    if let Some(copy) = shallow_copy(tree, node, dom, parent) {
        for child in tree.children_of(node) {
            import_node(tree, child, dom, copy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{inner_html, parse_fragment};

    fn text_node(dom: &Dom, text: &str) -> NodeId {
        dom.descendants(dom.root())
            .find(|&id| dom.text_content(id) == Some(text))
            .unwrap()
    }

    #[test]
    fn test_compare_same_node() {
        let dom = parse_fragment("abcdef");
        let t = text_node(&dom, "abcdef");
        assert_eq!(
            compare_points(&dom, BoundaryPoint::new(t, 1), BoundaryPoint::new(t, 3)),
            Ordering::Less
        );
        assert_eq!(
            compare_points(&dom, BoundaryPoint::new(t, 3), BoundaryPoint::new(t, 3)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_compare_ancestor_and_descendant() {
        let dom = parse_fragment("<p>one</p><p>two</p>");
        let root = dom.root();
        let two = text_node(&dom, "two");

        // (root, 1) sits between the paragraphs, before "two"
        assert_eq!(
            compare_points(&dom, BoundaryPoint::new(root, 1), BoundaryPoint::new(two, 0)),
            Ordering::Less
        );
        // (root, 2) is after the second paragraph
        assert_eq!(
            compare_points(&dom, BoundaryPoint::new(two, 3), BoundaryPoint::new(root, 2)),
            Ordering::Less
        );
        assert_eq!(
            compare_points(&dom, BoundaryPoint::new(root, 2), BoundaryPoint::new(two, 0)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_siblings_in_different_subtrees() {
        let dom = parse_fragment("<p><b>one</b></p><p><i>two</i></p>");
        let one = text_node(&dom, "one");
        let two = text_node(&dom, "two");
        assert_eq!(
            compare_points(&dom, BoundaryPoint::new(two, 0), BoundaryPoint::new(one, 3)),
            Ordering::Greater
        );
    }

    #[test]
    #[should_panic(expected = "unconnected")]
    fn test_compare_disconnected_panics() {
        let mut dom = parse_fragment("<p>x</p>");
        let orphan = dom.create_text("orphan".into());
        let x = text_node(&dom, "x");
        compare_points(&dom, BoundaryPoint::new(x, 0), BoundaryPoint::new(orphan, 0));
    }

    #[test]
    fn test_delimit_same_text_node() {
        let dom = parse_fragment("abcdef");
        let n1 = text_node(&dom, "abcdef");
        let a = SelectionRange::new(BoundaryPoint::new(n1, 1), BoundaryPoint::new(n1, 2));
        let b = SelectionRange::new(BoundaryPoint::new(n1, 3), BoundaryPoint::new(n1, 4));

        let union = delimit(&dom, &a, &b);

        assert_eq!(union.start, BoundaryPoint::new(n1, 1));
        assert_eq!(union.end, BoundaryPoint::new(n1, 4));
        assert_eq!(delimit(&dom, &b, &a), union);
    }

    #[test]
    fn test_delimit_across_table_cells() {
        let dom = parse_fragment("<table><tr><td>a</td><td>b</td></tr></table>");
        let a = text_node(&dom, "a");
        let b = text_node(&dom, "b");
        let first = SelectionRange::contents_of(&dom, a);
        let second = SelectionRange::contents_of(&dom, b);

        let union = delimit(&dom, &second, &first);

        assert_eq!(union.start, BoundaryPoint::new(a, 0));
        assert_eq!(union.end, BoundaryPoint::new(b, 1));
    }

    #[test]
    fn test_ordered_swaps() {
        let dom = parse_fragment("abc");
        let t = text_node(&dom, "abc");
        let range =
            SelectionRange::ordered(&dom, BoundaryPoint::new(t, 2), BoundaryPoint::new(t, 1));
        assert_eq!(range.start.offset, 1);
        assert_eq!(range.end.offset, 2);
    }

    #[test]
    fn test_clone_partial_elements() {
        let dom = parse_fragment("<p>a<b>bcd</b>e</p><p>fg</p>");
        let bcd = text_node(&dom, "bcd");
        let fg = text_node(&dom, "fg");
        let range = SelectionRange::new(BoundaryPoint::new(bcd, 1), BoundaryPoint::new(fg, 1));

        let copy = clone_contents(&dom, &range);

        assert_eq!(inner_html(&copy, copy.root()), "<p><b>cd</b>e</p><p>f</p>");
    }

    #[test]
    fn test_clone_within_one_text_node() {
        let dom = parse_fragment("<i>h\u{e9}llo</i>");
        let t = text_node(&dom, "h\u{e9}llo");
        let range = SelectionRange::new(BoundaryPoint::new(t, 1), BoundaryPoint::new(t, 3));

        let copy = clone_contents(&dom, &range);

        assert_eq!(inner_html(&copy, copy.root()), "\u{e9}l");
    }

    #[test]
    fn test_clone_list_items_by_child_offsets() {
        let dom = parse_fragment("<ul><li>one</li><li>two</li><li>three</li></ul>");
        let ul = dom.find_by_tag("ul").unwrap();
        let range = SelectionRange::new(BoundaryPoint::new(ul, 1), BoundaryPoint::new(ul, 2));

        let copy = clone_contents(&dom, &range);

        assert_eq!(inner_html(&copy, copy.root()), "<li>two</li>");
    }

    #[test]
    fn test_common_ancestor_and_child_containing() {
        let dom = parse_fragment("<div><p><b>x</b></p><p>y</p></div>");
        let x = text_node(&dom, "x");
        let y = text_node(&dom, "y");
        let div = dom.find_by_tag("div").unwrap();

        assert_eq!(common_ancestor(&dom, x, y), Some(div));
        let p = child_containing(&dom, div, x).unwrap();
        assert_eq!(dom.element_name(p).unwrap().as_ref(), "p");
        assert_eq!(child_containing(&dom, x, div), None);
    }
}
