//! Arena-based markup tree.
//!
//! html5ever parses into this tree, the flattening worker walks it, and the
//! bundled [`Document`](crate::Document) edits it in place. Parent, child and
//! sibling links are indices into one vector, so detaching a subtree never
//! frees anything and node ids stay valid for the lifetime of the tree.

use html5ever::{LocalName, Namespace, QualName, ns};

use crate::util::byte_offset;

/// Index of a node in its [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Link value meaning "no node".
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        *self != Self::NONE
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    fn option(self) -> Option<NodeId> {
        self.is_some().then_some(self)
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Root of a detached fragment or of a parsed document.
    Root,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Pre-extracted id for selector matching.
        id: Option<String>,
        /// Pre-extracted classes for selector matching.
        classes: Vec<String>,
    },
    Text(String),
    /// Comment. Kept so documents round-trip, never emitted by flattening.
    Comment(String),
    Doctype { name: String },
}

/// An attribute with its value decoded to an owned string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Attribute in the null namespace, the common case for HTML.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }
}

/// A node in the arena.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Build a qualified name in the HTML namespace.
pub fn html_name(local: &str) -> QualName {
    QualName::new(None, ns!(html), LocalName::from(local.to_ascii_lowercase()))
}

/// Arena-based markup tree.
///
/// All nodes are stored in a contiguous vector. Parent/child/sibling links
/// use indices into this vector.
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Dom {
    /// Create a new tree holding only a root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Root)],
            root: NodeId(0),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() as u32 - 1)
    }

    /// The node everything else hangs from.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Detach `id` and make it the root of this tree.
    ///
    /// Used after parsing a wrapped fragment, where the `<body>` element
    /// becomes the root and the surrounding `<html>`/`<head>` are left
    /// unreachable in the arena.
    pub fn set_root(&mut self, id: NodeId) {
        self.detach(id);
        self.root = id;
    }

    /// The node behind `id`; `None` for [`NodeId::NONE`].
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.option()?.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.option()?.0 as usize)
    }

    /// Allocate an unattached element. The `id` and `class` attributes are
    /// indexed for selector matching.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let value = |key: &str| {
            attrs
                .iter()
                .find(|a| &*a.name.local == key)
                .map(|a| a.value.as_str())
        };
        let id = value("id").map(str::to_owned);
        let classes: Vec<String> = value("class")
            .map(|v| v.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();
        self.alloc(Node::new(NodeData::Element {
            name,
            attrs,
            id,
            classes,
        }))
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    pub fn create_doctype(&mut self, name: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype { name }))
    }

    /// Link an unattached `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Link an unattached `new_node` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let parent = self.get(sibling).map(|n| n.parent).unwrap_or(NodeId::NONE);
        let prev = self
            .get(sibling)
            .map(|n| n.prev_sibling)
            .unwrap_or(NodeId::NONE);

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Insert `new_node` as the child of `parent` at `index`, appending when
    /// `index` is past the last child.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, new_node: NodeId) {
        match self.child_at(parent, index) {
            Some(sibling) => self.insert_before(sibling, new_node),
            None => self.append(parent, new_node),
        }
    }

    /// Append text under `parent`, extending its last child when that is
    /// already a text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Unlink a node from its parent and siblings. The subtree below it is
    /// left intact.
    pub fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Move every child of `node` under `new_parent`, preserving order.
    pub fn reparent_children(&mut self, node: NodeId, new_parent: NodeId) {
        let children: Vec<_> = self.children(node).collect();
        for child in children {
            self.detach(child);
            self.append(new_parent, child);
        }
    }

    /// Split a text node at a character offset.
    ///
    /// The original node keeps the text before `offset`; a new sibling holding
    /// the rest is inserted right after it and returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let tail = match self.get_mut(id).map(|n| &mut n.data) {
            Some(NodeData::Text(text)) => {
                let at = byte_offset(text, offset);
                text.split_off(at)
            }
            _ => return None,
        };

        let tail_id = self.create_text(tail);
        let next = self.get(id).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
        if next.is_some() {
            self.insert_before(next, tail_id);
        } else {
            let parent = self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE);
            self.append(parent, tail_id);
        }
        Some(tail_id)
    }

    /// Remove the characters `[from, to)` of a text node.
    pub fn remove_text(&mut self, id: NodeId, from: usize, to: usize) {
        if let Some(NodeData::Text(text)) = self.get_mut(id).map(|n| &mut n.data) {
            let start = byte_offset(text, from);
            let end = byte_offset(text, to).max(start);
            text.replace_range(start..end, "");
        }
    }

    /// Set an attribute of an element, replacing any existing value in place.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: &str) {
        let Some(NodeData::Element {
            attrs,
            id: indexed_id,
            classes,
            ..
        }) = self.get_mut(id).map(|n| &mut n.data)
        else {
            return;
        };
        match attrs.iter_mut().find(|a| &*a.name.local == attr_name) {
            Some(attr) => attr.value = value.to_owned(),
            None => attrs.push(Attribute::new(attr_name, value)),
        }
        match attr_name {
            "id" => *indexed_id = Some(value.to_owned()),
            "class" => *classes = value.split_whitespace().map(str::to_owned).collect(),
            _ => {}
        }
    }

    /// Children of a node, first to last.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        ChildrenIter {
            dom: self,
            current: self.get(parent).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Number of children of a node.
    pub fn child_count(&self, parent: NodeId) -> usize {
        self.children(parent).count()
    }

    /// The `index`th child of a node.
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).nth(index)
    }

    /// Position of a node among its siblings.
    pub fn index_of(&self, id: NodeId) -> usize {
        let mut index = 0;
        let mut current = self.get(id).map(|n| n.prev_sibling).unwrap_or(NodeId::NONE);
        while let Some(node) = self.get(current) {
            index += 1;
            current = node.prev_sibling;
        }
        index
    }

    /// Parent of a node, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.option())
    }

    /// Iterate over `id` and its ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(id.is_some().then_some(id), move |&n| self.parent(n))
    }

    /// Pre-order iterator over `id` and every node below it.
    pub fn descendants(&self, id: NodeId) -> DescendantsIter<'_> {
        DescendantsIter {
            dom: self,
            stack: if id.is_some() { vec![id] } else { Vec::new() },
        }
    }

    fn tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(self.root)
            .filter(move |&id| self.element_name(id).is_some_and(|n| &**n == tag))
    }

    /// First element with the given tag, in document order.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.tagged(tag).next()
    }

    /// Every element with the given tag, in document order.
    pub fn find_all_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.tagged(tag).collect()
    }

    /// Copy the subtree rooted at `src_node` of another tree under `parent`.
    ///
    /// Returns the id of the copy.
    pub fn import(&mut self, src: &Dom, src_node: NodeId, parent: NodeId) -> Option<NodeId> {
        let copy = self.import_detached(src, src_node)?;
        self.append(parent, copy);
        Some(copy)
    }

    /// Copy the subtree rooted at `src_node` of another tree, leaving the
    /// copy unattached.
    pub fn import_detached(&mut self, src: &Dom, src_node: NodeId) -> Option<NodeId> {
        let data = src.get(src_node)?.data.clone();
        let copy = match data {
            NodeData::Element { name, attrs, .. } => self.create_element(name, attrs),
            NodeData::Root => return None,
            other => self.alloc(Node::new(other)),
        };
        for child in src.children(src_node) {
            self.import(src, child, copy);
        }
        Some(copy)
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Sibling walk returned by [`Dom::children`].
pub struct ChildrenIter<'a> {
    dom: &'a Dom,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.dom.get(self.current)?;
        Some(std::mem::replace(&mut self.current, node.next_sibling))
    }
}

/// Pre-order iterator over a subtree.
pub struct DescendantsIter<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantsIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let first = self.stack.len();
        self.stack.extend(self.dom.children(id));
        self.stack[first..].reverse();
        Some(id)
    }
}

/// Typed views of node payloads. Each returns `None` (or an empty slice)
/// when the node is missing or of another kind.
impl Dom {
    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.get(id).map(|n| &n.data)
    }

    fn element(&self, id: NodeId) -> Option<(&QualName, &[Attribute])> {
        match self.data(id)? {
            NodeData::Element { name, attrs, .. } => Some((name, attrs.as_slice())),
            _ => None,
        }
    }

    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.element(id).map(|(name, _)| &name.local)
    }

    pub fn element_namespace(&self, id: NodeId) -> Option<&Namespace> {
        self.element(id).map(|(name, _)| &name.ns)
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.element(id).map(|(_, attrs)| attrs).unwrap_or_default()
    }

    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| &*a.name.local == attr_name)
            .map(|a| a.value.as_str())
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    pub fn element_classes(&self, id: NodeId) -> &[String] {
        match self.data(id) {
            Some(NodeData::Element { classes, .. }) => classes.as_slice(),
            _ => &[],
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text_content(id).is_some()
    }

    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_of_subtree(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|n| self.text_content(n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_indexes_id_and_class() {
        let mut dom = Dom::new();

        let div = dom.create_element(
            html_name("DIV"),
            vec![Attribute::new("id", "main"), Attribute::new("class", " a  b ")],
        );
        dom.append(dom.root(), div);

        assert_eq!(dom.element_name(div).map(|n| &**n), Some("div"));
        assert_eq!(dom.element_id(div), Some("main"));
        assert_eq!(dom.element_classes(div), ["a", "b"]);
        assert_eq!(dom.get_attr(div, "id"), Some("main"));
        assert!(dom.is_element(div) && !dom.is_text(div));
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut dom = Dom::new();
        let ol = dom.create_element(
            html_name("ol"),
            vec![Attribute::new("start", "3"), Attribute::new("class", "x")],
        );

        dom.set_attr(ol, "start", "5");
        dom.set_attr(ol, "class", "y z");

        let names: Vec<_> = dom.attrs(ol).iter().map(|a| &*a.name.local).collect();
        assert_eq!(names, ["start", "class"]);
        assert_eq!(dom.get_attr(ol, "start"), Some("5"));
        assert_eq!(dom.element_classes(ol), ["y", "z"]);
    }

    #[test]
    fn test_sibling_links() {
        let mut dom = Dom::new();

        let parent = dom.create_element(html_name("div"), vec![]);
        let child1 = dom.create_element(html_name("p"), vec![]);
        let child2 = dom.create_element(html_name("p"), vec![]);

        dom.append(dom.root(), parent);
        dom.append(parent, child1);
        dom.append(parent, child2);

        let children: Vec<_> = dom.children(parent).collect();
        assert_eq!(children, vec![child1, child2]);
        assert_eq!(dom.index_of(child2), 1);
        assert_eq!(dom.child_at(parent, 1), Some(child2));
        assert_eq!(dom.parent(child1), Some(parent));
    }

    #[test]
    fn test_adjacent_text_merges() {
        let mut dom = Dom::new();

        let p = dom.create_element(html_name("p"), vec![]);
        dom.append(dom.root(), p);

        dom.append_text(p, "Hello, ");
        dom.append_text(p, "World!");

        assert_eq!(dom.child_count(p), 1);
        assert_eq!(dom.text_of_subtree(p), "Hello, World!");
    }

    #[test]
    fn test_detach_middle_child() {
        let mut dom = Dom::new();
        let root = dom.root();
        let a = dom.create_text("a".into());
        let b = dom.create_text("b".into());
        let c = dom.create_text("c".into());
        dom.append(root, a);
        dom.append(root, b);
        dom.append(root, c);

        dom.detach(b);

        assert_eq!(dom.children(root).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(dom.parent(b), None);
        assert_eq!(dom.index_of(c), 1);
    }

    #[test]
    fn test_split_text_uses_char_offsets() {
        let mut dom = Dom::new();
        let root = dom.root();
        let t = dom.create_text("héllo".into());
        dom.append(root, t);

        let tail = dom.split_text(t, 2).unwrap();

        assert_eq!(dom.text_content(t), Some("hé"));
        assert_eq!(dom.text_content(tail), Some("llo"));
        assert_eq!(dom.index_of(tail), 1);
    }

    #[test]
    fn test_remove_text_range() {
        let mut dom = Dom::new();
        let root = dom.root();
        let t = dom.create_text("abcdef".into());
        dom.append(root, t);

        dom.remove_text(t, 1, 4);

        assert_eq!(dom.text_content(t), Some("aef"));
    }

    #[test]
    fn test_import_copies_subtree() {
        let mut src = Dom::new();
        let b = src.create_element(html_name("b"), vec![Attribute::new("class", "x")]);
        src.append(src.root(), b);
        src.append_text(b, "bold");

        let mut dst = Dom::new();
        let root = dst.root();
        let copy = dst.import(&src, b, root).unwrap();

        assert_eq!(dst.element_name(copy).unwrap().as_ref(), "b");
        assert_eq!(dst.element_classes(copy), ["x".to_string()]);
        assert_eq!(dst.text_of_subtree(copy), "bold");
    }

    #[test]
    fn test_descendants_preorder() {
        let mut dom = Dom::new();
        let root = dom.root();
        let div = dom.create_element(html_name("div"), vec![]);
        let span = dom.create_element(html_name("span"), vec![]);
        dom.append(root, div);
        dom.append(div, span);
        dom.append_text(span, "x");
        dom.append_text(div, "y");

        assert_eq!(dom.text_of_subtree(root), "xy");
        assert_eq!(dom.find_by_tag("span"), Some(span));
        assert_eq!(
            dom.ancestors(span).collect::<Vec<_>>(),
            vec![span, div, root]
        );
    }
}
