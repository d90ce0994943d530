//! Builds a [`Dom`] from html5ever tree-construction callbacks.

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as ParsedAttribute, QualName};

use super::arena::{Attribute, Dom, NodeData, NodeId};

/// Receives the parser's tree operations.
///
/// html5ever drives the sink through `&self`, so the tree sits in a
/// `RefCell` and each callback borrows it for the duration of one edit.
#[derive(Default)]
pub(crate) struct DomSink {
    dom: RefCell<Dom>,
}

impl DomSink {
    fn node(&self, child: NodeOrText<NodeId>) -> NodeId {
        match child {
            NodeOrText::AppendNode(id) => id,
            NodeOrText::AppendText(text) => self.dom.borrow_mut().create_text(text.to_string()),
        }
    }
}

fn owned(attrs: Vec<ParsedAttribute>) -> impl Iterator<Item = Attribute> {
    attrs.into_iter().map(|a| Attribute {
        name: a.name,
        value: a.value.to_string(),
    })
}

impl TreeSink for DomSink {
    type Handle = NodeId;
    type Output = Dom;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Dom {
        self.dom.into_inner()
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        tracing::trace!(%msg, "html parse error");
    }

    fn get_document(&self) -> NodeId {
        self.dom.borrow().root()
    }

    fn elem_name<'a>(&'a self, target: &'a NodeId) -> &'a QualName {
        static UNNAMED: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let dom = self.dom.borrow();
        let Some(NodeData::Element { name, .. }) = dom.get(*target).map(|n| &n.data) else {
            return &UNNAMED;
        };
        // SAFETY: the arena only grows during parsing and element names are
        // never rewritten, so `name` outlives the RefCell guard.
        unsafe { &*(name as *const QualName) }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<ParsedAttribute>,
        _flags: ElementFlags,
    ) -> NodeId {
        self.dom
            .borrow_mut()
            .create_element(name, owned(attrs).collect())
    }

    fn create_comment(&self, text: StrTendril) -> NodeId {
        self.dom.borrow_mut().create_comment(text.to_string())
    }

    // Processing instructions become empty comments.
    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> NodeId {
        self.dom.borrow_mut().create_comment(String::new())
    }

    fn append(&self, parent: &NodeId, child: NodeOrText<NodeId>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(id) => dom.append(*parent, id),
            NodeOrText::AppendText(text) => dom.append_text(*parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &NodeId,
        prev_element: &NodeId,
        child: NodeOrText<NodeId>,
    ) {
        let parent = self.dom.borrow().parent(*element);
        self.append(parent.as_ref().unwrap_or(prev_element), child);
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut dom = self.dom.borrow_mut();
        let doctype = dom.create_doctype(name.to_string());
        let root = dom.root();
        dom.append(root, doctype);
    }

    fn get_template_contents(&self, target: &NodeId) -> NodeId {
        *target
    }

    fn same_node(&self, x: &NodeId, y: &NodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        tracing::trace!(?mode, "quirks mode");
    }

    fn append_before_sibling(&self, sibling: &NodeId, new_node: NodeOrText<NodeId>) {
        let id = self.node(new_node);
        self.dom.borrow_mut().insert_before(*sibling, id);
    }

    fn add_attrs_if_missing(&self, target: &NodeId, attrs: Vec<ParsedAttribute>) {
        let mut dom = self.dom.borrow_mut();
        let Some(NodeData::Element { attrs: existing, .. }) =
            dom.get_mut(*target).map(|n| &mut n.data)
        else {
            return;
        };
        for attr in owned(attrs) {
            if existing.iter().all(|a| a.name != attr.name) {
                existing.push(attr);
            }
        }
    }

    fn remove_from_parent(&self, target: &NodeId) {
        self.dom.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &NodeId, new_parent: &NodeId) {
        self.dom.borrow_mut().reparent_children(*node, *new_parent);
    }
}
