//! Flattening: re-express styled markup as text, line breaks and preserved
//! structural elements.
//!
//! # Example
//!
//! ```
//! use destyle::flatten;
//!
//! let html = concat!(
//!     r#"<div><font color="red">Hello</font></div>"#,
//!     r#"<p><b>World</b> <a href="/x"><b>link</b></a></p>"#,
//! );
//! assert_eq!(
//!     flatten(html),
//!     r#"<br>Hello<br>World <a href="/x"><b>link</b></a>"#
//! );
//! ```

mod output;

pub use output::{FlattenedOutput, Fragment};

use crate::classify::{
    Classification, Classify, NodeRef, TableScaffolding, classify, is_block, is_preformatted,
    is_table_block, is_table_scaffolding,
};
use crate::dom::{Dom, NodeData, NodeId, parse_bytes, parse_fragment, write_start_tag};
use crate::util::{collapse_newlines, is_whitespace_only};

/// Depth-first flattening worker.
///
/// Holds only configuration, so one value can flatten any number of
/// fragments.
#[derive(Clone, Copy, Default)]
pub struct Flattener<'a> {
    classifier: Option<&'a dyn Classify>,
    tables: TableScaffolding,
}

impl<'a> Flattener<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult `classifier` before the default policy.
    pub fn with_classifier(mut self, classifier: &'a dyn Classify) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_table_scaffolding(mut self, tables: TableScaffolding) -> Self {
        self.tables = tables;
        self
    }

    /// Flatten a markup fragment to markup.
    pub fn flatten(&self, markup: &str) -> String {
        let dom = parse_fragment(markup);
        self.flatten_dom(&dom, dom.root()).to_markup()
    }

    /// Flatten the children of `root`.
    pub fn flatten_dom(&self, dom: &Dom, root: NodeId) -> FlattenedOutput {
        let mut out = FlattenedOutput::new();
        for child in dom.children(root) {
            self.walk(dom, child, &mut out, false);
        }
        out.finish();
        out
    }

    fn walk(&self, dom: &Dom, id: NodeId, out: &mut FlattenedOutput, pre: bool) {
        let Some(node) = dom.get(id) else {
            return;
        };
        let node_ref = NodeRef::new(dom, id);
        let class = classify(node_ref, self.classifier, self.tables);

        match (&node.data, class) {
            (_, Classification::Drop) => {}
            (_, Classification::Replace(markup)) => out.push_markup(markup),
            (NodeData::Text(text), _) => push_text(out, text, pre),
            (NodeData::Element { name, .. }, Classification::Preserve) => {
                self.preserve(dom, id, name.local.as_ref(), out, pre);
            }
            (NodeData::Element { name, .. }, Classification::Unwrap) => {
                self.unwrap(dom, id, name.local.as_ref(), out, pre);
            }
            _ => {}
        }
    }

    fn unwrap(&self, dom: &Dom, id: NodeId, tag: &str, out: &mut FlattenedOutput, pre: bool) {
        if tag == "br" {
            out.request_break();
            return;
        }
        let block =
            is_block(tag) || (self.tables == TableScaffolding::Remove && is_table_block(tag));
        let pre = pre || is_preformatted(tag);

        if block {
            out.request_break();
        }
        for child in dom.children(id) {
            self.walk(dom, child, out, pre);
        }
        if block {
            out.end_block();
        }
    }

    fn preserve(&self, dom: &Dom, id: NodeId, tag: &str, out: &mut FlattenedOutput, pre: bool) {
        match tag {
            // Links are kept whole: href and inner markup untouched
            "a" => out.push_markup(NodeRef::new(dom, id).outer_html()),
            "img" => {
                let mut markup = String::new();
                write_start_tag(
                    &mut markup,
                    tag,
                    dom.attrs(id)
                        .iter()
                        .map(|a| (a.name.local.as_ref(), a.value.as_str()))
                        .filter(|&(name, value)| name != "border" || value == "0"),
                );
                out.push_markup(markup);
            }
            _ => {
                let scaffolding = is_table_scaffolding(tag);
                let mut inner = FlattenedOutput::new();
                for child in dom.children(id) {
                    // Formatting whitespace between rows and cells
                    if scaffolding
                        && !matches!(tag, "td" | "th")
                        && dom.text_content(child).is_some_and(is_whitespace_only)
                    {
                        continue;
                    }
                    self.walk(dom, child, &mut inner, pre || is_preformatted(tag));
                }
                inner.finish();
                if matches!(tag, "td" | "th") {
                    inner.strip_leading_break();
                }

                let mut markup = String::new();
                write_start_tag(
                    &mut markup,
                    tag,
                    dom.attrs(id)
                        .iter()
                        .map(|a| (a.name.local.as_ref(), a.value.as_str())),
                );
                markup.push_str(&inner.to_markup());
                markup.push_str(&format!("</{}>", tag));

                if scaffolding || is_block(tag) {
                    out.push_block(markup);
                } else {
                    out.push_markup(markup);
                }
            }
        }
    }
}

/// Text outside preformatted content has its newlines collapsed; inside,
/// each newline owes a break, so a final newline adds nothing.
fn push_text(out: &mut FlattenedOutput, text: &str, pre: bool) {
    if !pre {
        out.push_text(&collapse_newlines(text));
        return;
    }
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.end_block();
        }
        out.push_text(line.trim_end_matches('\r'));
    }
}

/// Flatten a markup fragment with the default policy.
pub fn flatten(markup: &str) -> String {
    Flattener::new().flatten(markup)
}

/// Flatten a markup fragment, consulting `classifier` first.
pub fn flatten_with(markup: &str, classifier: &dyn Classify) -> String {
    Flattener::new().with_classifier(classifier).flatten(markup)
}

/// Flatten HTML bytes in any supported encoding.
pub fn flatten_bytes(bytes: &[u8]) -> String {
    let dom = parse_bytes(bytes);
    Flattener::new().flatten_dom(&dom, dom.root()).to_markup()
}
