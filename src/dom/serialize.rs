//! Markup serialization for [`Dom`] subtrees.
//!
//! Output is HTML, not XHTML: void elements have no closing tag and no
//! trailing slash, and the contents of raw-text elements are written as-is.

use std::fmt::Write;

use super::arena::{Dom, NodeData, NodeId};

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are not entity-escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "script",
    "style",
    "xmp",
];

/// Check whether a tag is a void element.
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Serialize the children of `id`.
pub fn inner_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    for child in dom.children(id) {
        walk_node(dom, child, &mut out);
    }
    out
}

/// Serialize `id` itself, tags included.
pub fn outer_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    walk_node(dom, id, &mut out);
    out
}

/// Write the start tag of an element, attributes in source order.
pub fn write_start_tag<'a>(
    out: &mut String,
    tag: &str,
    attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    write!(out, "<{}", tag).unwrap();
    for (name, value) in attrs {
        write!(out, " {}=\"{}\"", name, escape_attr(value)).unwrap();
    }
    out.push('>');
}

/// Walk a node and emit its HTML.
fn walk_node(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        NodeData::Root => {
            for child in dom.children(id) {
                walk_node(dom, child, out);
            }
        }
        NodeData::Text(text) => {
            let raw = dom
                .parent(id)
                .and_then(|p| dom.element_name(p))
                .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name.as_ref()));
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        NodeData::Comment(text) => {
            write!(out, "<!--{}-->", text).unwrap();
        }
        NodeData::Doctype { name } => {
            write!(out, "<!DOCTYPE {}>", name).unwrap();
        }
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.as_ref();
            write_start_tag(
                out,
                tag,
                attrs
                    .iter()
                    .map(|a| (a.name.local.as_ref(), a.value.as_str())),
            );
            if is_void(tag) {
                return;
            }
            for child in dom.children(id) {
                walk_node(dom, child, out);
            }
            write!(out, "</{}>", tag).unwrap();
        }
    }
}

/// Escape text content. Non-breaking spaces are written as `&nbsp;` so they
/// survive a round trip visibly.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}
