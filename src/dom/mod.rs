//! Arena markup tree, html5ever parsing and serialization.
//!
//! # Example
//!
//! ```
//! use destyle::dom::{parse_fragment, inner_html};
//!
//! let dom = parse_fragment("<p>Hello, <b>World</b>!</p>");
//! let p = dom.find_by_tag("p").unwrap();
//! assert_eq!(dom.text_of_subtree(p), "Hello, World!");
//! assert_eq!(inner_html(&dom, dom.root()), "<p>Hello, <b>World</b>!</p>");
//! ```

mod arena;
mod element_ref;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, DescendantsIter, Dom, Node, NodeData, NodeId, html_name};
pub use element_ref::{DestyleSelectors, ElementRef};
pub use serialize::{escape_attr, escape_text, inner_html, is_void, outer_html, write_start_tag};

use html5ever::driver::ParseOpts;
use html5ever::tendril::TendrilSink;

use tree_sink::DomSink;

/// Parse an HTML fragment as `<body>` content.
///
/// The returned tree is rooted at the body element, so
/// `dom.children(dom.root())` are the fragment's top-level nodes. Leading
/// whitespace is kept, which a bare document parse would discard.
pub fn parse_fragment(markup: &str) -> Dom {
    let wrapped = format!("<html><body>{}</body></html>", markup);
    into_body(parse(&wrapped))
}

/// Parse a complete HTML document and root the tree at its body.
///
/// Input that does not start with a doctype or `<html>` is treated as a
/// fragment.
pub fn parse_document(markup: &str) -> Dom {
    if looks_like_document(markup) {
        into_body(parse(markup))
    } else {
        parse_fragment(markup)
    }
}

/// Parse HTML bytes, detecting their encoding.
///
/// UTF-8 is tried first, then a `<meta charset>` hint, then Windows-1252.
pub fn parse_bytes(bytes: &[u8]) -> Dom {
    let hint = crate::util::extract_meta_charset(bytes);
    let text = crate::util::decode_text(bytes, hint);
    parse_document(&text)
}

fn parse(markup: &str) -> Dom {
    html5ever::parse_document(DomSink::default(), ParseOpts::default())
        .from_utf8()
        .one(markup.as_bytes())
}

fn into_body(mut dom: Dom) -> Dom {
    if let Some(body) = dom.find_by_tag("body") {
        dom.set_root(body);
    }
    dom
}

fn looks_like_document(markup: &str) -> bool {
    let head: String = markup
        .trim_start()
        .chars()
        .take(9)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}
