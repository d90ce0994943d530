//! Node classification: what flattening does with each node.
//!
//! The default policy keeps table scaffolding, links and images and unwraps
//! everything else. Callers change that per invocation with a [`Classify`]
//! override, which is consulted first.

use crate::dom::{Dom, ElementRef, NodeData, NodeId, inner_html, outer_html};

/// What flattening does with a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Keep the node with its attributes; its children are still flattened.
    Preserve,
    /// Drop the node itself and keep its flattened children in place.
    Unwrap,
    /// Drop the node and everything inside it.
    Drop,
    /// Emit this markup instead of the node. Children are not visited.
    Replace(String),
}

/// How table scaffolding is treated by the default policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableScaffolding {
    /// Keep `table`, `tr`, `td` and friends. Cell contents are destyled.
    #[default]
    Preserve,
    /// Unwrap the scaffolding; tables, rows and cells become line breaks.
    /// Used for tables that are selected in full.
    Remove,
}

/// Borrowed view of a node being classified.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    dom: &'a Dom,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn new(dom: &'a Dom, id: NodeId) -> Self {
        Self { dom, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn dom(&self) -> &'a Dom {
        self.dom
    }

    /// Lowercase tag name, `None` unless this is an element.
    pub fn tag(&self) -> Option<&'a str> {
        self.dom.element_name(self.id).map(|name| name.as_ref())
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.dom.get_attr(self.id, name)
    }

    /// Content of a text node.
    pub fn text(&self) -> Option<&'a str> {
        self.dom.text_content(self.id)
    }

    pub fn is_element(&self) -> bool {
        self.dom.is_element(self.id)
    }

    pub fn is_text(&self) -> bool {
        self.dom.is_text(self.id)
    }

    pub fn is_comment(&self) -> bool {
        self.dom
            .get(self.id)
            .is_some_and(|n| matches!(n.data, NodeData::Comment(_) | NodeData::Doctype { .. }))
    }

    /// The node serialized with its tags.
    pub fn outer_html(&self) -> String {
        outer_html(self.dom, self.id)
    }

    /// The node's children serialized.
    pub fn inner_html(&self) -> String {
        inner_html(self.dom, self.id)
    }

    /// Selector-matching view, for elements.
    pub fn element(&self) -> Option<ElementRef<'a>> {
        self.is_element().then(|| ElementRef::new(self.dom, self.id))
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("tag", &self.tag())
            .finish()
    }
}

/// A classification override.
///
/// Returning `None` defers to the default policy.
pub trait Classify {
    fn classify(&self, node: NodeRef<'_>) -> Option<Classification>;
}

impl<F> Classify for F
where
    F: Fn(NodeRef<'_>) -> Option<Classification>,
{
    fn classify(&self, node: NodeRef<'_>) -> Option<Classification> {
        self(node)
    }
}

/// Adapter for overrides that only ever supply replacement markup.
///
/// ```
/// use destyle::{ReplaceWith, NodeRef, flatten_with};
///
/// let keep_bold = ReplaceWith(|node: NodeRef<'_>| {
///     (node.tag() == Some("b")).then(|| node.outer_html())
/// });
/// assert_eq!(flatten_with("<i>a</i><b>b</b>", &keep_bold), "a<b>b</b>");
/// ```
pub struct ReplaceWith<F>(pub F);

impl<F> Classify for ReplaceWith<F>
where
    F: Fn(NodeRef<'_>) -> Option<String>,
{
    fn classify(&self, node: NodeRef<'_>) -> Option<Classification> {
        (self.0)(node).map(Classification::Replace)
    }
}

/// Classify `node`, consulting `custom` before the default policy.
pub fn classify(
    node: NodeRef<'_>,
    custom: Option<&dyn Classify>,
    tables: TableScaffolding,
) -> Classification {
    if let Some(result) = custom.and_then(|c| c.classify(node)) {
        tracing::trace!(?node, ?result, "classification override");
        return result;
    }
    default_policy(node, tables)
}

/// Classification absent any override.
pub fn default_policy(node: NodeRef<'_>, tables: TableScaffolding) -> Classification {
    if node.is_text() {
        return Classification::Preserve;
    }
    let Some(tag) = node.tag() else {
        return Classification::Drop;
    };
    match tag {
        "a" | "img" => Classification::Preserve,
        t if is_table_scaffolding(t) && tables == TableScaffolding::Preserve => {
            Classification::Preserve
        }
        _ => Classification::Unwrap,
    }
}

/// Elements whose boundaries become line breaks when unwrapped.
pub fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "figure"
            | "footer"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "ul"
            | "xmp"
    )
}

/// Table elements kept by [`TableScaffolding::Preserve`].
pub fn is_table_scaffolding(tag: &str) -> bool {
    matches!(
        tag,
        "table" | "thead" | "tbody" | "tfoot" | "tr" | "td" | "th"
    )
}

/// Table elements that act as line boundaries once their scaffolding is
/// removed. Row groups are transparent.
pub fn is_table_block(tag: &str) -> bool {
    matches!(tag, "table" | "tr" | "td" | "th" | "caption")
}

pub fn is_list(tag: &str) -> bool {
    matches!(tag, "ul" | "ol")
}

/// Elements whose text keeps its newlines.
pub fn is_preformatted(tag: &str) -> bool {
    matches!(tag, "pre" | "xmp" | "listing" | "textarea")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_fragment;

    fn first(dom: &Dom, tag: &str) -> NodeId {
        dom.find_by_tag(tag).unwrap()
    }

    #[test]
    fn test_default_policy() {
        let dom = parse_fragment(concat!(
            r#"<table><tr><td><a href="x">l</a><img src="i.png">"#,
            "<b>b</b><div>d</div></td></tr></table>",
        ));
        let policy = |tag: &str| {
            default_policy(NodeRef::new(&dom, first(&dom, tag)), TableScaffolding::Preserve)
        };

        for tag in ["table", "tbody", "tr", "td", "a", "img"] {
            assert_eq!(policy(tag), Classification::Preserve, "{tag}");
        }
        assert_eq!(policy("b"), Classification::Unwrap);
        assert_eq!(policy("div"), Classification::Unwrap);
    }

    #[test]
    fn test_remove_mode_unwraps_scaffolding() {
        let dom = parse_fragment("<table><tr><td><a href=\"x\">l</a></td></tr></table>");
        let td = NodeRef::new(&dom, first(&dom, "td"));
        let a = NodeRef::new(&dom, first(&dom, "a"));

        assert_eq!(
            default_policy(td, TableScaffolding::Remove),
            Classification::Unwrap
        );
        assert_eq!(
            default_policy(a, TableScaffolding::Remove),
            Classification::Preserve
        );
    }

    #[test]
    fn test_text_and_comments() {
        let dom = parse_fragment("text<!-- c -->");
        let mut children = dom.children(dom.root());
        let text = NodeRef::new(&dom, children.next().unwrap());
        let comment = NodeRef::new(&dom, children.next().unwrap());

        assert_eq!(
            default_policy(text, TableScaffolding::Preserve),
            Classification::Preserve
        );
        assert!(comment.is_comment());
        assert_eq!(
            default_policy(comment, TableScaffolding::Preserve),
            Classification::Drop
        );
    }

    #[test]
    fn test_override_consulted_first() {
        let dom = parse_fragment("<b>x</b><i>y</i>");
        let keep_b =
            |node: NodeRef<'_>| (node.tag() == Some("b")).then_some(Classification::Preserve);

        let b = NodeRef::new(&dom, first(&dom, "b"));
        let i = NodeRef::new(&dom, first(&dom, "i"));

        assert_eq!(
            classify(b, Some(&keep_b), TableScaffolding::Preserve),
            Classification::Preserve
        );
        assert_eq!(
            classify(i, Some(&keep_b), TableScaffolding::Preserve),
            Classification::Unwrap
        );
    }

    #[test]
    fn test_replace_with_adapter() {
        let dom = parse_fragment("<font color=red>x</font>");
        let node = NodeRef::new(&dom, first(&dom, "font"));
        let upper = ReplaceWith(|n: NodeRef<'_>| n.tag().map(|t| t.to_uppercase()));

        assert_eq!(
            upper.classify(node),
            Some(Classification::Replace("FONT".into()))
        );
    }

    #[test]
    fn test_block_sets() {
        assert!(is_block("h3"));
        assert!(is_block("li"));
        assert!(!is_block("span"));
        assert!(!is_block("table"));
        assert!(is_table_block("td"));
        assert!(!is_table_block("tbody"));
        assert!(is_list("ol"));
    }
}
