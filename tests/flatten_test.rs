//! Flattening properties over generated markup.

use destyle::{Classification, NodeRef, ReplaceWith, flatten, flatten_bytes, flatten_with};
use proptest::prelude::*;

/// Nested markup from inline and block elements, text and line breaks.
fn markup() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[a-z ]{0,6}",
        Just("<br>".to_string()),
        Just("a\nb".to_string()),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            prop::sample::select(vec!["b", "i", "u", "span", "font", "div", "p", "h2"]),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(tag, children)| format!("<{tag}>{}</{tag}>", children.concat()))
    })
}

proptest! {
    #[test]
    fn prop_flatten_is_idempotent(html in markup()) {
        let once = flatten(&html);
        prop_assert_eq!(flatten(&once), once);
    }

    #[test]
    fn prop_output_has_only_breaks(html in markup()) {
        let out = flatten(&html);
        let without_breaks = out.replace("<br>", "");
        prop_assert!(!without_breaks.contains('<'));
        prop_assert!(!out.contains("&nbsp;"));
    }

    #[test]
    fn prop_links_survive_verbatim(
        wrappers in prop::collection::vec(
            prop::sample::select(vec!["b", "i", "span", "div", "p"]),
            0..4,
        ),
        text in "[a-z]{1,8}",
    ) {
        let link = format!(r#"<a href="/go?a=1&amp;b=2" class="x"><b>{text}</b></a>"#);
        let mut html = link.clone();
        for tag in &wrappers {
            html = format!("<{tag}>{html}</{tag}>");
        }
        prop_assert!(flatten(&html).contains(&link));
    }
}

#[test]
fn test_image_border_dropped_unless_zero() {
    assert_eq!(
        flatten(r#"<span><img src="x.png" border="1"></span>"#),
        r#"<img src="x.png">"#
    );
    assert_eq!(
        flatten(r#"<img border="0" src="x.png">"#),
        r#"<img border="0" src="x.png">"#
    );
}

#[test]
fn test_replacement_markup_is_literal() {
    let swap = ReplaceWith(|node: NodeRef<'_>| {
        (node.tag() == Some("hr")).then(|| "<em>$&amp;</em>".to_string())
    });
    assert_eq!(flatten_with("a<hr>b", &swap), "a<em>$&amp;</em>b");
}

#[test]
fn test_override_consulted_before_default() {
    let drop_links =
        |node: NodeRef<'_>| (node.tag() == Some("a")).then_some(Classification::Drop);
    assert_eq!(
        flatten_with(r#"x<a href="/y">y</a>z"#, &drop_links),
        "xz"
    );
}

#[test]
fn test_flatten_bytes_with_meta_charset() {
    let html = b"<html><head><meta charset=\"windows-1252\"></head>\
                 <body><b>na\xefve</b></body></html>";
    assert_eq!(flatten_bytes(html), "na\u{ef}ve");
}
