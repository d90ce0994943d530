//! Selection-aware removal against the in-memory host.
//!
//! Covers list splitting, table handling, override precedence and selection
//! bookkeeping through the public API only.

use destyle::{
    BoundaryPoint, Classification, Document, MarkupTree, NodeRef, Outcome, RemoveFormatting,
    SelectionError, SelectionRange, SelectorRules, delimit, is_fully_selected_table,
    table_ancestor_of,
};

fn remove(html: &str, start: usize, end: usize) -> String {
    let mut doc = Document::parse(html);
    doc.select_text(start, end).expect("valid offsets");
    RemoveFormatting::new()
        .apply(&mut doc)
        .expect("removal succeeds");
    doc.to_html()
}

// ============================================================================
// Lists
// ============================================================================

#[test]
fn test_middle_list_item_splits_list() {
    assert_eq!(
        remove("<ul><li>one</li><li>two</li><li>three</li></ul>", 3, 6),
        "<ul><li>one</li></ul><br>two<ul><li>three</li></ul>"
    );
}

#[test]
fn test_whole_list_flattened() {
    assert_eq!(
        remove("<ul><li>one</li><li>two</li><li>three</li></ul>", 0, 11),
        "<br>one<br>two<br>three"
    );
}

#[test]
fn test_leading_items_keep_rest_of_list() {
    assert_eq!(
        remove("<ol><li>one</li><li>two</li><li>three</li></ol>", 0, 6),
        r#"<br>one<br>two<ol start="3"><li>three</li></ol>"#
    );
}

#[test]
fn test_partial_item_taken_whole() {
    // Start inside the first item, end inside the second: both items go.
    assert_eq!(
        remove("<ul><li>one</li><li>two</li><li>three</li></ul>", 1, 5),
        "<br>one<br>two<ul><li>three</li></ul>"
    );
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn test_fully_selected_table_flattened() {
    assert_eq!(
        remove("foo<table><tr><td>bar</td></tr></table>baz", 0, 9),
        "foo<br>bar<br>baz"
    );
}

#[test]
fn test_partially_selected_table_keeps_structure() {
    assert_eq!(
        remove(
            "<table><tr><td>one</td><td><b>two</b></td></tr></table>",
            3,
            6
        ),
        "<table><tbody><tr><td>one</td><td>two</td></tr></tbody></table>"
    );
}

#[test]
fn test_range_across_two_cells() {
    let mut doc = Document::parse("<table><tr><td><b>one</b></td><td><i>two</i></td></tr></table>");
    doc.select_text(1, 5).unwrap();

    let outcome = RemoveFormatting::new().apply(&mut doc).unwrap();

    assert!(matches!(outcome, Outcome::Replaced { segments: 2, .. }));
    assert_eq!(
        doc.to_html(),
        "<table><tbody><tr><td><b>o</b>ne</td><td>tw<i>o</i></td></tr></tbody></table>"
    );
}

#[test]
fn test_selection_from_text_into_table() {
    assert_eq!(
        remove(
            "<b>before</b><table><tr><td><i>a</i></td><td><i>b</i></td></tr></table>",
            0,
            7
        ),
        "before<table><tbody><tr><td>a</td><td><i>b</i></td></tr></tbody></table>"
    );
}

#[test]
fn test_selection_from_full_table_into_partial_table() {
    let mut doc = Document::parse(
        "<table><tr><td><i>a</i></td></tr></table>mid\
         <table><tr><td><b>b</b></td><td><b>c</b></td></tr></table>",
    );
    doc.select_text(0, 5).unwrap();

    let outcome = RemoveFormatting::new().apply(&mut doc).unwrap();

    assert!(matches!(outcome, Outcome::Replaced { segments: 2, .. }));
    assert_eq!(
        doc.to_html(),
        "<br>a<br>mid<table><tbody><tr><td>b</td><td><b>c</b></td></tr></tbody></table>"
    );
}

#[test]
fn test_selection_from_partial_table_into_full_table() {
    let mut doc = Document::parse(
        "<table><tr><td><b>a</b></td><td><b>b</b></td></tr></table>mid\
         <table><tr><td><i>c</i></td></tr></table>",
    );
    doc.select_text(1, 6).unwrap();

    let outcome = RemoveFormatting::new().apply(&mut doc).unwrap();

    assert!(matches!(outcome, Outcome::Replaced { segments: 2, .. }));
    assert_eq!(
        doc.to_html(),
        "<table><tbody><tr><td><b>a</b></td><td>b</td></tr></tbody></table>mid<br>c"
    );
}

#[test]
fn test_table_detection_through_public_api() {
    let doc = Document::parse("<table><tr><td><b>x</b></td></tr></table>");
    let dom = doc.dom();
    let b = dom.find_by_tag("b").unwrap();
    let table = dom.find_by_tag("table").unwrap();

    assert_eq!(table_ancestor_of(dom, b), Some(table));
    assert_eq!(table_ancestor_of(dom, table), Some(table));

    let all = doc.range_for_text(0, 1).unwrap();
    assert!(is_fully_selected_table(dom, table, &all));
}

// ============================================================================
// Classification overrides
// ============================================================================

#[test]
fn test_override_wins_over_default_policy() {
    let keep_bold =
        |node: NodeRef<'_>| (node.tag() == Some("b")).then_some(Classification::Preserve);
    let mut doc = Document::parse("<p><b>x</b><i>y</i></p>");
    doc.select_text(0, 2).unwrap();

    RemoveFormatting::new()
        .with_classifier(keep_bold)
        .apply(&mut doc)
        .unwrap();

    assert_eq!(doc.to_html(), "<br><b>x</b>y");
}

#[test]
fn test_selector_rules_as_override() {
    let rules = SelectorRules::new()
        .rule("span.note", Classification::Drop)
        .unwrap();
    let mut doc = Document::parse(r#"<p><b>keep</b><span class="note">drop</span></p>"#);
    doc.select_text(0, 8).unwrap();

    RemoveFormatting::new()
        .with_classifier(rules)
        .apply(&mut doc)
        .unwrap();

    assert_eq!(doc.to_html(), "<br>keep");
}

// ============================================================================
// Selection bookkeeping
// ============================================================================

#[test]
fn test_overlapping_ranges_union() {
    let doc = Document::parse("<b>abcd</b>");
    let a = doc.range_for_text(1, 2).unwrap();
    let b = doc.range_for_text(3, 4).unwrap();

    assert_eq!(
        delimit(doc.dom(), &a, &b),
        doc.range_for_text(1, 4).unwrap()
    );
    assert_eq!(
        delimit(doc.dom(), &b, &a),
        doc.range_for_text(1, 4).unwrap()
    );
}

#[test]
fn test_no_selection_is_noop() {
    let mut doc = Document::parse("<b>abc</b>");

    let outcome = RemoveFormatting::new().apply(&mut doc).unwrap();

    assert_eq!(outcome, Outcome::Unchanged(SelectionError::Empty));
    assert_eq!(doc.to_html(), "<b>abc</b>");
}

#[test]
fn test_collapsed_selection_is_noop() {
    let mut doc = Document::parse("<b>abc</b>");
    doc.select_text(2, 2).unwrap();

    let outcome = RemoveFormatting::new().apply(&mut doc).unwrap();

    assert_eq!(outcome, Outcome::Unchanged(SelectionError::Collapsed));
    assert_eq!(doc.to_html(), "<b>abc</b>");
}

#[test]
fn test_result_is_selected() {
    let mut doc = Document::parse("<p>x<b>abc</b>y</p>");
    doc.select_text(1, 4).unwrap();

    let outcome = RemoveFormatting::new().apply(&mut doc).unwrap();

    let Outcome::Replaced { selection, .. } = outcome else {
        panic!("expected a replacement");
    };
    let p = doc.dom().find_by_tag("p").unwrap();
    assert_eq!(
        selection,
        SelectionRange::new(BoundaryPoint::new(p, 1), BoundaryPoint::new(p, 2))
    );
    assert_eq!(doc.selection(), &[selection]);
    assert_eq!(doc.dom().child_count(p), 3);
}

#[test]
fn test_repeat_removal_is_stable() {
    let html = "<div><b>a</b> <a href=\"/x\"><i>l</i></a></div><p>b</p>";
    let mut doc = Document::parse(html);
    let len = doc.text().chars().count();

    doc.select_text(0, len).unwrap();
    RemoveFormatting::new().apply(&mut doc).unwrap();
    let once = doc.to_html();

    let mut again = Document::parse(&once);
    let len = again.text().chars().count();
    again.select_text(0, len).unwrap();
    RemoveFormatting::new().apply(&mut again).unwrap();

    assert_eq!(once, "<br>a <a href=\"/x\"><i>l</i></a><br>b");
    assert_eq!(again.to_html(), once);
}
