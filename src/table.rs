//! Table-ancestor detection and whole-structure selection tests.

use std::cmp::Ordering;

use crate::host::MarkupTree;
use crate::range::{BoundaryPoint, SelectionRange, compare_points};
use crate::util::{char_len, is_html_whitespace, is_whitespace_only};

/// Nearest `table` element at or above `node`, not looking past the root.
pub fn table_ancestor_of<T: MarkupTree>(tree: &T, node: T::Node) -> Option<T::Node> {
    let root = tree.root();
    let mut current = node;
    loop {
        if tree.tag_of(current) == Some("table") {
            return Some(current);
        }
        if current == root {
            return None;
        }
        current = tree.parent_of(current)?;
    }
}

/// Every `table` element between `node` (inclusive) and `scope`
/// (exclusive), innermost first.
pub fn table_ancestors_within<T: MarkupTree>(
    tree: &T,
    node: T::Node,
    scope: T::Node,
) -> Vec<T::Node> {
    let mut tables = Vec::new();
    let mut current = Some(node);
    while let Some(n) = current {
        if n == scope {
            break;
        }
        if tree.tag_of(n) == Some("table") {
            tables.push(n);
        }
        current = tree.parent_of(n);
    }
    tables
}

/// Whether `range` covers all of `table`'s content.
pub fn is_fully_selected_table<T: MarkupTree>(
    tree: &T,
    table: T::Node,
    range: &SelectionRange<T::Node>,
) -> bool {
    is_fully_selected(tree, table, range)
}

/// Whether `range` starts at or before the first content of `node` and ends
/// at or after its last content. Whitespace-only text does not count as
/// content, so a range need not reach formatting whitespace between rows.
pub fn is_fully_selected<T: MarkupTree>(
    tree: &T,
    node: T::Node,
    range: &SelectionRange<T::Node>,
) -> bool {
    let first = first_content_position(tree, node);
    let last = last_content_position(tree, node);
    compare_points(tree, range.start, first) != Ordering::Greater
        && compare_points(tree, range.end, last) != Ordering::Less
}

/// The point right before the first content inside `node`.
pub fn first_content_position<T: MarkupTree>(tree: &T, node: T::Node) -> BoundaryPoint<T::Node> {
    let mut current = node;
    loop {
        if let Some(text) = tree.text_of(current) {
            let leading = text.chars().take_while(|&c| is_html_whitespace(c)).count();
            return BoundaryPoint::new(current, leading);
        }
        let next = tree
            .children_of(current)
            .into_iter()
            .find(|&child| has_content(tree, child));
        match next {
            Some(child) if tree.is_text(child) || tree.child_count(child) > 0 => current = child,
            Some(child) => {
                return BoundaryPoint::before(tree, child)
                    .unwrap_or(BoundaryPoint::start_of(current));
            }
            None => return BoundaryPoint::start_of(current),
        }
    }
}

/// The point right after the last content inside `node`.
pub fn last_content_position<T: MarkupTree>(tree: &T, node: T::Node) -> BoundaryPoint<T::Node> {
    let mut current = node;
    loop {
        if let Some(text) = tree.text_of(current) {
            let trailing = text
                .chars()
                .rev()
                .take_while(|&c| is_html_whitespace(c))
                .count();
            return BoundaryPoint::new(current, char_len(text) - trailing);
        }
        let next = tree
            .children_of(current)
            .into_iter()
            .rev()
            .find(|&child| has_content(tree, child));
        match next {
            Some(child) if tree.is_text(child) || tree.child_count(child) > 0 => current = child,
            Some(child) => {
                return BoundaryPoint::after(tree, child)
                    .unwrap_or(BoundaryPoint::end_of(tree, current));
            }
            None => return BoundaryPoint::end_of(tree, current),
        }
    }
}

/// Text that is not whitespace-only, or any element.
fn has_content<T: MarkupTree>(tree: &T, node: T::Node) -> bool {
    match tree.text_of(node) {
        Some(text) => !is_whitespace_only(text),
        None => tree.tag_of(node).is_some(),
    }
}

/// The `td`/`th` cells belonging to `table` itself, in document order.
///
/// Cells of nested tables are not included.
pub fn cells_of<T: MarkupTree>(tree: &T, table: T::Node) -> Vec<T::Node> {
    let mut cells = Vec::new();
    for child in tree.children_of(table) {
        match tree.tag_of(child) {
            Some("tr") => collect_row(tree, child, &mut cells),
            Some("thead" | "tbody" | "tfoot") => {
                for row in tree.children_of(child) {
                    if tree.tag_of(row) == Some("tr") {
                        collect_row(tree, row, &mut cells);
                    }
                }
            }
            _ => {}
        }
    }
    cells
}

fn collect_row<T: MarkupTree>(tree: &T, row: T::Node, cells: &mut Vec<T::Node>) {
    cells.extend(
        tree.children_of(row)
            .into_iter()
            .filter(|&c| matches!(tree.tag_of(c), Some("td" | "th"))),
    );
}
