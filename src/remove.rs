//! Selection-aware formatting removal.
//!
//! [`RemoveFormatting::apply`] reads the host's selection, cuts every range
//! into segments that respect table and list structure, flattens each
//! segment's content and splices the result back in place of the segment.

use std::cmp::Ordering;

use tracing::debug;

use crate::classify::{Classify, TableScaffolding, is_block, is_list, is_table_scaffolding};
use crate::document::next_is_inline;
use crate::dom::{Dom, inner_html};
use crate::error::{Error, Result, SelectionError};
use crate::flatten::{Flattener, Fragment};
use crate::host::{HostSelection, HostTree, MarkupTree};
use crate::range::{
    BoundaryPoint, SelectionRange, clone_contents, common_ancestor, compare_points, delimit,
    max_point, min_point,
};
use crate::table::{cells_of, is_fully_selected_table, table_ancestors_within};

/// Result of [`RemoveFormatting::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<N> {
    /// The selection had nothing to act on; the host was not touched.
    Unchanged(SelectionError),
    /// Content was replaced.
    Replaced {
        /// Number of spans replaced in the host.
        segments: usize,
        /// Range covering everything that was replaced, now selected.
        selection: SelectionRange<N>,
    },
}

/// Formatting removal configuration.
///
/// Holds no per-call state; one value may serve any number of invocations.
pub struct RemoveFormatting {
    classifier: Option<Box<dyn Classify>>,
    full_tables: TableScaffolding,
}

impl Default for RemoveFormatting {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoveFormatting {
    pub fn new() -> Self {
        Self {
            classifier: None,
            full_tables: TableScaffolding::Remove,
        }
    }

    /// Consult `classifier` before the default policy for every node.
    pub fn with_classifier(mut self, classifier: impl Classify + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// How tables inside the selection that are selected in full are
    /// handled. Scaffolding is removed by default.
    pub fn with_table_scaffolding(mut self, tables: TableScaffolding) -> Self {
        self.full_tables = tables;
        self
    }

    fn flattener(&self, tables: TableScaffolding) -> Flattener<'_> {
        let flattener = Flattener::new().with_table_scaffolding(tables);
        match &self.classifier {
            Some(classifier) => flattener.with_classifier(classifier.as_ref()),
            None => flattener,
        }
    }

    /// Flatten a markup fragment with this configuration's classifier.
    /// Tables keep their scaffolding.
    pub fn flatten(&self, markup: &str) -> String {
        self.flattener(TableScaffolding::Preserve).flatten(markup)
    }

    /// Remove formatting from the host's current selection and select the
    /// result.
    ///
    /// An empty or collapsed selection is a no-op reported as
    /// [`Outcome::Unchanged`].
    ///
    /// # Panics
    ///
    /// Panics if the selection's ranges are not all in the host's tree.
    pub fn apply<H: HostSelection>(&self, host: &mut H) -> Result<Outcome<H::Node>> {
        let ranges = match selected_ranges(host) {
            Ok(ranges) => ranges,
            Err(Error::Selection(reason)) => {
                debug!(%reason, "nothing to remove formatting from");
                return Ok(Outcome::Unchanged(reason));
            }
            Err(e) => return Err(e),
        };
        let outcome = self.remove_ranges(host, &ranges)?;
        if let Outcome::Replaced { selection, .. } = &outcome {
            host.set_selection(*selection);
        }
        Ok(outcome)
    }

    /// Remove formatting from explicit ranges, which must be in document
    /// order and must not overlap.
    pub fn remove_ranges<H: HostTree>(
        &self,
        host: &mut H,
        ranges: &[SelectionRange<H::Node>],
    ) -> Result<Outcome<H::Node>> {
        let mut segments = Vec::new();
        for range in ranges.iter().filter(|r| !r.is_collapsed()) {
            segment(host, *range, host.root(), &mut segments);
        }
        if segments.is_empty() {
            return Ok(Outcome::Unchanged(SelectionError::Collapsed));
        }
        debug!(count = segments.len(), "selection segmented");

        // Last segment first: an edit never moves anything before it, so
        // the segments still to come keep valid boundary points.
        let mut last_end = None;
        let mut next_start: Option<BoundaryPoint<H::Node>> = None;
        for (i, segment) in segments.iter().enumerate().rev() {
            let floor = i.checked_sub(1).map(|prev| segments[prev].range.end);
            let plan = self.plan(host, segment, floor, next_start);
            let span = host.replace_range(&plan.target, &plan.markup)?;
            if last_end.is_none() {
                last_end = Some(Anchor::after(host, span.end));
            }
            next_start = Some(span.start);
        }

        match (next_start, last_end) {
            (Some(start), Some(end)) => {
                let end = end.resolve(host);
                let selection = delimit(
                    host,
                    &SelectionRange::collapsed(start),
                    &SelectionRange::collapsed(end),
                );
                Ok(Outcome::Replaced {
                    segments: segments.len(),
                    selection,
                })
            }
            _ => Ok(Outcome::Unchanged(SelectionError::Collapsed)),
        }
    }

    /// Work out what replaces one segment. The target never reaches back
    /// past `floor`, the end of the previous segment, nor forward past
    /// `ceiling`, the start of content already replaced.
    fn plan<H: HostTree>(
        &self,
        host: &H,
        segment: &Segment<H::Node>,
        floor: Option<BoundaryPoint<H::Node>>,
        ceiling: Option<BoundaryPoint<H::Node>>,
    ) -> Plan<H::Node> {
        let scope = segment.scope;
        let range = snap_out_of_links(host, segment.range, scope);
        let range = snap_to_list_items(host, range, scope);
        let mut range = expand(host, range, scope);
        if let Some(floor) = floor {
            range.start = max_point(host, range.start, floor);
        }
        if let Some(ceiling) = ceiling {
            range.end = min_point(host, range.end, ceiling);
        }

        // Inline formatting and lists around the range are split: their
        // part before the range stays in place, the part after it is
        // rebuilt behind the flattened content.
        let (target, suffix) = match splittable_ancestor(host, &range, scope)
            .and_then(|outer| Some((outer, BoundaryPoint::after(host, outer)?)))
        {
            Some((outer, after)) => {
                if is_list(host.tag_of(outer).unwrap_or("")) {
                    debug!(?outer, "splitting list around selection");
                }
                let after = match ceiling {
                    Some(ceiling) => min_point(host, after, ceiling),
                    None => after,
                };
                let suffix = clone_nonempty(host, &SelectionRange::new(range.end, after))
                    .map(|mut dom| {
                        continue_numbering(host, range.end, outer, &mut dom);
                        dom
                    });
                (SelectionRange::new(range.start, after), suffix)
            }
            None => (range, None),
        };

        let content = clone_contents(host, &range);
        let mut output = self
            .flattener(self.full_tables)
            .flatten_dom(&content, content.root());

        if target.start == BoundaryPoint::start_of(scope)
            && matches!(host.tag_of(scope), Some("td" | "th"))
        {
            output.strip_leading_break();
        }

        let mut markup = output.to_markup();
        let ends_in_content = output
            .fragments()
            .last()
            .is_some_and(|fragment| *fragment != Fragment::Break);
        if output.has_trailing_break() && ends_in_content {
            let continues = match &suffix {
                Some(dom) => next_is_inline(dom, BoundaryPoint::start_of(dom.root()), dom.root()),
                None => next_is_inline(host, target.end, scope),
            };
            if continues {
                markup.push_str("<br>");
            }
        }
        if let Some(dom) = &suffix {
            markup.push_str(&inner_html(dom, dom.root()));
        }

        Plan { target, markup }
    }
}

/// The host's selection: non-collapsed ranges in document order, with
/// overlapping or touching ranges merged.
pub fn selected_ranges<H: HostSelection>(host: &H) -> Result<Vec<SelectionRange<H::Node>>> {
    let mut ranges = host.current_ranges();
    if ranges.is_empty() {
        return Err(SelectionError::Empty.into());
    }
    ranges.retain(|r| !r.is_collapsed());
    if ranges.is_empty() {
        return Err(SelectionError::Collapsed.into());
    }
    ranges.sort_by(|a, b| compare_points(host, a.start, b.start));

    let mut merged: Vec<SelectionRange<H::Node>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if compare_points(host, range.start, last.end) != Ordering::Greater => {
                *last = delimit(host, last, &range);
            }
            _ => merged.push(range),
        }
    }
    Ok(merged)
}

/// A piece of a selection flattened on its own. `scope` is the document
/// root or the table cell the piece must stay inside.
#[derive(Debug, Clone, Copy)]
struct Segment<N> {
    range: SelectionRange<N>,
    scope: N,
}

/// A host span and the markup that replaces it.
struct Plan<N> {
    target: SelectionRange<N>,
    markup: String,
}

/// A span end that survives edits made before it.
enum Anchor<N> {
    Before(N),
    End(N),
}

impl<N: Copy + Eq> Anchor<N> {
    fn after<T: MarkupTree<Node = N>>(tree: &T, point: BoundaryPoint<N>) -> Self {
        match tree.child_at(point.node, point.offset) {
            Some(child) if !tree.is_text(point.node) => Anchor::Before(child),
            _ => Anchor::End(point.node),
        }
    }

    fn resolve<T: MarkupTree<Node = N>>(&self, tree: &T) -> BoundaryPoint<N> {
        match *self {
            Anchor::Before(node) => BoundaryPoint::before(tree, node)
                .unwrap_or_else(|| BoundaryPoint::start_of(node)),
            Anchor::End(node) => BoundaryPoint::end_of(tree, node),
        }
    }
}

/// Cut `range` into segments. A table that holds a boundary of the range
/// but is not fully selected keeps its scaffolding: each of its cells that
/// the range reaches becomes a segment of its own.
fn segment<T: MarkupTree>(
    tree: &T,
    range: SelectionRange<T::Node>,
    scope: T::Node,
    out: &mut Vec<Segment<T::Node>>,
) {
    let Some(table) = partial_table(tree, &range, scope) else {
        out.push(Segment { range, scope });
        return;
    };
    debug!(?table, "partially selected table keeps its scaffolding");

    let (Some(before), Some(after)) = (
        BoundaryPoint::before(tree, table),
        BoundaryPoint::after(tree, table),
    ) else {
        out.push(Segment { range, scope });
        return;
    };

    if compare_points(tree, range.start, before) == Ordering::Less {
        segment(tree, SelectionRange::new(range.start, before), scope, out);
    }
    for cell in cells_of(tree, table) {
        let cell_range = SelectionRange::contents_of(tree, cell);
        let start = max_point(tree, range.start, cell_range.start);
        let end = min_point(tree, range.end, cell_range.end);
        if compare_points(tree, start, end) == Ordering::Less {
            segment(tree, SelectionRange::new(start, end), cell, out);
        }
    }
    if compare_points(tree, after, range.end) == Ordering::Less {
        segment(tree, SelectionRange::new(after, range.end), scope, out);
    }
}

/// Outermost table below `scope` holding a boundary of `range` without
/// being fully selected by it.
fn partial_table<T: MarkupTree>(
    tree: &T,
    range: &SelectionRange<T::Node>,
    scope: T::Node,
) -> Option<T::Node> {
    [range.start.node, range.end.node]
        .into_iter()
        .find_map(|node| {
            table_ancestors_within(tree, node, scope)
                .into_iter()
                .rev()
                .find(|&table| !is_fully_selected_table(tree, table, range))
        })
}

/// Outermost element of `tag` at or above `node`, below `scope`.
fn outermost<T: MarkupTree>(
    tree: &T,
    node: T::Node,
    scope: T::Node,
    matches: impl Fn(T::Node) -> bool,
) -> Option<T::Node> {
    let mut found = None;
    let mut current = Some(node);
    while let Some(n) = current {
        if n == scope {
            break;
        }
        if matches(n) {
            found = Some(n);
        }
        current = tree.parent_of(n);
    }
    found
}

/// Links are never split: a boundary inside one moves to its edge, so the
/// whole link is flattened and kept verbatim.
fn snap_out_of_links<T: MarkupTree>(
    tree: &T,
    range: SelectionRange<T::Node>,
    scope: T::Node,
) -> SelectionRange<T::Node> {
    let is_link = |n: T::Node| tree.tag_of(n) == Some("a");
    let mut snapped = range;
    if let Some(link) = outermost(tree, range.start.node, scope, is_link)
        && let Some(point) = BoundaryPoint::before(tree, link)
    {
        snapped.start = point;
    }
    if let Some(link) = outermost(tree, range.end.node, scope, is_link)
        && let Some(point) = BoundaryPoint::after(tree, link)
    {
        snapped.end = point;
    }
    snapped
}

/// A boundary inside a list item that does not also hold the other boundary
/// moves to the edge of that item.
fn snap_to_list_items<T: MarkupTree>(
    tree: &T,
    range: SelectionRange<T::Node>,
    scope: T::Node,
) -> SelectionRange<T::Node> {
    let mut snapped = range;
    let start_item = outermost(tree, range.start.node, scope, |n| {
        tree.tag_of(n) == Some("li") && !tree.is_inclusive_ancestor(n, range.end.node)
    });
    if let Some(item) = start_item {
        snapped.start = BoundaryPoint::start_of(item);
    }
    let end_item = outermost(tree, range.end.node, scope, |n| {
        tree.tag_of(n) == Some("li") && !tree.is_inclusive_ancestor(n, range.start.node)
    });
    if let Some(item) = end_item {
        snapped.end = BoundaryPoint::end_of(tree, item);
    }
    snapped
}

/// Lift boundaries that sit at the edge of their node out of it, as long as
/// the node does not also hold the other boundary, or is covered entirely.
/// Never lifts past `scope`.
fn expand<T: MarkupTree>(
    tree: &T,
    range: SelectionRange<T::Node>,
    scope: T::Node,
) -> SelectionRange<T::Node> {
    let (mut start, mut end) = (range.start, range.end);
    loop {
        let mut lifted = false;

        let covers = |node: T::Node, start: BoundaryPoint<T::Node>, end: BoundaryPoint<T::Node>| {
            start == BoundaryPoint::start_of(node) && end == BoundaryPoint::end_of(tree, node)
        };

        if start.offset == 0
            && start.node != scope
            && (!tree.is_inclusive_ancestor(start.node, end.node) || covers(start.node, start, end))
            && let Some(point) = BoundaryPoint::before(tree, start.node)
        {
            start = point;
            lifted = true;
        }
        if end.offset == tree.node_len(end.node)
            && end.node != scope
            && (!tree.is_inclusive_ancestor(end.node, start.node)
                || covers(end.node, start, end))
            && let Some(point) = BoundaryPoint::after(tree, end.node)
        {
            end = point;
            lifted = true;
        }

        if !lifted {
            return SelectionRange::new(start, end);
        }
    }
}

/// Outermost inline or list element that holds the whole range, stopping at
/// block boundaries, list items, table scaffolding and `scope`. Content is
/// flattened outside it, so it is split around the range.
fn splittable_ancestor<T: MarkupTree>(
    tree: &T,
    range: &SelectionRange<T::Node>,
    scope: T::Node,
) -> Option<T::Node> {
    let common = common_ancestor(tree, range.start.node, range.end.node)?;
    let mut found = None;
    let mut current = Some(common);
    while let Some(node) = current {
        if node == scope {
            break;
        }
        if let Some(tag) = tree.tag_of(node) {
            if is_list(tag) || !(is_block(tag) || is_table_scaffolding(tag) || tag == "a") {
                found = Some(node);
            } else {
                break;
            }
        }
        current = tree.parent_of(node);
    }
    found
}

/// Copy of `range`'s contents with emptied elements removed, or `None` when
/// nothing is left.
fn clone_nonempty<T: MarkupTree>(tree: &T, range: &SelectionRange<T::Node>) -> Option<Dom> {
    let mut dom = clone_contents(tree, range);
    let root = dom.root();
    dom.prune_empty(root);
    (dom.child_count(root) > 0).then_some(dom)
}

/// Give each ordered list rebuilt in `suffix` a `start` so its items keep
/// the numbers they had before the list was cut at `cut`.
fn continue_numbering<T: MarkupTree>(
    tree: &T,
    cut: BoundaryPoint<T::Node>,
    outer: T::Node,
    suffix: &mut Dom,
) {
    let mut path = vec![cut.node];
    while let Some(&last) = path.last()
        && last != outer
        && let Some(parent) = tree.parent_of(last)
    {
        path.push(parent);
    }
    path.reverse();

    // The copy's left edge mirrors the host path from `outer` down to the
    // cut, until an emptied level was pruned away.
    let mut copy = suffix.children(suffix.root()).next();
    for original in path {
        let Some(node) = copy else { break };
        let tag = tree.tag_of(original);
        if tag.is_none() || suffix.element_name(node).map(|n| &**n) != tag {
            break;
        }
        if tag == Some("ol") {
            let items = tree
                .children_of(original)
                .into_iter()
                .filter(|&c| tree.tag_of(c) == Some("li"))
                .count();
            let kept = suffix
                .children(node)
                .filter(|&c| suffix.element_name(c).is_some_and(|n| &**n == "li"))
                .count();
            let skipped = items.saturating_sub(kept) as i64;
            if skipped > 0 {
                let attrs = tree.attributes_of(original);
                let reversed = attrs.iter().any(|&(name, _)| name == "reversed");
                let start = attrs
                    .iter()
                    .find(|&&(name, _)| name == "start")
                    .and_then(|&(_, value)| value.trim().parse::<i64>().ok())
                    .unwrap_or(if reversed { items as i64 } else { 1 });
                let next = if reversed { start - skipped } else { start + skipped };
                debug!(?original, next, "continuing ordered list numbering");
                suffix.set_attr(node, "start", &next.to_string());
            }
        }
        copy = suffix.children(node).next();
    }
}
