//! The flattened fragment sequence and its line-break rules.

use crate::dom::escape_text;
use crate::util::is_whitespace_only;

/// One piece of flattened output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Plain text, escaped on serialization.
    Text(String),
    /// Inline markup emitted verbatim: a preserved link or image, or an
    /// override's replacement.
    Markup(String),
    /// Block-level markup emitted verbatim, such as a preserved table.
    Block(String),
    /// A line-break marker, serialized as `<br>`.
    Break,
}

/// Ordered flattened output.
///
/// Breaks requested at the start of a block are emitted immediately, even at
/// the very start of the output. Breaks owed at the end of a block stay
/// pending until more content follows, so a trailing block never leaves a
/// dangling `<br>`. Consecutive breaks collapse into one, and whitespace-only
/// text next to a break is absorbed.
#[derive(Debug, Default, Clone)]
pub struct FlattenedOutput {
    fragments: Vec<Fragment>,
    pending_break: bool,
    pending_space: Option<String>,
}

impl FlattenedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Whether a block ended last and no content has followed it yet.
    pub fn has_trailing_break(&self) -> bool {
        self.pending_break
    }

    /// The output begins with a line break.
    pub fn starts_with_break(&self) -> bool {
        matches!(self.fragments.first(), Some(Fragment::Break))
    }

    fn at_line_start(&self) -> bool {
        matches!(
            self.fragments.last(),
            Some(Fragment::Break | Fragment::Block(_))
        )
    }

    /// Settle owed breaks and stashed whitespace before new content.
    fn prepare_content(&mut self) {
        if std::mem::take(&mut self.pending_break) {
            self.pending_space = None;
            if !self.fragments.is_empty() && !self.at_line_start() {
                self.fragments.push(Fragment::Break);
            }
        }
        if let Some(space) = self.pending_space.take() {
            self.push_raw_text(&space);
        }
    }

    fn push_raw_text(&mut self, text: &str) {
        if let Some(Fragment::Text(last)) = self.fragments.last_mut() {
            last.push_str(text);
        } else {
            self.fragments.push(Fragment::Text(text.to_string()));
        }
    }

    /// Append text. Whitespace-only text is held back until it is known not
    /// to border a break.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if is_whitespace_only(text) {
            if !self.pending_break && !self.at_line_start() {
                self.pending_space
                    .get_or_insert_with(String::new)
                    .push_str(text);
            }
            return;
        }
        self.prepare_content();
        self.push_raw_text(text);
    }

    /// Append inline markup verbatim.
    pub fn push_markup(&mut self, markup: impl Into<String>) {
        let markup = markup.into();
        if markup.is_empty() {
            return;
        }
        self.prepare_content();
        self.fragments.push(Fragment::Markup(markup));
    }

    /// Append block-level markup verbatim. It stands on its own line, so
    /// owed breaks and surrounding whitespace are dropped.
    pub fn push_block(&mut self, markup: impl Into<String>) {
        let markup = markup.into();
        if markup.is_empty() {
            return;
        }
        self.pending_break = false;
        self.pending_space = None;
        self.fragments.push(Fragment::Block(markup));
    }

    /// A line break now: at the start of a block, or an explicit `<br>`.
    pub fn request_break(&mut self) {
        self.pending_space = None;
        self.pending_break = false;
        if !self.at_line_start() {
            self.fragments.push(Fragment::Break);
        }
    }

    /// A line break owed at the end of a block.
    pub fn end_block(&mut self) {
        self.pending_space = None;
        self.pending_break = true;
    }

    /// Flush whitespace still held back. An owed break stays owed, see
    /// [`has_trailing_break`](Self::has_trailing_break).
    pub fn finish(&mut self) {
        if !self.pending_break
            && let Some(space) = self.pending_space.take()
        {
            self.push_raw_text(&space);
        }
    }

    /// Remove a break at the very start.
    pub fn strip_leading_break(&mut self) {
        if self.starts_with_break() {
            self.fragments.remove(0);
        }
    }

    /// Serialize by concatenation, `<br>` for each break.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(text) => out.push_str(&escape_text(text)),
                Fragment::Markup(markup) | Fragment::Block(markup) => out.push_str(markup),
                Fragment::Break => out.push_str("<br>"),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaks_collapse() {
        let mut out = FlattenedOutput::new();
        out.request_break();
        out.request_break();
        out.push_text("a");
        out.end_block();
        out.request_break();
        out.push_text("b");

        assert_eq!(out.to_markup(), "<br>a<br>b");
    }

    #[test]
    fn test_pending_break_only_materializes_before_content() {
        let mut out = FlattenedOutput::new();
        out.push_text("a");
        out.end_block();
        out.finish();

        assert_eq!(out.to_markup(), "a");
        assert!(out.has_trailing_break());

        out.push_text("b");
        assert_eq!(out.to_markup(), "a<br>b");
        assert!(!out.has_trailing_break());
    }

    #[test]
    fn test_whitespace_next_to_breaks_absorbed() {
        let mut out = FlattenedOutput::new();
        out.push_text("a");
        out.push_text("  ");
        out.request_break();
        out.push_text("\t");
        out.push_text("b");

        assert_eq!(out.to_markup(), "a<br>b");
    }

    #[test]
    fn test_whitespace_between_inline_content_kept() {
        let mut out = FlattenedOutput::new();
        out.push_text("a");
        out.push_text(" ");
        out.push_markup("<img src=\"x\">");

        assert_eq!(out.to_markup(), "a <img src=\"x\">");
    }

    #[test]
    fn test_text_is_escaped_and_merged() {
        let mut out = FlattenedOutput::new();
        out.push_text("1 < 2");
        out.push_text(" & 3");

        assert_eq!(out.fragments().len(), 1);
        assert_eq!(out.to_markup(), "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn test_block_markup_absorbs_breaks() {
        let mut out = FlattenedOutput::new();
        out.push_text("a");
        out.end_block();
        out.push_block("<table></table>");
        out.request_break();
        out.push_text("b");

        assert_eq!(out.to_markup(), "a<table></table>b");
    }

    #[test]
    fn test_strip_leading_break() {
        let mut out = FlattenedOutput::new();
        out.request_break();
        out.push_text("x");
        out.strip_leading_break();

        assert_eq!(out.to_markup(), "x");
    }
}
