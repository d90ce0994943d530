//! CSS-selector classification rules.
//!
//! A ready-made [`Classify`] override: each rule pairs a selector list with a
//! classification, and the first rule whose selectors match an element wins.
//!
//! ```
//! use destyle::{Classification, SelectorRules, flatten_with};
//!
//! let rules = SelectorRules::new()
//!     .rule("span.keep, b", Classification::Preserve)
//!     .unwrap()
//!     .rule("font[color]", Classification::Drop)
//!     .unwrap();
//!
//! assert_eq!(
//!     flatten_with(r#"<b>a</b><font color="red">b</font><span class="keep">c</span>"#, &rules),
//!     r#"<b>a</b><span class="keep">c</span>"#
//! );
//! ```

use cssparser::{Parser, ParserInput};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::parser::Selector;

use crate::classify::{Classification, Classify, NodeRef};
use crate::dom::DestyleSelectors;
use crate::error::{Error, Result};

struct Rule {
    selectors: Vec<Selector<DestyleSelectors>>,
    class: Classification,
}

/// Ordered selector rules, first match wins.
#[derive(Default)]
pub struct SelectorRules {
    rules: Vec<Rule>,
}

impl SelectorRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop elements that carry no readable content: scripts, styles,
    /// templates and `noscript` fallbacks.
    pub fn non_content() -> Self {
        Self {
            rules: vec![Rule {
                selectors: parse_selector_list("script, style, template, noscript")
                    .unwrap_or_default(),
                class: Classification::Drop,
            }],
        }
    }

    /// Add a rule. `selectors` is a comma-separated selector list.
    pub fn rule(mut self, selectors: &str, class: Classification) -> Result<Self> {
        let selectors = parse_selector_list(selectors)?;
        self.rules.push(Rule { selectors, class });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Classify for SelectorRules {
    fn classify(&self, node: NodeRef<'_>) -> Option<Classification> {
        let elem = node.element()?;
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );

        self.rules
            .iter()
            .find(|rule| {
                rule.selectors.iter().any(|selector| {
                    selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
                })
            })
            .map(|rule| rule.class.clone())
    }
}

/// Parse a comma-separated list of selectors.
fn parse_selector_list(input: &str) -> Result<Vec<Selector<DestyleSelectors>>> {
    let mut parser_input = ParserInput::new(input);
    let mut parser = Parser::new(&mut parser_input);
    let selectors = selectors::parser::SelectorList::parse(
        &DestyleSelectors,
        &mut parser,
        selectors::parser::ParseRelative::No,
    )
    .map_err(|e| Error::Selector(format!("{input:?}: {:?}", e.kind)))?;

    Ok(selectors.slice().to_vec())
}
