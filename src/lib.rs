//! # destyle
//!
//! Remove formatting from selected HTML while keeping its structure.
//!
//! Inline styling (`b`, `font`, `span`, ...) is unwrapped, block boundaries
//! become `<br>` line breaks, and links, images and table scaffolding are
//! kept. Removal can act on a whole fragment or on a selection inside a
//! live document.
//!
//! ## Flattening a fragment
//!
//! ```
//! use destyle::flatten;
//!
//! assert_eq!(
//!     flatten("<p><b>Hello</b></p><p><i>World</i></p>"),
//!     "<br>Hello<br>World"
//! );
//! ```
//!
//! ## Removing formatting from a selection
//!
//! Hosts expose their tree and selection through [`HostSelection`];
//! [`Document`] is an in-memory host.
//!
//! ```
//! use destyle::{Document, RemoveFormatting};
//!
//! let mut doc = Document::parse("<ul><li>one</li><li><b>two</b></li><li>three</li></ul>");
//! doc.select_text(3, 6).unwrap();
//! RemoveFormatting::new().apply(&mut doc).unwrap();
//!
//! assert_eq!(doc.to_html(), "<ul><li>one</li></ul><br>two<ul><li>three</li></ul>");
//! ```
//!
//! ## Overriding classification
//!
//! ```
//! use destyle::{Classification, NodeRef, RemoveFormatting};
//!
//! let keep_code =
//!     |node: NodeRef<'_>| (node.tag() == Some("code")).then_some(Classification::Preserve);
//! let remover = RemoveFormatting::new().with_classifier(keep_code);
//!
//! assert_eq!(remover.flatten("<b>x</b> <code>y</code>"), "x <code>y</code>");
//! ```

pub mod classify;
pub mod document;
pub mod dom;
pub mod error;
pub mod flatten;
pub mod host;
pub mod range;
pub mod remove;
pub mod selector;
pub mod table;
pub mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use classify::{Classification, Classify, NodeRef, ReplaceWith, TableScaffolding};
pub use document::Document;
pub use error::{Error, Result, SelectionError};
pub use flatten::{FlattenedOutput, Flattener, Fragment, flatten, flatten_bytes, flatten_with};
pub use host::{HostSelection, HostTree, MarkupTree};
pub use range::{BoundaryPoint, SelectionRange, compare_points, delimit};
pub use remove::{Outcome, RemoveFormatting, selected_ranges};
pub use selector::SelectorRules;
pub use table::{is_fully_selected_table, table_ancestor_of};
