//! Error types for formatting removal.

use thiserror::Error;

/// Errors that can occur while removing formatting.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Host rejected edit: {0}")]
    Host(String),

    #[error("Offset {offset} out of range for length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },
}

/// The selection has nothing to act on.
///
/// Recoverable: [`RemoveFormatting::apply`](crate::RemoveFormatting::apply)
/// treats both cases as a no-op.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no selection range")]
    Empty,

    #[error("every selection range is collapsed")]
    Collapsed,
}

pub type Result<T> = std::result::Result<T, Error>;
