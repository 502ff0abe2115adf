//! Error types for markup handling.

use thiserror::Error;

/// Errors raised while building an element tree from raw markup.
///
/// The public engine operations never surface these; they degrade to empty
/// or pass-through results instead. The tree builders in [`crate::markup`]
/// return them so callers that need to know can tell the cases apart.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// The input is not well-formed XML.
    #[error("failed to parse markup: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The input parsed, but no `<svg>` element exists anywhere in it.
    #[error("markup has no <svg> root element")]
    MissingRoot,
}
