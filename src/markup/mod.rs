//! Markup tree and inline-style utilities shared by every engine stage.

mod style;
mod tree;

pub use style::{remove_style_property, set_style_property, style_property};
pub use tree::{
    Element, Node, SVG_NS, escape_attribute, parse_document, parse_fragment,
};
