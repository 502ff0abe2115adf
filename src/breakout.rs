//! Decomposition of an icon into independently stylable pieces.
//!
//! Every drawable primitive becomes a [`Piece`]; a path with several
//! subpaths becomes one piece per subpath. Each piece carries the
//! transform, opacity and style of the groups it sat in, so it renders in
//! place even when pulled out of its original tree.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::markup::{Element, escape_attribute, parse_fragment};
use crate::paint::is_primitive;
use crate::parse::{ParseCache, ParsedDocument, parse_markup};
use crate::path::split_path_data_on_move_to;

/// One addressable fragment of a decomposed icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Piece {
    /// `piece-<n>`, numbered in document order from 1.
    pub id: String,
    /// Human-readable name for selection menus.
    pub label: String,
    /// Standalone markup with ancestor groups re-applied.
    pub markup: String,
}

/// A parsed document together with its pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakout {
    pub view_box: String,
    pub defs: String,
    pub inner: String,
    pub pieces: Vec<Piece>,
}

/// Decompositions keyed by their exact source text.
#[derive(Debug, Default)]
pub struct BreakoutCache {
    entries: HashMap<String, Arc<Breakout>>,
}

impl BreakoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached decomposition.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// Decomposition
// ============================================================================

/// Parses and decomposes `raw`, reusing the cached result for identical
/// input.
pub fn decompose(
    raw: &str,
    cache: &mut BreakoutCache,
    parse_cache: &mut ParseCache,
) -> Arc<Breakout> {
    if let Some(cached) = cache.entries.get(raw) {
        tracing::trace!(len = raw.len(), "breakout cache hit");
        return Arc::clone(cached);
    }

    let parsed = parse_markup(raw, parse_cache);
    let breakout = Arc::new(decompose_document(&parsed));
    tracing::debug!(pieces = breakout.pieces.len(), "decomposed icon");

    cache.entries.insert(raw.to_string(), Arc::clone(&breakout));
    breakout
}

/// Decomposes an already parsed document without caching.
pub fn decompose_document(parsed: &ParsedDocument) -> Breakout {
    Breakout {
        view_box: parsed.view_box.clone(),
        defs: parsed.defs.clone(),
        inner: parsed.inner.clone(),
        pieces: collect_pieces(&parsed.inner),
    }
}

fn collect_pieces(inner: &str) -> Vec<Piece> {
    let container = match parse_fragment(inner) {
        Ok(container) => container,
        Err(err) => {
            tracing::debug!(error = %err, "inner markup did not reparse; no pieces");
            return Vec::new();
        }
    };

    let mut walk = PieceWalk::default();
    let mut ancestors = Vec::new();
    for child in container.child_elements() {
        walk.visit(child, &mut ancestors);
    }
    walk.pieces
}

#[derive(Default)]
struct PieceWalk {
    pieces: Vec<Piece>,
    paths_seen: usize,
    primitives_seen: BTreeMap<String, usize>,
}

impl PieceWalk {
    fn visit<'a>(&mut self, element: &'a Element, ancestors: &mut Vec<&'a Element>) {
        if is_primitive(element) {
            self.emit(element, ancestors);
        }

        ancestors.push(element);
        for child in element.child_elements() {
            self.visit(child, ancestors);
        }
        ancestors.pop();
    }

    fn emit(&mut self, element: &Element, ancestors: &[&Element]) {
        let tag = element.local_name().to_lowercase();
        let source_id = element.attribute("id").unwrap_or_default().trim();

        if tag != "path" {
            let ordinal = self.primitives_seen.entry(tag.clone()).or_insert(0);
            *ordinal += 1;
            let label = if source_id.is_empty() {
                format!("{} {}", title_case(&tag), ordinal)
            } else {
                source_id.to_string()
            };
            self.push(label, element.clone(), ancestors);
            return;
        }

        self.paths_seen += 1;
        let d = element.attribute("d").unwrap_or_default().trim();
        let subpaths = split_path_data_on_move_to(d);

        if subpaths.len() <= 1 {
            let label = if source_id.is_empty() {
                format!("Path {}", self.paths_seen)
            } else {
                source_id.to_string()
            };
            self.push(label, element.clone(), ancestors);
            return;
        }

        for (index, subpath) in subpaths.iter().enumerate() {
            let label = if source_id.is_empty() {
                format!("Path {}.{}", self.paths_seen, index + 1)
            } else {
                format!("{source_id} {}", index + 1)
            };
            let mut clone = element.clone();
            clone.set_attribute("d", subpath.as_str());
            self.push(label, clone, ancestors);
        }
    }

    fn push(&mut self, label: String, mut element: Element, ancestors: &[&Element]) {
        let scope: Vec<(String, String)> = ancestors
            .iter()
            .rev()
            .flat_map(|ancestor| ancestor.namespace_declarations())
            .map(|(key, uri)| (key.to_string(), uri.to_string()))
            .collect();
        element.inherit_namespaces(&scope);

        self.pieces.push(Piece {
            id: format!("piece-{}", self.pieces.len() + 1),
            label,
            markup: wrap_with_ancestor_context(element.to_markup(), ancestors),
        });
    }
}

fn title_case(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Ancestor context
// ============================================================================

/// Wraps `markup` in one `<g>` per ancestor that carries a `transform`,
/// `opacity` or `style`, stopping at the nearest `<svg>` ancestor.
///
/// `ancestors` runs from the outermost to the innermost (the direct parent).
/// The innermost ancestor's group directly encloses `markup`, so the
/// composed transform matches the original tree.
pub fn wrap_with_ancestor_context(markup: String, ancestors: &[&Element]) -> String {
    let mut wrappers = Vec::new();
    for ancestor in ancestors.iter().rev() {
        if ancestor.local_name() == "svg" {
            break;
        }

        let attributes: Vec<String> = ["transform", "opacity", "style"]
            .into_iter()
            .filter_map(|name| {
                let value = ancestor.attribute(name).filter(|value| !value.is_empty())?;
                Some(format!(r#"{name}="{}""#, escape_attribute(value)))
            })
            .collect();

        if !attributes.is_empty() {
            wrappers.push(format!("<g {}>", attributes.join(" ")));
        }
    }

    wrappers
        .into_iter()
        .fold(markup, |wrapped, open| format!("{open}{wrapped}</g>"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64"><defs><linearGradient id="g1"><stop offset="0%" stop-color="#111"/></linearGradient></defs><g transform="translate(2 4)" opacity="0.5"><path id="snake" fill="#000" d="M0 0L10 10Z M20 20L30 30Z" /><path id="wing" fill="#000" d="M40 40L45 45Z" /></g><circle cx="10" cy="10" r="6" /><rect id="box" x="1" y="1" width="8" height="8" /></svg>"##;

    fn decompose_fresh(raw: &str) -> Arc<Breakout> {
        decompose(raw, &mut BreakoutCache::new(), &mut ParseCache::new())
    }

    #[test]
    fn labels_pieces_and_keeps_defs() {
        let breakout = decompose_fresh(ICON);

        assert_eq!(breakout.view_box, "0 0 64 64");
        assert!(breakout.defs.contains(r#"<linearGradient id="g1""#));
        assert!(!breakout.defs.contains("<defs"));

        let labels: Vec<&str> = breakout.pieces.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["snake 1", "snake 2", "wing", "Circle 1", "box"]);

        let ids: Vec<&str> = breakout.pieces.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["piece-1", "piece-2", "piece-3", "piece-4", "piece-5"]);
    }

    #[test]
    fn pieces_carry_ancestor_context() {
        let breakout = decompose_fresh(ICON);
        assert_eq!(
            breakout.pieces[2].markup,
            r##"<g transform="translate(2 4)" opacity="0.5"><path id="wing" fill="#000" d="M40 40L45 45Z"/></g>"##
        );
        assert_eq!(
            breakout.pieces[0].markup,
            r##"<g transform="translate(2 4)" opacity="0.5"><path id="snake" fill="#000" d="M0 0L10 10Z"/></g>"##
        );
        assert_eq!(breakout.pieces[3].markup, r#"<circle cx="10" cy="10" r="6"/>"#);
    }

    #[test]
    fn cache_returns_same_instance() {
        let raw = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M1 1L2 2Z" /></svg>"#;
        let mut cache = BreakoutCache::new();
        let mut parse_cache = ParseCache::new();

        let first = decompose(raw, &mut cache, &mut parse_cache);
        let second = decompose(raw, &mut cache, &mut parse_cache);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.defs, "");
        assert_eq!(first.pieces.len(), 1);
        assert_eq!(first.pieces[0].label, "Path 1");
    }

    #[test]
    fn anonymous_paths_use_ordinals() {
        let breakout = decompose_fresh(
            r#"<svg><path d="M0 0h1"/><path d="M0 0h1M5 5h1"/><ellipse/><ellipse/><line/></svg>"#,
        );
        let labels: Vec<&str> = breakout.pieces.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Path 1", "Path 2.1", "Path 2.2", "Ellipse 1", "Ellipse 2", "Line 1"]
        );
        assert_eq!(breakout.pieces[2].markup, r#"<path d="M5 5h1"/>"#);
    }

    #[test]
    fn nested_wrappers_keep_tree_order() {
        let breakout = decompose_fresh(
            r#"<svg><g transform="scale(2)"><g style="mix-blend-mode:multiply"><g id="plain"><rect/></g></g></g></svg>"#,
        );
        assert_eq!(
            breakout.pieces[0].markup,
            r#"<g transform="scale(2)"><g style="mix-blend-mode:multiply"><rect/></g></g>"#
        );
    }

    #[test]
    fn wrapping_stops_at_nested_svg() {
        let breakout = decompose_fresh(
            r#"<svg><g opacity="0.3"><svg><g transform="rotate(9)"><circle/></g></svg></g></svg>"#,
        );
        assert_eq!(
            breakout.pieces[0].markup,
            r#"<g transform="rotate(9)"><circle/></g>"#
        );
    }

    #[test]
    fn pieces_resolve_prefixes_on_their_own() {
        let breakout = decompose_fresh(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:ink="urn:ink"><g><path ink:label="a" d="M0 0"/></g></svg>"##,
        );
        assert_eq!(
            breakout.pieces[0].markup,
            r#"<path ink:label="a" d="M0 0" xmlns:ink="urn:ink"/>"#
        );
    }

    #[test]
    fn unparsable_source_has_no_pieces() {
        let breakout = decompose_fresh("<svg");
        assert!(breakout.pieces.is_empty());
        assert_eq!(breakout.view_box, "0 0 512 512");
    }

    #[test]
    fn wrapper_values_are_escaped() {
        let group = Element {
            name: "g".to_string(),
            attributes: vec![("style".to_string(), r#"font-family:"A""#.to_string())],
            children: Vec::new(),
        };
        assert_eq!(
            wrap_with_ancestor_context("<rect/>".to_string(), &[&group]),
            r#"<g style="font-family:&quot;A&quot;"><rect/></g>"#
        );
    }

    #[test]
    fn title_case_lowers_the_rest() {
        assert_eq!(title_case("polyline"), "Polyline");
        assert_eq!(title_case("RECT"), "Rect");
        assert_eq!(title_case(""), "");
    }
}
