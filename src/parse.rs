//! Markup parsing into `{viewBox, defs, inner}`.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::markup::{Element, Node, parse_document};
use crate::paint::is_auto_color_fill;

/// View box used when the source declares none or cannot be parsed.
pub const DEFAULT_VIEW_BOX: &str = "0 0 512 512";

const SIZE_TOLERANCE: f64 = 0.001;

/// A source document split into its reusable definitions and its
/// renderable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// The root `viewBox` as written.
    pub view_box: String,
    /// Content of the root's `<defs>` children, without the container.
    pub defs: String,
    /// Renderable children of the root, minus `<defs>` and any full-canvas
    /// backdrop.
    pub inner: String,
}

impl ParsedDocument {
    fn empty() -> Self {
        Self {
            view_box: DEFAULT_VIEW_BOX.to_string(),
            defs: String::new(),
            inner: String::new(),
        }
    }
}

// ============================================================================
// ParseCache
// ============================================================================

/// Parsed documents keyed by their exact source text.
///
/// Unbounded; the owner decides when to [`clear`](Self::clear) it.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: HashMap<String, Arc<ParsedDocument>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached document.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses raw markup, reusing the cached result for identical input.
///
/// Never fails: markup that is not well-formed, or that contains no `<svg>`
/// element, yields the default view box with empty `defs` and `inner`.
pub fn parse_markup(raw: &str, cache: &mut ParseCache) -> Arc<ParsedDocument> {
    if let Some(cached) = cache.entries.get(raw) {
        tracing::trace!(len = raw.len(), "parse cache hit");
        return Arc::clone(cached);
    }

    let parsed = Arc::new(parse_uncached(raw));
    cache.entries.insert(raw.to_string(), Arc::clone(&parsed));
    parsed
}

fn parse_uncached(raw: &str) -> ParsedDocument {
    let root = match parse_document(raw) {
        Ok(root) => root,
        Err(err) => {
            tracing::debug!(error = %err, "falling back to an empty document");
            return ParsedDocument::empty();
        }
    };

    let view_box = root
        .attribute("viewBox")
        .unwrap_or(DEFAULT_VIEW_BOX)
        .to_string();
    let view_box_size = parse_view_box_size(&view_box);
    let scope: Vec<(String, String)> = root
        .namespace_declarations()
        .map(|(key, uri)| (key.to_string(), uri.to_string()))
        .collect();

    let mut defs = String::new();
    let mut inner = String::new();
    for child in &root.children {
        let Node::Element(element) = child else {
            child.write_markup(&mut inner);
            continue;
        };

        if element.local_name() == "defs" {
            for def in &element.children {
                write_standalone(def, &scope, &mut defs);
            }
            continue;
        }

        if view_box_size.is_some_and(|size| is_canvas_backdrop(element, size)) {
            tracing::debug!(tag = element.local_name(), "eliding full-canvas backdrop");
            continue;
        }

        write_standalone(child, &scope, &mut inner);
    }

    ParsedDocument {
        view_box,
        defs,
        inner,
    }
}

/// Serializes `node` so it keeps resolving the root's namespace prefixes
/// once detached from it.
fn write_standalone(node: &Node, scope: &[(String, String)], out: &mut String) {
    match node {
        Node::Element(element) if !scope.is_empty() => {
            let mut detached = element.clone();
            detached.inherit_namespaces(scope);
            detached.write_markup(out);
        }
        _ => node.write_markup(out),
    }
}

// ============================================================================
// Backdrop detection
// ============================================================================

/// Width and height of a view box, if it has four tokens and both are
/// finite.
pub fn parse_view_box_size(view_box: &str) -> Option<(f64, f64)> {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    let separator = SEPARATOR.get_or_init(|| Regex::new(r"[\s,]+").expect("valid regex"));

    let tokens: Vec<&str> = separator.split(view_box.trim()).collect();
    if tokens.len() < 4 {
        return None;
    }

    let width = js_number(tokens[2])?;
    let height = js_number(tokens[3])?;
    Some((width, height))
}

fn backdrop_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^M\s*0(?:\.0+)?\s+0(?:\.0+)?\s*h\s*([0-9.]+)\s*v\s*([0-9.]+)\s*H\s*0(?:\.0+)?\s*z$",
        )
        .expect("valid regex")
    })
}

/// Parses an attribute number; blank text counts as zero. Non-finite
/// results are rejected.
fn js_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn approx_eq(left: f64, right: f64) -> bool {
    (left - right).abs() <= SIZE_TOLERANCE
}

/// Detects a solid black or white rectangle covering the whole view box,
/// drawn either as a `<rect>` or as the `M0 0 hW vH H0 z` path idiom.
pub fn is_canvas_backdrop(element: &Element, (width, height): (f64, f64)) -> bool {
    if !is_auto_color_fill(element.attribute("fill").unwrap_or_default()) {
        return false;
    }

    match element.local_name() {
        "path" => {
            let d = element.attribute("d").unwrap_or_default().trim();
            let Some(captures) = backdrop_path_regex().captures(d) else {
                return false;
            };
            let (Some(w), Some(h)) = (js_number(&captures[1]), js_number(&captures[2])) else {
                return false;
            };
            approx_eq(w, width) && approx_eq(h, height)
        }
        "rect" => {
            let number = |name: &str| js_number(element.attribute(name).unwrap_or("0"));
            match (number("x"), number("y"), number("width"), number("height")) {
                (Some(x), Some(y), Some(w), Some(h)) => {
                    approx_eq(x, 0.0)
                        && approx_eq(y, 0.0)
                        && approx_eq(w, width)
                        && approx_eq(h, height)
                }
                _ => false,
            }
        }
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Arc<ParsedDocument> {
        parse_markup(raw, &mut ParseCache::new())
    }

    #[test]
    fn splits_defs_from_inner() {
        let doc = parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64"><defs><linearGradient id="g1"/></defs><path d="M1 1"/></svg>"##,
        );
        assert_eq!(doc.view_box, "0 0 64 64");
        assert_eq!(doc.defs, r#"<linearGradient id="g1"/>"#);
        assert_eq!(doc.inner, r#"<path d="M1 1"/>"#);
    }

    #[test]
    fn identical_input_returns_same_instance() {
        let raw = r#"<svg viewBox="0 0 16 16"><path d="M1 1L2 2Z"/></svg>"#;
        let mut cache = ParseCache::new();
        let first = parse_markup(raw, &mut cache);
        let second = parse_markup(raw, &mut cache);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!Arc::ptr_eq(&first, &parse_markup(raw, &mut cache)));
    }

    #[test]
    fn missing_view_box_uses_default() {
        let doc = parse(r#"<svg><circle r="2"/></svg>"#);
        assert_eq!(doc.view_box, DEFAULT_VIEW_BOX);
        assert_eq!(doc.inner, r#"<circle r="2"/>"#);
    }

    #[test]
    fn unparsable_markup_is_empty() {
        for raw in ["not markup at all <", "<html/>", ""] {
            let doc = parse(raw);
            assert_eq!(*doc, ParsedDocument::empty(), "{raw:?}");
        }
    }

    #[test]
    fn elides_full_canvas_rect_backdrop() {
        let doc = parse(
            r##"<svg viewBox="0 0 512 512"><rect width="512" height="512"/><rect width="512" height="512" fill="#ff0000"/><path d="M1 1"/></svg>"##,
        );
        assert_eq!(
            doc.inner,
            r##"<rect width="512" height="512" fill="#ff0000"/><path d="M1 1"/>"##
        );
    }

    #[test]
    fn elides_path_backdrop_idiom() {
        let doc = parse(
            r##"<svg viewBox="0 0 512 512"><path d="M0 0h512v512H0z" fill="#fff"/><path d="M0 0h512v500H0z"/></svg>"##,
        );
        assert_eq!(doc.inner, r#"<path d="M0 0h512v500H0z"/>"#);
    }

    #[test]
    fn backdrop_needs_matching_size() {
        let doc = parse(r#"<svg viewBox="0 0 24 24"><rect x="1" width="24" height="24"/></svg>"#);
        assert_eq!(doc.inner, r#"<rect x="1" width="24" height="24"/>"#);
    }

    #[test]
    fn nested_backdrop_is_kept() {
        let doc = parse(r#"<svg viewBox="0 0 8 8"><g><rect width="8" height="8"/></g></svg>"#);
        assert_eq!(doc.inner, r#"<g><rect width="8" height="8"/></g>"#);
    }

    #[test]
    fn view_box_size_tokens() {
        assert_eq!(parse_view_box_size("0,0 , 24 32"), Some((24.0, 32.0)));
        assert_eq!(parse_view_box_size("0 0 24"), None);
        assert_eq!(parse_view_box_size("0 0 a 24"), None);
    }

    #[test]
    fn detached_children_keep_prefixes() {
        let doc = parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#a"/></svg>"##,
        );
        assert_eq!(
            doc.inner,
            r##"<use xlink:href="#a" xmlns:xlink="http://www.w3.org/1999/xlink"/>"##
        );
    }

    #[test]
    fn text_between_children_is_kept() {
        let doc = parse("<svg>\n  <path d=\"M0 0\"/>\n</svg>");
        assert_eq!(doc.inner, "\n  <path d=\"M0 0\"/>\n");
    }
}
