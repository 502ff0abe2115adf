//! Owned element tree built from `roxmltree` documents.
//!
//! `roxmltree` gives a read-only view. The engine needs to clone elements,
//! rewrite attributes and serialize subtrees back to text, so documents are
//! copied into this small owned model right after parsing.

use std::collections::BTreeSet;

use crate::error::MarkupError;

/// The SVG namespace URI.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

// ============================================================================
// Node / Element
// ============================================================================

/// A node in an owned markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    /// Appends the serialized form of this node to `out`.
    pub fn write_markup(&self, out: &mut String) {
        match self {
            Node::Element(element) => element.write_markup(out),
            Node::Text(text) => escape_text_into(text, out),
            Node::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

/// An element with its qualified name, attributes in source order, and
/// children.
///
/// Namespace declarations are kept as ordinary `xmlns` / `xmlns:*`
/// attributes on the element that declared them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The element name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Returns an attribute value by qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Removes an attribute if present.
    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| key != name);
    }

    /// Iterates over the direct element children.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Calls `visit` on every descendant element in document order,
    /// excluding `self`.
    pub fn for_each_descendant_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        for child in &mut self.children {
            if let Node::Element(element) = child {
                visit(element);
                element.for_each_descendant_mut(visit);
            }
        }
    }

    /// Serializes this element and its subtree.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    /// Serializes only the children of this element.
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_markup(&mut out);
        }
        out
    }

    /// Appends the serialized form of this element to `out`.
    pub fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attribute_into(value, out);
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            child.write_markup(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Namespace declarations made on this element, as `(attribute, uri)`.
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter(|(key, _)| key.starts_with("xmlns:"))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Copies prefixed namespace declarations this subtree relies on from
    /// `scope` onto `self`, so the element can be serialized on its own.
    ///
    /// `scope` lists `(xmlns:prefix, uri)` pairs, nearest declaration first.
    pub fn inherit_namespaces(&mut self, scope: &[(String, String)]) {
        let mut prefixes = BTreeSet::new();
        self.collect_prefixes(&mut prefixes);

        for prefix in prefixes {
            let attr = format!("xmlns:{prefix}");
            if self.attribute(&attr).is_some() {
                continue;
            }
            if let Some((_, uri)) = scope.iter().find(|(key, _)| *key == attr) {
                self.attributes.push((attr, uri.clone()));
            }
        }
    }

    fn collect_prefixes(&self, prefixes: &mut BTreeSet<String>) {
        if let Some((prefix, _)) = self.name.split_once(':') {
            prefixes.insert(prefix.to_string());
        }
        for (key, _) in &self.attributes {
            if let Some((prefix, _)) = key.split_once(':') {
                if prefix != "xmlns" && prefix != "xml" {
                    prefixes.insert(prefix.to_string());
                }
            }
        }
        for child in self.child_elements() {
            child.collect_prefixes(prefixes);
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses raw markup and returns the first `<svg>` element found in it.
///
/// The `<svg>` does not have to be the document element; markup wrapped in
/// another container still resolves to its first `<svg>` descendant.
pub fn parse_document(raw: &str) -> Result<Element, MarkupError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(raw, options)?;
    let svg = doc
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name() == "svg")
        .ok_or(MarkupError::MissingRoot)?;

    Ok(convert_element(svg, true))
}

/// Parses a markup fragment (zero or more sibling nodes) by wrapping it in
/// an SVG-namespaced `<svg>` container. The container is returned; the
/// fragment's nodes are its children.
pub fn parse_fragment(markup: &str) -> Result<Element, MarkupError> {
    parse_document(&format!(r#"<svg xmlns="{SVG_NS}">{markup}</svg>"#))
}

fn convert_element(node: roxmltree::Node<'_, '_>, is_root: bool) -> Element {
    let tag = node.tag_name();
    let mut element = Element::new(qualified_name(node, tag.namespace(), tag.name()));

    let inherited: Vec<(Option<&str>, &str)> = match node.parent_element() {
        Some(parent) if !is_root => parent
            .namespaces()
            .map(|ns| (ns.name(), ns.uri()))
            .collect(),
        _ => Vec::new(),
    };
    for ns in node.namespaces() {
        if ns.name() == Some("xml") || inherited.contains(&(ns.name(), ns.uri())) {
            continue;
        }
        let key = match ns.name() {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        element.attributes.push((key, ns.uri().to_string()));
    }

    for attr in node.attributes() {
        let name = qualified_name(node, attr.namespace(), attr.name());
        element.attributes.push((name, attr.value().to_string()));
    }

    for child in node.children() {
        if child.is_element() {
            element.children.push(Node::Element(convert_element(child, false)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(Node::Text(text.to_string()));
            }
        } else if child.is_comment() {
            if let Some(text) = child.text() {
                element.children.push(Node::Comment(text.to_string()));
            }
        }
    }

    element
}

fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(XML_NS) => format!("xml:{local}"),
        Some(uri) => match node.lookup_prefix(uri) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
            _ => local.to_string(),
        },
        None => local.to_string(),
    }
}

// ============================================================================
// Escaping
// ============================================================================

/// Escapes a value for use inside a double-quoted attribute.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    escape_attribute_into(value, &mut out);
    out
}

fn escape_attribute_into(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_serialize_keeps_attribute_order() {
        let root = parse_document(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><path id="p" fill="#000" d="M0 0L1 1"/></svg>"##,
        )
        .unwrap();

        assert_eq!(root.local_name(), "svg");
        assert_eq!(root.attribute("viewBox"), Some("0 0 10 10"));
        assert_eq!(
            root.inner_markup(),
            r##"<path id="p" fill="#000" d="M0 0L1 1"/>"##
        );
    }

    #[test]
    fn finds_nested_svg_element() {
        let root = parse_document(r#"<div><svg viewBox="0 0 1 1"><g/></svg></div>"#).unwrap();
        assert_eq!(root.attribute("viewBox"), Some("0 0 1 1"));
    }

    #[test]
    fn missing_svg_is_reported() {
        assert!(matches!(
            parse_document("<not-svg/>"),
            Err(MarkupError::MissingRoot)
        ));
        assert!(matches!(parse_document("<svg"), Err(MarkupError::Xml(_))));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut element = Element::new("g");
        element.set_attribute("style", r#"font-family:"A&B""#);
        assert_eq!(
            element.to_markup(),
            r#"<g style="font-family:&quot;A&amp;B&quot;"/>"#
        );
    }

    #[test]
    fn set_attribute_replaces_in_place() {
        let mut element = Element::new("path");
        element.set_attribute("fill", "#000");
        element.set_attribute("d", "M0 0");
        element.set_attribute("fill", "red");
        element.remove_attribute("d");
        assert_eq!(element.attributes, vec![("fill".to_string(), "red".to_string())]);
    }

    #[test]
    fn prefixed_attributes_keep_their_prefix() {
        let root = parse_document(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#a"/></svg>"##,
        )
        .unwrap();

        assert_eq!(
            root.attribute("xmlns:xlink"),
            Some("http://www.w3.org/1999/xlink")
        );
        let child = root.child_elements().next().unwrap();
        assert_eq!(child.attribute("xlink:href"), Some("#a"));
        assert_eq!(child.attribute("xmlns:xlink"), None);
    }

    #[test]
    fn inherit_namespaces_copies_used_prefixes_only() {
        let root = parse_document(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" xmlns:ink="urn:ink"><g><use xlink:href="#a"/></g></svg>"##,
        )
        .unwrap();
        let scope: Vec<(String, String)> = root
            .namespace_declarations()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut group = root.child_elements().next().unwrap().clone();
        group.inherit_namespaces(&scope);

        assert_eq!(
            group.attribute("xmlns:xlink"),
            Some("http://www.w3.org/1999/xlink")
        );
        assert_eq!(group.attribute("xmlns:ink"), None);
    }

    #[test]
    fn fragment_children_are_parsed() {
        let container = parse_fragment(r#"<path d="M0 0"/>text<circle r="1"/>"#).unwrap();
        assert_eq!(container.child_elements().count(), 2);
        assert_eq!(
            container.inner_markup(),
            r#"<path d="M0 0"/>text<circle r="1"/>"#
        );
    }

    #[test]
    fn descendant_visit_is_document_order() {
        let mut container =
            parse_fragment(r#"<g id="a"><path id="b"/></g><rect id="c"/>"#).unwrap();
        let mut seen = Vec::new();
        container.for_each_descendant_mut(&mut |element| {
            seen.push(element.attribute("id").unwrap_or_default().to_string());
        });
        assert_eq!(seen, vec!["a", "b", "c"]);
    }
}
