//! A small owned XML document tree
//!
//! Used for one-shot, whole-document parsing where a DOM is convenient:
//! XML Catalog files (`catalog.rs`) and the single pass over each
//! assembled schema document's `<schema>` root element that captures its
//! namespace declarations and conformance-target attribute (`assembler`,
//! `extractor.rs`). Streaming concerns (schema import/include/redefine
//! scanning, instance translation) use `quick_xml` events directly instead.

use crate::error::{Error, ParseError, Result};
use roxmltree::Document as RoDocument;

/// An XML attribute: its namespace (if qualified), local name, and value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, if the attribute name is qualified
    pub namespace: Option<String>,
    /// Local (unqualified) name
    pub local_name: String,
    /// Attribute value
    pub value: String,
}

/// A namespace declaration found on an element (`xmlns` / `xmlns:prefix`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix; empty string for the default namespace
    pub prefix: String,
    /// Declared namespace URI
    pub uri: String,
}

/// An owned XML element, detached from the parser's borrowed tree
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Namespace URI of this element's name, if any
    pub namespace: Option<String>,
    /// Local (unqualified) name
    pub local_name: String,
    /// Attributes, in document order
    pub attributes: Vec<Attribute>,
    /// Namespace declarations introduced directly on this element
    pub namespace_decls: Vec<NamespaceDecl>,
    /// Child elements, in document order
    pub children: Vec<Element>,
    /// Concatenated text content of direct text children
    pub text: String,
    /// 1-based source line number, when known
    pub line: u32,
}

impl Element {
    /// Local name of the element (ignoring namespace)
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// First attribute value matching the given local name, in any namespace
    pub fn get_attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// First attribute value matching the given namespace + local name
    pub fn get_attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == local_name && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    /// An attribute whose namespace URI starts with the given prefix
    pub fn attribute_with_ns_prefix(&self, ns_prefix: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| {
            a.namespace
                .as_deref()
                .map(|ns| ns.starts_with(ns_prefix))
                .unwrap_or(false)
        })
    }

    /// Direct children whose local name matches
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter(move |c| c.local_name == local_name)
    }
}

/// A parsed XML document
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Option<Element>,
}

impl Document {
    /// An empty document with no root element
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        let ro = RoDocument::parse(xml)
            .map_err(|e| Error::Parse(ParseError::new(format!("XML parse error: {}", e))))?;

        let root = convert(ro.root_element(), &ro);
        Ok(Self { root: Some(root) })
    }

    /// The root element, if any
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }
}

fn convert(node: roxmltree::Node, doc: &RoDocument) -> Element {
    let tag = node.tag_name();
    let line = doc.text_pos_at(node.range().start).row;

    let attributes = node
        .attributes()
        .map(|a| Attribute {
            namespace: a.namespace().map(|s| s.to_string()),
            local_name: a.name().to_string(),
            value: a.value().to_string(),
        })
        .collect();

    let namespace_decls = node
        .namespaces()
        .map(|ns| NamespaceDecl {
            prefix: ns.name().unwrap_or("").to_string(),
            uri: ns.uri().to_string(),
        })
        .collect();

    let mut children = Vec::new();
    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            children.push(convert(child, doc));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }

    Element {
        namespace: tag.namespace().map(|s| s.to_string()),
        local_name: tag.name().to_string(),
        attributes,
        namespace_decls,
        children,
        text,
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let doc = Document::from_string("<root a=\"1\"><child>text</child></root>").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.get_attribute("a"), Some("1"));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].text, "text");
    }

    #[test]
    fn test_namespace_decls_captured() {
        let doc = Document::from_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="http://example.com/ns"/>"#,
        )
        .unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.local_name(), "schema");
        assert!(root
            .namespace_decls
            .iter()
            .any(|d| d.prefix == "xs" && d.uri == "http://www.w3.org/2001/XMLSchema"));
        assert!(root
            .namespace_decls
            .iter()
            .any(|d| d.prefix.is_empty() && d.uri == "http://example.com/ns"));
    }

    #[test]
    fn test_qualified_attribute_lookup() {
        let doc =
            Document::from_string(r#"<root xmlns:j="urn:ex" j:id="abc"><child/></root>"#).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.get_attribute_ns("urn:ex", "id"), Some("abc"));
    }

    #[test]
    fn test_malformed_document_errors() {
        assert!(Document::from_string("<root><unclosed></root>").is_err());
    }
}
