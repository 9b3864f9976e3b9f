//! The compiled translation model: the serializable artifact that
//! parameterizes the translator for one message-description family
//!
//! Four/five semantic tables (spec §3), serialized verbatim to the JSON
//! shape spec §6 defines. Reloading is the inverse operation; any parse
//! failure surfaces as [`crate::error::Error::Format`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Structures-family namespace URI prefix (`id`/`ref`/`uri`/`metadata`)
pub const STRUCTURES_NS_PREFIX: &str = "http://release.niem.gov/niem/structures/";
/// Appinfo-family namespace URI prefix
pub const APPINFO_NS_PREFIX: &str = "http://release.niem.gov/niem/appinfo/";
/// Conformance-targets-family namespace URI prefix
pub const CONFORMANCE_TARGETS_NS_PREFIX: &str =
    "http://release.niem.gov/niem/conformanceTargets/";
/// XSD-proxy-family namespace URI prefix
pub const XSD_PROXY_NS_PREFIX: &str = "http://release.niem.gov/niem/proxy/xsd/";
/// Local name of the conformance-target attribute
pub const CONFORMANCE_TARGETS_ATTR_LOCAL: &str = "conformanceTargets";
/// NDR (naming-and-design-rules) specification URI prefix
pub const NDR_URI_PREFIX: &str =
    "http://reference.niem.gov/niem/specification/naming-and-design-rules/";
/// NIEM model-release namespace URI prefix
pub const NIEM_RELEASE_PREFIX: &str = "http://release.niem.gov/niem/";
/// RDF namespace URI
pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// True if `uri` belongs to the structures-family namespace
pub fn is_structures_namespace(uri: &str) -> bool {
    uri.starts_with(STRUCTURES_NS_PREFIX)
}

/// The compiled translation model — the artifact consumed by the translator
///
/// Immutable once compiled (spec §3's lifecycle note). The translator never
/// mutates it; any per-document extension happens on a private
/// [`crate::namespaces::NamespaceBindings`] snapshot instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationModel {
    /// (attribute component IRI) -> base-type token
    #[serde(rename = "attributes")]
    pub attribute_type: BTreeMap<String, String>,

    /// (element component IRI) -> base-type token, for elements with a
    /// simple base type (directly simple, or complex with simple content)
    #[serde(rename = "simpleElements")]
    pub simple_element_type: BTreeMap<String, String>,

    /// Namespace URIs carrying no conformance-target annotation
    #[serde(rename = "externalNamespaces")]
    pub external_namespaces: Vec<String>,

    /// The JSON-LD context that instance translations carry: ordered
    /// (prefix, namespace-URI) pairs
    #[serde(rename = "contextBindings")]
    pub context_bindings: Vec<(String, String)>,

    /// Whether any complex type in the schema contains a wildcard
    /// (element or attribute) term
    #[serde(rename = "hasWildcard")]
    pub has_wildcard: bool,
}

impl TranslationModel {
    /// The base-type token for an attribute component IRI, if compiled
    pub fn attribute_type(&self, component_iri: &str) -> Option<&str> {
        self.attribute_type.get(component_iri).map(|s| s.as_str())
    }

    /// The base-type token for a simple element's component IRI, if compiled
    pub fn simple_element_type(&self, component_iri: &str) -> Option<&str> {
        self.simple_element_type
            .get(component_iri)
            .map(|s| s.as_str())
    }

    /// True if `uri` is flagged external (no conformance-target annotation)
    pub fn is_external_namespace(&self, uri: &str) -> bool {
        self.external_namespaces.iter().any(|n| n == uri)
    }

    /// Serialize to the canonical JSON text form (spec §6)
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Format(format!("failed to serialize translation model: {}", e)))
    }

    /// Parse the canonical JSON text form; any failure is a [`Error::Format`]
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::Format(format!("malformed translation model: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_json() {
        let mut model = TranslationModel::default();
        model
            .attribute_type
            .insert("urn:ex#id".to_string(), "string".to_string());
        model
            .simple_element_type
            .insert("urn:ex#Name".to_string(), "string".to_string());
        model.external_namespaces.push("urn:ex:ext".to_string());
        model
            .context_bindings
            .push(("ex".to_string(), "urn:ex/".to_string()));
        model.has_wildcard = true;

        let json = model.to_json().unwrap();
        let reloaded = TranslationModel::from_json(&json).unwrap();

        assert_eq!(reloaded.attribute_type("urn:ex#id"), Some("string"));
        assert_eq!(reloaded.simple_element_type("urn:ex#Name"), Some("string"));
        assert!(reloaded.is_external_namespace("urn:ex:ext"));
        assert_eq!(
            reloaded.context_bindings,
            vec![("ex".to_string(), "urn:ex/".to_string())]
        );
        assert!(reloaded.has_wildcard);
    }

    #[test]
    fn test_malformed_model_is_format_error() {
        let result = TranslationModel::from_json("{not json");
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_model_shape_matches_spec_keys() {
        let model = TranslationModel::default();
        let json = model.to_json().unwrap();
        for key in [
            "\"attributes\"",
            "\"simpleElements\"",
            "\"externalNamespaces\"",
            "\"contextBindings\"",
            "\"hasWildcard\"",
        ] {
            assert!(json.contains(key), "missing key {}", key);
        }
    }

    #[test]
    fn test_is_structures_namespace() {
        assert!(is_structures_namespace(
            "http://release.niem.gov/niem/structures/4.0/"
        ));
        assert!(!is_structures_namespace("http://example.com/ns"));
    }
}
