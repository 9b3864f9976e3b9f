//! Namespace bindings: qualified names and the prefix<->URI bijection
//!
//! `QName` is the general-purpose namespace+local-name pair used throughout
//! the schema model. `NamespaceBindings` is the bijective prefix<->URI map
//! from the data model: used both while compiling a schema's final context
//! and while translating an instance document, where the translator extends
//! a per-document snapshot without mutating the compiled model's copy.

use indexmap::IndexMap;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// The component IRI: `namespace + ('#' if not already present) + local-name`
    pub fn component_iri(&self) -> String {
        match &self.namespace {
            Some(ns) if ns.ends_with('#') => format!("{}{}", ns, self.local_name),
            Some(ns) => format!("{}#{}", ns, self.local_name),
            None => self.local_name.clone(),
        }
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// A finite bijection between prefix strings and namespace URIs
///
/// Invariant: each prefix maps to exactly one URI and each URI to exactly
/// one prefix. `assign` is the only mutator; see its docs for the collision
/// and no-op rules.
#[derive(Debug, Clone, Default)]
pub struct NamespaceBindings {
    prefix_to_uri: IndexMap<Prefix, NamespaceUri>,
    uri_to_prefix: IndexMap<NamespaceUri, Prefix>,
}

impl NamespaceBindings {
    /// An empty binding set
    pub fn new() -> Self {
        Self::default()
    }

    /// The URI bound to a prefix, if any
    pub fn uri_of(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_uri.get(prefix).map(|s| s.as_str())
    }

    /// The prefix bound to a URI, if any
    pub fn prefix_of(&self, uri: &str) -> Option<&str> {
        self.uri_to_prefix.get(uri).map(|s| s.as_str())
    }

    /// Bind `uri` to `prefix`, synthesizing a fresh prefix on collision
    ///
    /// If `uri` is already bound (to any prefix), this call is a no-op —
    /// first binding wins. Otherwise, if `prefix` is already taken by a
    /// different URI, a fresh prefix is synthesized by appending `_1`,
    /// `_2`, … until unique. Returns the prefix actually used.
    pub fn assign(&mut self, uri: impl Into<String>, prefix: impl Into<String>) -> String {
        let uri = uri.into();
        let prefix = prefix.into();

        if let Some(existing) = self.uri_to_prefix.get(&uri) {
            return existing.clone();
        }

        let final_prefix = if self.prefix_to_uri.contains_key(&prefix) {
            let mut n = 1;
            loop {
                let candidate = format!("{}_{}", prefix, n);
                if !self.prefix_to_uri.contains_key(&candidate) {
                    break candidate;
                }
                n += 1;
            }
        } else {
            prefix
        };

        self.prefix_to_uri
            .insert(final_prefix.clone(), uri.clone());
        self.uri_to_prefix.insert(uri, final_prefix.clone());
        final_prefix
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.prefix_to_uri.len()
    }

    /// True if no bindings are held
    pub fn is_empty(&self) -> bool {
        self.prefix_to_uri.is_empty()
    }

    /// Iterate bindings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefix_to_uri
            .iter()
            .map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// An owned copy whose later mutations do not affect this one
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_component_iri() {
        let qname = QName::namespaced("http://example.com/ns", "element");
        assert_eq!(qname.component_iri(), "http://example.com/ns#element");

        let with_fragment = QName::namespaced("http://example.com/ns#", "element");
        assert_eq!(with_fragment.component_iri(), "http://example.com/ns#element");
    }

    #[test]
    fn test_qname_display() {
        let qname = QName::namespaced("http://example.com", "element");
        assert_eq!(format!("{}", qname), "{http://example.com}element");

        let qname_local = QName::local("element");
        assert_eq!(format!("{}", qname_local), "element");
    }

    #[test]
    fn test_assign_simple() {
        let mut bindings = NamespaceBindings::new();
        let prefix = bindings.assign("http://www.w3.org/2001/XMLSchema", "xs");
        assert_eq!(prefix, "xs");
        assert_eq!(bindings.uri_of("xs"), Some("http://www.w3.org/2001/XMLSchema"));
        assert_eq!(bindings.prefix_of("http://www.w3.org/2001/XMLSchema"), Some("xs"));
    }

    #[test]
    fn test_assign_collision_synthesizes_suffix() {
        let mut bindings = NamespaceBindings::new();
        bindings.assign("urn:ns-one", "ex");
        let second = bindings.assign("urn:ns-two", "ex");
        assert_eq!(second, "ex_1");
        assert_eq!(bindings.uri_of("ex"), Some("urn:ns-one"));
        assert_eq!(bindings.uri_of("ex_1"), Some("urn:ns-two"));
    }

    #[test]
    fn test_assign_existing_uri_is_noop() {
        let mut bindings = NamespaceBindings::new();
        bindings.assign("urn:ns-one", "ex");
        let prefix = bindings.assign("urn:ns-one", "other");
        assert_eq!(prefix, "ex");
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut bindings = NamespaceBindings::new();
        bindings.assign("urn:ns-one", "ex");

        let mut snapshot = bindings.snapshot();
        snapshot.assign("urn:ns-two", "other");

        assert_eq!(bindings.len(), 1);
        assert_eq!(snapshot.len(), 2);
    }
}
