//! OASIS XML Catalog support for schema location resolution
//!
//! Resolves namespace URIs, system identifiers, public identifiers, and
//! generic URIs to local `file:` URIs, the way an XML-Schema engine's
//! entity resolver does when loading `xsi:schemaLocation`-less imports.
//!
//! https://www.oasis-open.org/committees/entity/spec-2001-08-06.html
//!
//! # Supported elements
//!
//! - `<catalog>` - root element
//! - `<group>` - grouping element (inherits `xml:base` from its parent)
//! - `<public>` - maps public identifiers to URIs
//! - `<system>` - maps system identifiers to URIs
//! - `<uri>` - maps URN names to URIs
//! - `<rewriteSystem>` / `<rewriteURI>` - best-effort prefix rewriting
//! - `<nextCatalog>` - includes another catalog file

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::documents::{Document, Element};
use crate::error::{CatalogParseResult, Error, ParseError, Result};
use url::Url;

/// Kind of catalog resolution attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// A generic URI lookup (`<uri>`)
    Uri,
    /// A system identifier lookup (`<system>`)
    System,
    /// A public identifier lookup (`<public>`)
    Public,
}

impl ResolutionKind {
    fn as_str(&self) -> &'static str {
        match self {
            ResolutionKind::Uri => "uri",
            ResolutionKind::System => "system",
            ResolutionKind::Public => "public",
        }
    }
}

/// One resolve call recorded in the resolution log
#[derive(Debug, Clone)]
pub struct ResolutionRecord {
    /// What kind of lookup this was
    pub kind: ResolutionKind,
    /// The identifier or URI looked up
    pub input: String,
    /// The resolved absolute URI, if any
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct CatalogIndex {
    system_mappings: HashMap<String, String>,
    public_mappings: HashMap<String, String>,
    uri_mappings: HashMap<String, String>,
    rewrite_system: Vec<(String, String)>,
    rewrite_uri: Vec<(String, String)>,
}

/// Resolves OASIS XML Catalog entries to local `file:` URIs
#[derive(Debug, Clone, Default)]
pub struct CatalogResolver {
    index: CatalogIndex,
    /// One validation line per attempted catalog file
    validation_results: Vec<String>,
    /// Prefer `<public>` entries over `<system>` when both match
    pub prefer_public: bool,
    /// Use the literal system identifier, rather than a normalized form, as the lookup key
    pub use_literal_system_id: bool,
    resolution_log: Vec<ResolutionRecord>,
}

impl CatalogResolver {
    /// Create an empty resolver with default flags (spec edge case iii)
    pub fn new() -> Self {
        Self {
            prefer_public: true,
            use_literal_system_id: true,
            ..Default::default()
        }
    }

    /// Load and index one or more catalog files
    ///
    /// Canonicalizes each path to an absolute `file:` URI, parses it
    /// (following `nextCatalog` recursively), and records one
    /// [`CatalogParseResult`] per file. A parse failure on one catalog does
    /// not prevent the others from being attempted.
    pub fn set_catalogs(&mut self, paths: &[impl AsRef<Path>]) -> Vec<CatalogParseResult> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            match self.load_one(path) {
                Ok(()) => {
                    self.validation_results
                        .push(format!("{}: ok", path.display()));
                    results.push(CatalogParseResult::Ok);
                }
                Err(e) => {
                    let msg = e.to_string();
                    self.validation_results
                        .push(format!("{}: {}", path.display(), msg));
                    results.push(CatalogParseResult::Err(vec![msg]));
                }
            }
        }
        results
    }

    fn load_one(&mut self, path: &Path) -> Result<()> {
        let base_dir = path.parent().map(|p| p.to_path_buf());
        let content = fs::read_to_string(path).map_err(|e| {
            Error::CatalogIo(format!("failed to read catalog '{}': {}", path.display(), e))
        })?;
        self.parse_catalog(&content, base_dir.as_deref())
    }

    fn parse_catalog(&mut self, xml: &str, base_dir: Option<&Path>) -> Result<()> {
        let doc = Document::from_string(xml)
            .map_err(|e| Error::CatalogParse(format!("malformed catalog XML: {}", e)))?;
        let root = doc
            .root()
            .ok_or_else(|| Error::CatalogParse("empty catalog document".into()))?;

        if root.local_name() != "catalog" {
            return Err(Error::CatalogParse(format!(
                "expected <catalog> root element, found <{}>",
                root.local_name()
            )));
        }

        let base_dir = root
            .get_attribute_ns(crate::XML_NAMESPACE, "base")
            .map(PathBuf::from)
            .or_else(|| base_dir.map(|p| p.to_path_buf()));

        self.process_children(&root.children, base_dir.as_deref())
    }

    fn process_children(&mut self, children: &[Element], base_dir: Option<&Path>) -> Result<()> {
        for child in children {
            match child.local_name() {
                "system" => {
                    if let (Some(system_id), Some(uri)) =
                        (child.get_attribute("systemId"), child.get_attribute("uri"))
                    {
                        let resolved = resolve_relative(uri, base_dir);
                        self.index
                            .system_mappings
                            .insert(system_id.to_string(), resolved);
                    }
                }
                "public" => {
                    if let (Some(public_id), Some(uri)) =
                        (child.get_attribute("publicId"), child.get_attribute("uri"))
                    {
                        let resolved = resolve_relative(uri, base_dir);
                        self.index
                            .public_mappings
                            .insert(public_id.to_string(), resolved);
                    }
                }
                "uri" => {
                    if let (Some(name), Some(uri)) =
                        (child.get_attribute("name"), child.get_attribute("uri"))
                    {
                        let resolved = resolve_relative(uri, base_dir);
                        self.index.uri_mappings.insert(name.to_string(), resolved);
                    }
                }
                "rewriteSystem" => {
                    if let (Some(prefix), Some(rewrite)) = (
                        child.get_attribute("systemIdStartString"),
                        child.get_attribute("rewritePrefix"),
                    ) {
                        self.index
                            .rewrite_system
                            .push((prefix.to_string(), rewrite.to_string()));
                    }
                }
                "rewriteURI" => {
                    if let (Some(prefix), Some(rewrite)) = (
                        child.get_attribute("uriStartString"),
                        child.get_attribute("rewritePrefix"),
                    ) {
                        self.index
                            .rewrite_uri
                            .push((prefix.to_string(), rewrite.to_string()));
                    }
                }
                "nextCatalog" => {
                    if let Some(catalog_path) = child.get_attribute("catalog") {
                        let resolved_path = match base_dir {
                            Some(base) => base.join(catalog_path),
                            None => PathBuf::from(catalog_path),
                        };
                        if resolved_path.exists() {
                            if let Ok(content) = fs::read_to_string(&resolved_path) {
                                let next_base = resolved_path.parent().map(|p| p.to_path_buf());
                                self.parse_catalog(&content, next_base.as_deref())?;
                            }
                        }
                    }
                }
                "group" => {
                    let group_base = child
                        .get_attribute_ns(crate::XML_NAMESPACE, "base")
                        .map(PathBuf::from)
                        .or_else(|| base_dir.map(|p| p.to_path_buf()));
                    self.process_children(&child.children, group_base.as_deref())?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolve a generic URI entry
    pub fn resolve_uri(&mut self, uri: &str) -> Option<String> {
        let outcome = self
            .index
            .uri_mappings
            .get(uri)
            .cloned()
            .or_else(|| rewrite(&self.index.rewrite_uri, uri));
        self.log(ResolutionKind::Uri, uri, outcome.clone());
        outcome
    }

    /// Resolve a system identifier
    pub fn resolve_system(&mut self, system_id: &str) -> Option<String> {
        let outcome = self
            .index
            .system_mappings
            .get(system_id)
            .cloned()
            .or_else(|| rewrite(&self.index.rewrite_system, system_id));
        self.log(ResolutionKind::System, system_id, outcome.clone());
        outcome
    }

    /// Resolve a public identifier
    pub fn resolve_public(&mut self, public_id: &str) -> Option<String> {
        let outcome = self.index.public_mappings.get(public_id).cloned();
        self.log(ResolutionKind::Public, public_id, outcome.clone());
        outcome
    }

    /// Resolve a namespace URI, preferring `<public>` over `<system>` per `prefer_public`
    pub fn resolve_namespace(&mut self, namespace: &str) -> Option<String> {
        if self.prefer_public {
            self.resolve_public(namespace)
                .or_else(|| self.resolve_system(namespace))
                .or_else(|| self.resolve_uri(namespace))
        } else {
            self.resolve_system(namespace)
                .or_else(|| self.resolve_public(namespace))
                .or_else(|| self.resolve_uri(namespace))
        }
    }

    fn log(&mut self, kind: ResolutionKind, input: &str, outcome: Option<String>) {
        self.resolution_log.push(ResolutionRecord {
            kind,
            input: input.to_string(),
            outcome,
        });
    }

    /// One validation line per attempted catalog file
    pub fn validation_results(&self) -> &[String] {
        &self.validation_results
    }

    /// The subset of `validation_results` representing failures
    pub fn validation_errors(&self) -> Vec<&str> {
        self.validation_results
            .iter()
            .filter(|r| !r.ends_with(": ok"))
            .map(|r| r.as_str())
            .collect()
    }

    /// Every resolve call since the last [`Self::reset_resolutions`]
    pub fn resolution_messages(&self) -> Vec<String> {
        self.resolution_log
            .iter()
            .map(|r| {
                format!(
                    "{} '{}' -> {}",
                    r.kind.as_str(),
                    r.input,
                    r.outcome.as_deref().unwrap_or("<unresolved>")
                )
            })
            .collect()
    }

    /// Clear the resolution log
    pub fn reset_resolutions(&mut self) {
        self.resolution_log.clear();
    }

    /// True if no mappings of any kind were loaded
    pub fn is_empty(&self) -> bool {
        self.index.system_mappings.is_empty()
            && self.index.public_mappings.is_empty()
            && self.index.uri_mappings.is_empty()
    }

    /// Total number of direct mappings loaded (not counting rewrite rules)
    pub fn len(&self) -> usize {
        self.index.system_mappings.len()
            + self.index.public_mappings.len()
            + self.index.uri_mappings.len()
    }
}

fn resolve_relative(uri: &str, base_dir: Option<&Path>) -> String {
    match base_dir {
        Some(base) => base.join(uri).to_string_lossy().to_string(),
        None => uri.to_string(),
    }
}

fn rewrite(rules: &[(String, String)], value: &str) -> Option<String> {
    rules
        .iter()
        .filter(|(prefix, _)| value.starts_with(prefix.as_str()))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(prefix, replacement)| format!("{}{}", replacement, &value[prefix.len()..]))
}

/// True unless `uri` resolves to a local `file:` scheme. Spec §4.1 edge case
/// (i): non-local resolutions are returned to callers unchanged, but the
/// caller (the assembler) treats them as "non-local".
pub fn is_non_local(uri: &str) -> bool {
    match Url::parse(uri) {
        Ok(u) => u.scheme() != "file",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_simple_catalog() {
        let catalog_xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <system systemId="urn:example:schema.xsd" uri="schemas/schema.xsd"/>
    <uri name="urn:example:types.xsd" uri="schemas/types.xsd"/>
</catalog>"#;

        let temp_dir = TempDir::new().unwrap();
        let catalog_path = temp_dir.path().join("catalog.xml");
        std::fs::write(&catalog_path, catalog_xml).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("schemas")).unwrap();

        let mut catalog = CatalogResolver::new();
        let results = catalog.set_catalogs(&[&catalog_path]);
        assert!(results[0].is_ok());
        assert_eq!(catalog.len(), 2);

        let resolved = catalog.resolve_system("urn:example:schema.xsd").unwrap();
        assert!(resolved.ends_with("schemas/schema.xsd"));

        let resolved = catalog.resolve_uri("urn:example:types.xsd").unwrap();
        assert!(resolved.ends_with("schemas/types.xsd"));

        assert!(catalog.resolve_system("urn:example:not-found.xsd").is_none());
        assert_eq!(catalog.resolution_messages().len(), 3);
    }

    #[test]
    fn test_nested_catalogs() {
        let temp_dir = TempDir::new().unwrap();

        let main_catalog = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <system systemId="urn:main:schema.xsd" uri="main.xsd"/>
    <nextCatalog catalog="sub/catalog.xml"/>
</catalog>"#;

        let sub_dir = temp_dir.path().join("sub");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let sub_catalog = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <system systemId="urn:sub:schema.xsd" uri="sub.xsd"/>
</catalog>"#;

        std::fs::write(temp_dir.path().join("catalog.xml"), main_catalog).unwrap();
        std::fs::write(sub_dir.join("catalog.xml"), sub_catalog).unwrap();

        let mut catalog = CatalogResolver::new();
        let results = catalog.set_catalogs(&[temp_dir.path().join("catalog.xml")]);
        assert!(results[0].is_ok());

        assert_eq!(catalog.len(), 2);
        assert!(catalog.resolve_system("urn:main:schema.xsd").is_some());
        assert!(catalog.resolve_system("urn:sub:schema.xsd").is_some());
    }

    #[test]
    fn test_group_element() {
        let catalog_xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <group>
        <system systemId="urn:grouped:schema.xsd" uri="grouped.xsd"/>
    </group>
</catalog>"#;

        let temp_dir = TempDir::new().unwrap();
        let catalog_path = temp_dir.path().join("catalog.xml");
        std::fs::write(&catalog_path, catalog_xml).unwrap();

        let mut catalog = CatalogResolver::new();
        catalog.set_catalogs(&[&catalog_path]);

        assert_eq!(catalog.len(), 1);
        assert!(catalog.resolve_system("urn:grouped:schema.xsd").is_some());
    }

    #[test]
    fn test_public_preferred_by_default() {
        let catalog_xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <public publicId="-//EX//DTD 1.0//EN" uri="public.xsd"/>
    <system systemId="-//EX//DTD 1.0//EN" uri="system.xsd"/>
</catalog>"#;
        let temp_dir = TempDir::new().unwrap();
        let catalog_path = temp_dir.path().join("catalog.xml");
        std::fs::write(&catalog_path, catalog_xml).unwrap();

        let mut catalog = CatalogResolver::new();
        catalog.set_catalogs(&[&catalog_path]);
        let resolved = catalog.resolve_namespace("-//EX//DTD 1.0//EN").unwrap();
        assert!(resolved.ends_with("public.xsd"));
    }

    #[test]
    fn test_rewrite_uri_longest_prefix_wins() {
        let catalog_xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <rewriteURI uriStartString="urn:example:" rewritePrefix="file:///short/"/>
    <rewriteURI uriStartString="urn:example:deep:" rewritePrefix="file:///deep/"/>
</catalog>"#;
        let temp_dir = TempDir::new().unwrap();
        let catalog_path = temp_dir.path().join("catalog.xml");
        std::fs::write(&catalog_path, catalog_xml).unwrap();

        let mut catalog = CatalogResolver::new();
        catalog.set_catalogs(&[&catalog_path]);
        let resolved = catalog.resolve_uri("urn:example:deep:thing.xsd").unwrap();
        assert_eq!(resolved, "file:///deep/thing.xsd");
    }

    #[test]
    fn test_malformed_catalog_does_not_abort_others() {
        let temp_dir = TempDir::new().unwrap();
        let bad_path = temp_dir.path().join("bad.xml");
        std::fs::write(&bad_path, "<notACatalog/>").unwrap();

        let good_xml = r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <system systemId="urn:good:schema.xsd" uri="good.xsd"/>
</catalog>"#;
        let good_path = temp_dir.path().join("good.xml");
        std::fs::write(&good_path, good_xml).unwrap();

        let mut catalog = CatalogResolver::new();
        let results = catalog.set_catalogs(&[&bad_path, &good_path]);
        assert!(!results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(catalog.resolve_system("urn:good:schema.xsd").is_some());
    }
}
