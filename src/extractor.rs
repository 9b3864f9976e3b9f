//! Namespace Info Extractor (spec §4.5)
//!
//! After the schema has been assembled, each namespace's document carries a
//! synthetic annotation reproducing the `<schema>` element's namespace
//! declarations and `conformanceTargets`-family attribute. Rather than
//! re-parsing a simulated PSVI annotation, this extractor consumes the
//! capture the assembler already took during its single pass over each
//! document (`RawSchemaUnit::namespace_decls` /
//! `RawSchemaUnit::conformance_targets_attr`), grounded in the same
//! "per-namespace synthetic annotation" contract spec §4.5 describes.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::context_registry::canonical_prefix;
use crate::documents::NamespaceDecl;
use crate::model::{
    CONFORMANCE_TARGETS_NS_PREFIX, NDR_URI_PREFIX, NIEM_RELEASE_PREFIX, XSD_PROXY_NS_PREFIX,
};
use crate::schema::SchemaModel;

const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const APPINFO_NS_PREFIX: &str = "http://release.niem.gov/niem/appinfo/";

/// Which priority band an ordered namespace falls into (spec §4.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NamespaceBand {
    /// Has an NDR version, and is not a NIEM-release namespace
    Extension,
    /// URI falls under the NIEM-release namespace prefix
    NiemRelease,
    /// No conformance-target annotation (empty NDR version)
    External,
}

/// One entry in the extractor's ordered namespace list
#[derive(Debug, Clone)]
pub struct OrderedNamespace {
    /// The namespace URI
    pub uri: String,
    /// Which priority band it was placed in
    pub band: NamespaceBand,
}

/// The per-namespace declarations, conflict indices, and diagnostics
/// produced by walking the assembled schema's namespace annotations
#[derive(Debug, Clone, Default)]
pub struct NamespaceInfo {
    /// What each namespace's own schema document declared: ns -> (prefix -> uri)
    pub decls: HashMap<String, IndexMap<String, String>>,
    /// Inverse index for conflict detection: prefix -> (declaring-ns -> uri)
    pub prefix_to_ns_to_uri: HashMap<String, HashMap<String, String>>,
    /// Inverse index for conflict detection: uri -> [(prefix, declaring-ns)]
    pub uri_to_bindings: HashMap<String, Vec<(String, String)>>,
    /// NDR conformance-target version per namespace; empty string iff external
    pub ndr_version: HashMap<String, String>,
    /// General + domain warnings, in the order detected
    pub warnings: Vec<String>,
    /// The three-band ordered namespace list, spec §4.5
    pub ordered_namespaces: Vec<OrderedNamespace>,
}

fn is_skipped_uri(uri: &str) -> bool {
    uri == XSD_NS
        || uri == XSI_NS
        || uri.starts_with(APPINFO_NS_PREFIX)
        || uri.starts_with(CONFORMANCE_TARGETS_NS_PREFIX)
        || uri.starts_with(XSD_PROXY_NS_PREFIX)
}

/// Extract NDR version, prefix declarations, and conflict diagnostics from
/// an assembled schema's per-document captures
pub fn extract(model: &SchemaModel, suppress_domain_warnings: bool) -> NamespaceInfo {
    let mut info = NamespaceInfo::default();

    for unit in &model.units {
        let ns = unit.target_namespace.clone();
        if ns.is_empty() {
            continue;
        }

        let version = ndr_version_of(&unit.conformance_targets_attr);
        info.ndr_version.insert(ns.clone(), version);

        let decl_map = info.decls.entry(ns.clone()).or_default();
        for NamespaceDecl { prefix, uri } in &unit.namespace_decls {
            if prefix.is_empty() || is_skipped_uri(uri) {
                continue;
            }
            decl_map.insert(prefix.clone(), uri.clone());
            info.prefix_to_ns_to_uri
                .entry(prefix.clone())
                .or_default()
                .insert(ns.clone(), uri.clone());
            info.uri_to_bindings
                .entry(uri.clone())
                .or_default()
                .push((prefix.clone(), ns.clone()));
        }
    }

    detect_general_warnings(&mut info);
    if !suppress_domain_warnings {
        detect_domain_warnings(&mut info);
    }
    info.ordered_namespaces = order_namespaces(&info);

    info
}

fn ndr_version_of(attr: &Option<(String, String)>) -> String {
    let Some((ns, value)) = attr else {
        return String::new();
    };
    if !ns.starts_with(CONFORMANCE_TARGETS_NS_PREFIX) {
        return String::new();
    }

    for token in value.split_whitespace() {
        if let Some(rest) = token.strip_prefix(NDR_URI_PREFIX) {
            let segment = rest.split('/').next().unwrap_or("");
            if !segment.is_empty() {
                return segment.to_string();
            }
        }
    }
    String::new()
}

fn detect_general_warnings(info: &mut NamespaceInfo) {
    let mut prefix_multi: Vec<&String> = info
        .prefix_to_ns_to_uri
        .iter()
        .filter(|(_, by_ns)| {
            let mut uris: Vec<&String> = by_ns.values().collect();
            uris.sort();
            uris.dedup();
            uris.len() > 1
        })
        .map(|(p, _)| p)
        .collect();
    prefix_multi.sort();
    for prefix in prefix_multi {
        info.warnings.push(format!(
            "prefix '{}' is mapped to multiple namespace URIs",
            prefix
        ));
    }

    let mut uri_multi: Vec<&String> = info
        .uri_to_bindings
        .iter()
        .filter(|(_, bindings)| {
            let mut prefixes: Vec<&String> = bindings.iter().map(|(p, _)| p).collect();
            prefixes.sort();
            prefixes.dedup();
            prefixes.len() > 1
        })
        .map(|(u, _)| u)
        .collect();
    uri_multi.sort();
    for uri in uri_multi {
        info.warnings
            .push(format!("namespace '{}' is mapped to multiple prefixes", uri));
    }
}

fn detect_domain_warnings(info: &mut NamespaceInfo) {
    let mut uris: Vec<&String> = info.uri_to_bindings.keys().collect();
    uris.sort();
    for uri in uris {
        let canonical = canonical_prefix(uri);
        if canonical.is_empty() {
            continue;
        }
        let bindings = &info.uri_to_bindings[uri];
        if bindings.iter().any(|(p, _)| p != canonical) {
            info.warnings.push(format!(
                "namespace '{}' has well-known prefix '{}' but is bound under a different prefix in the schema",
                uri, canonical
            ));
        }
    }

    let mut externals: Vec<&String> = info
        .ndr_version
        .iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(ns, _)| ns)
        .collect();
    externals.sort();
    for ns in externals {
        info.warnings
            .push(format!("namespace '{}' is external (no conformance-target annotation)", ns));
    }
}

fn order_namespaces(info: &NamespaceInfo) -> Vec<OrderedNamespace> {
    let mut entries: Vec<OrderedNamespace> = info
        .ndr_version
        .keys()
        .map(|uri| {
            let version = info.ndr_version.get(uri).map(|s| s.as_str()).unwrap_or("");
            let band = if !version.is_empty() && !uri.starts_with(NIEM_RELEASE_PREFIX) {
                NamespaceBand::Extension
            } else if uri.starts_with(NIEM_RELEASE_PREFIX) {
                NamespaceBand::NiemRelease
            } else {
                NamespaceBand::External
            };
            OrderedNamespace {
                uri: uri.clone(),
                band,
            }
        })
        .collect();

    entries.sort_by(|a, b| a.band.cmp(&b.band).then_with(|| a.uri.cmp(&b.uri)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::raw::scan;

    const EXT_SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:exch="http://example.com/CrashDriver/1.0/"
           xmlns:nc="http://release.niem.gov/niem/niem-core/4.0/"
           xmlns:ct="http://release.niem.gov/niem/conformanceTargets/3.0/"
           targetNamespace="http://example.com/CrashDriver/1.0/"
           elementFormDefault="qualified"
           ct:conformanceTargets="http://reference.niem.gov/niem/specification/naming-and-design-rules/4.0/#ExtensionSchema">
  <xs:element name="Root" type="xs:string"/>
</xs:schema>"#;

    const CORE_SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:nc="http://release.niem.gov/niem/niem-core/4.0/"
           targetNamespace="http://release.niem.gov/niem/niem-core/4.0/"
           elementFormDefault="qualified">
  <xs:element name="PersonName" type="xs:string"/>
</xs:schema>"#;

    #[test]
    fn test_ndr_version_extracted() {
        let unit = scan(EXT_SCHEMA).unwrap();
        let model = SchemaModel::from_units(vec![unit]);
        let info = extract(&model, false);
        assert_eq!(
            info.ndr_version.get("http://example.com/CrashDriver/1.0/"),
            Some(&"4.0".to_string())
        );
    }

    #[test]
    fn test_external_namespace_has_empty_version() {
        let core = scan(CORE_SCHEMA).unwrap();
        let model = SchemaModel::from_units(vec![core]);
        let info = extract(&model, false);
        assert_eq!(
            info.ndr_version
                .get("http://release.niem.gov/niem/niem-core/4.0/"),
            Some(&"".to_string())
        );
        assert!(info
            .warnings
            .iter()
            .any(|w| w.contains("is external")));
    }

    #[test]
    fn test_prefix_map_skip_rule_excludes_xsd_and_conformance_targets() {
        let unit = scan(EXT_SCHEMA).unwrap();
        let model = SchemaModel::from_units(vec![unit]);
        let info = extract(&model, false);
        let decls = &info.decls["http://example.com/CrashDriver/1.0/"];
        assert!(!decls.contains_key("xs"));
        assert!(!decls.contains_key("ct"));
        assert!(decls.contains_key("nc"));
        assert!(decls.contains_key("exch"));
    }

    #[test]
    fn test_ordered_namespace_bands() {
        let ext = scan(EXT_SCHEMA).unwrap();
        let core = scan(CORE_SCHEMA).unwrap();
        let model = SchemaModel::from_units(vec![ext, core]);
        let info = extract(&model, false);
        let bands: Vec<(String, NamespaceBand)> = info
            .ordered_namespaces
            .iter()
            .map(|o| (o.uri.clone(), o.band))
            .collect();
        assert_eq!(
            bands[0],
            (
                "http://example.com/CrashDriver/1.0/".to_string(),
                NamespaceBand::Extension
            )
        );
        assert_eq!(
            bands[1],
            (
                "http://release.niem.gov/niem/niem-core/4.0/".to_string(),
                NamespaceBand::NiemRelease
            )
        );
    }

    #[test]
    fn test_suppress_domain_warnings() {
        let core = scan(CORE_SCHEMA).unwrap();
        let model = SchemaModel::from_units(vec![core]);
        let info = extract(&model, true);
        assert!(info.warnings.is_empty());
    }
}
