//! Per-document structural scan of a `<schema>` element
//!
//! Parses one schema document with the same `documents::Document` DOM the
//! teacher's `validators::parsing` module builds schemas from, and walks it
//! to collect global element, attribute, complex-type, and simple-type
//! declarations plus their content models. This is *not* a validating
//! parser: facets, identity constraints, and assertions are never built,
//! since this crate never validates instance values (spec §1).
//!
//! Local element and attribute names are qualified against the document's
//! `targetNamespace`, matching the `elementFormDefault="qualified"` /
//! `attributeFormDefault="qualified"` convention NIEM schemas always use;
//! unqualified-form schemas are a simplification this crate does not cover.

use std::collections::HashMap;

use crate::documents::{Document, Element, NamespaceDecl};
use crate::error::{Error, ParseError, Result};
use crate::namespaces::QName;
use crate::schema::model::{
    AttributeDecl, AttributeUse, Compositor, ComplexType, ElementDecl, Occurs, Particle,
    SimpleType, SimpleTypeKind,
};

const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// The result of scanning one `<schema>` document
#[derive(Debug, Clone, Default)]
pub struct RawSchemaUnit {
    /// The document's `targetNamespace`, empty string if chameleon/absent
    pub target_namespace: String,
    /// Namespace declarations found directly on the `<schema>` element
    pub namespace_decls: Vec<NamespaceDecl>,
    /// The raw `conformanceTargets`-family attribute: `(namespace, value)`
    pub conformance_targets_attr: Option<(String, String)>,
    /// Global element declarations, keyed by qualified name
    pub elements: HashMap<QName, ElementDecl>,
    /// Global attribute declarations, keyed by qualified name
    pub attributes: HashMap<QName, AttributeDecl>,
    /// Global complex type declarations, keyed by qualified name
    pub complex_types: HashMap<QName, ComplexType>,
    /// Global simple type declarations, keyed by qualified name
    pub simple_types: HashMap<QName, SimpleType>,
    /// `<xs:import>` directives found at the top of the document
    pub imports: Vec<Directive>,
    /// `<xs:include>` directives
    pub includes: Vec<Directive>,
    /// `<xs:redefine>` directives
    pub redefines: Vec<Directive>,
}

/// A schema-composition directive (`import`, `include`, or `redefine`)
#[derive(Debug, Clone)]
pub struct Directive {
    /// The declared `namespace` attribute, when present (`import` only)
    pub namespace: Option<String>,
    /// The declared `schemaLocation` attribute, when present
    pub schema_location: Option<String>,
    /// Source line of the directive element
    pub line: u32,
}

struct PrefixMap<'a> {
    prefix_to_uri: HashMap<&'a str, &'a str>,
}

impl<'a> PrefixMap<'a> {
    fn from_decls(decls: &'a [NamespaceDecl]) -> Self {
        let mut prefix_to_uri = HashMap::new();
        for decl in decls {
            prefix_to_uri.insert(decl.prefix.as_str(), decl.uri.as_str());
        }
        Self { prefix_to_uri }
    }

    fn resolve(&self, qualified: &str, default_ns: &str) -> QName {
        match qualified.split_once(':') {
            Some((prefix, local)) => {
                let ns = self.prefix_to_uri.get(prefix).copied().unwrap_or("");
                QName::namespaced(ns, local)
            }
            None => QName::namespaced(default_ns, qualified),
        }
    }
}

fn is_xsd(el: &Element, local_name: &str) -> bool {
    el.local_name() == local_name && el.namespace.as_deref() == Some(XSD_NS)
}

/// Scan one schema document's XML text into a [`RawSchemaUnit`]
pub fn scan(xml: &str) -> Result<RawSchemaUnit> {
    let doc = Document::from_string(xml)?;
    let root = doc
        .root()
        .ok_or_else(|| Error::Parse(ParseError::new("empty schema document")))?;

    if root.local_name() != "schema" || root.namespace.as_deref() != Some(XSD_NS) {
        return Err(Error::Parse(ParseError::new(format!(
            "expected <xs:schema> root element, found <{}>",
            root.local_name()
        ))));
    }

    let target_ns = root.get_attribute("targetNamespace").unwrap_or("").to_string();
    let namespace_decls = root.namespace_decls.clone();
    let prefixes = PrefixMap::from_decls(&namespace_decls);

    let conformance_targets_attr = root
        .attribute_with_ns_prefix("http://release.niem.gov/niem/conformanceTargets/")
        .filter(|a| a.local_name == "conformanceTargets")
        .map(|a| (a.namespace.clone().unwrap_or_default(), a.value.clone()));

    let mut unit = RawSchemaUnit {
        target_namespace: target_ns.clone(),
        namespace_decls,
        conformance_targets_attr,
        ..Default::default()
    };

    for child in &root.children {
        if !matches!(child.namespace.as_deref(), Some(XSD_NS)) {
            continue;
        }
        match child.local_name() {
            "element" => {
                let (decl, inline_ct) = parse_element(child, &target_ns, &prefixes);
                unit.elements.insert(decl.name.clone(), decl);
                if let Some(ct) = inline_ct {
                    if let Some(name) = ct.name.clone() {
                        unit.complex_types.insert(name, ct);
                    }
                }
            }
            "attribute" => {
                let decl = parse_attribute_decl(child, &target_ns, &prefixes);
                unit.attributes.insert(decl.name.clone(), decl);
            }
            "complexType" => {
                let ct = parse_complex_type(child, &target_ns, &prefixes);
                if let Some(name) = ct.name.clone() {
                    unit.complex_types.insert(name, ct);
                }
            }
            "simpleType" => {
                if let Some(st) = parse_simple_type(child, &target_ns, &prefixes) {
                    if let Some(name) = st.name.clone() {
                        unit.simple_types.insert(name, st);
                    }
                }
            }
            "import" => unit.imports.push(parse_directive(child, true)),
            "include" => unit.includes.push(parse_directive(child, false)),
            "redefine" => unit.redefines.push(parse_directive(child, false)),
            _ => {}
        }
    }

    Ok(unit)
}

fn parse_directive(el: &Element, has_namespace: bool) -> Directive {
    Directive {
        namespace: if has_namespace {
            el.get_attribute("namespace").map(|s| s.to_string())
        } else {
            None
        },
        schema_location: el.get_attribute("schemaLocation").map(|s| s.to_string()),
        line: el.line,
    }
}

fn occurs_of(el: &Element) -> Occurs {
    let min = el
        .get_attribute("minOccurs")
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(1);
    let max = match el.get_attribute("maxOccurs") {
        Some("unbounded") => None,
        Some(s) => s.parse::<u32>().ok().or(Some(1)),
        None => Some(1),
    };
    Occurs::new(min, max)
}

fn parse_element(
    el: &Element,
    target_ns: &str,
    prefixes: &PrefixMap,
) -> (ElementDecl, Option<ComplexType>) {
    let name = if let Some(n) = el.get_attribute("name") {
        QName::namespaced(target_ns, n)
    } else if let Some(r) = el.get_attribute("ref") {
        prefixes.resolve(r, target_ns)
    } else {
        QName::namespaced(target_ns, "")
    };

    let type_ref = el.get_attribute("type").map(|t| prefixes.resolve(t, target_ns));
    let substitution_group = el
        .get_attribute("substitutionGroup")
        .map(|sg| prefixes.resolve(sg, target_ns));

    let mut inline_simple_type = None;
    let mut inline_complex = None;

    for child in &el.children {
        if !matches!(child.namespace.as_deref(), Some(XSD_NS)) {
            continue;
        }
        match child.local_name() {
            "simpleType" => {
                inline_simple_type = parse_simple_type(child, target_ns, prefixes).map(|st| st.kind);
            }
            "complexType" => {
                let mut ct = parse_complex_type(child, target_ns, prefixes);
                ct.name = Some(name.clone());
                inline_complex = Some(ct);
            }
            _ => {}
        }
    }

    let decl = ElementDecl {
        name,
        type_ref,
        inline_simple_type,
        substitution_group,
        is_complex: inline_complex.is_some(),
    };

    (decl, inline_complex)
}

fn parse_attribute_decl(el: &Element, target_ns: &str, prefixes: &PrefixMap) -> AttributeDecl {
    let name = el
        .get_attribute("name")
        .map(|n| QName::namespaced(target_ns, n))
        .or_else(|| el.get_attribute("ref").map(|r| prefixes.resolve(r, target_ns)))
        .unwrap_or_else(|| QName::namespaced(target_ns, ""));

    let type_ref = el.get_attribute("type").map(|t| prefixes.resolve(t, target_ns));

    let inline_simple_type = el
        .children_named("simpleType")
        .next()
        .and_then(|c| parse_simple_type(c, target_ns, prefixes))
        .map(|st| st.kind);

    AttributeDecl {
        name,
        type_ref,
        inline_simple_type,
    }
}

fn parse_attribute_use(el: &Element, target_ns: &str, prefixes: &PrefixMap) -> AttributeUse {
    let decl = parse_attribute_decl(el, target_ns, prefixes);
    AttributeUse {
        name: decl.name,
        type_ref: decl.type_ref,
    }
}

fn parse_complex_type(el: &Element, target_ns: &str, prefixes: &PrefixMap) -> ComplexType {
    let mut ct = ComplexType {
        name: el.get_attribute("name").map(|n| QName::namespaced(target_ns, n)),
        ..Default::default()
    };

    for child in &el.children {
        if !matches!(child.namespace.as_deref(), Some(XSD_NS)) {
            continue;
        }
        match child.local_name() {
            "sequence" | "choice" | "all" => {
                ct.content = parse_group(child, target_ns, prefixes);
            }
            "attribute" => ct.attributes.push(parse_attribute_use(child, target_ns, prefixes)),
            "anyAttribute" => ct.has_attribute_wildcard = true,
            "simpleContent" | "complexContent" => {
                for grandchild in &child.children {
                    if !matches!(grandchild.namespace.as_deref(), Some(XSD_NS)) {
                        continue;
                    }
                    match grandchild.local_name() {
                        "extension" | "restriction" => {
                            if let Some(base) = grandchild.get_attribute("base") {
                                ct.simple_content_base = Some(prefixes.resolve(base, target_ns));
                            }
                            for gc in &grandchild.children {
                                if !matches!(gc.namespace.as_deref(), Some(XSD_NS)) {
                                    continue;
                                }
                                match gc.local_name() {
                                    "sequence" | "choice" | "all" => {
                                        ct.content = parse_group(gc, target_ns, prefixes);
                                    }
                                    "attribute" => {
                                        ct.attributes.push(parse_attribute_use(gc, target_ns, prefixes))
                                    }
                                    "anyAttribute" => ct.has_attribute_wildcard = true,
                                    _ => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    ct
}

fn parse_group(el: &Element, target_ns: &str, prefixes: &PrefixMap) -> Option<Particle> {
    let compositor = match el.local_name() {
        "choice" => Compositor::Choice,
        "all" => Compositor::All,
        _ => Compositor::Sequence,
    };
    let occurs = occurs_of(el);
    let mut particles = Vec::new();

    for child in &el.children {
        if !matches!(child.namespace.as_deref(), Some(XSD_NS)) {
            continue;
        }
        match child.local_name() {
            "element" => {
                let (decl, _) = parse_element(child, target_ns, prefixes);
                particles.push(Particle::Element {
                    name: decl.name,
                    occurs: occurs_of(child),
                });
            }
            "any" => particles.push(Particle::Wildcard {
                occurs: occurs_of(child),
            }),
            "sequence" | "choice" | "all" => {
                if let Some(p) = parse_group(child, target_ns, prefixes) {
                    particles.push(p);
                }
            }
            _ => {}
        }
    }

    if particles.is_empty() {
        None
    } else {
        Some(Particle::Group {
            compositor,
            particles,
            occurs,
        })
    }
}

fn parse_simple_type(el: &Element, target_ns: &str, prefixes: &PrefixMap) -> Option<SimpleType> {
    let name = el.get_attribute("name").map(|n| QName::namespaced(target_ns, n));

    for child in &el.children {
        if !matches!(child.namespace.as_deref(), Some(XSD_NS)) {
            continue;
        }
        match child.local_name() {
            "restriction" => {
                let base = child.get_attribute("base").map(|b| prefixes.resolve(b, target_ns));
                if let Some(base) = base {
                    return Some(SimpleType {
                        name,
                        kind: SimpleTypeKind::Atomic { base },
                    });
                }
            }
            "list" => {
                let item_type = child
                    .get_attribute("itemType")
                    .map(|t| prefixes.resolve(t, target_ns));
                if let Some(item_type) = item_type {
                    return Some(SimpleType {
                        name,
                        kind: SimpleTypeKind::List { item_type },
                    });
                }
            }
            "union" => {
                let member_types = child
                    .get_attribute("memberTypes")
                    .map(|s| {
                        s.split_whitespace()
                            .map(|t| prefixes.resolve(t, target_ns))
                            .collect()
                    })
                    .unwrap_or_default();
                return Some(SimpleType {
                    name,
                    kind: SimpleTypeKind::Union { member_types },
                });
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:j="urn:example:jxdm"
           targetNamespace="urn:example:jxdm"
           elementFormDefault="qualified">
  <xs:element name="ChargeDescriptionText" type="j:TextType"/>
  <xs:simpleType name="TextType">
    <xs:restriction base="xs:string"/>
  </xs:simpleType>
  <xs:complexType name="ChargeType">
    <xs:sequence>
      <xs:element ref="j:ChargeDescriptionText" minOccurs="0" maxOccurs="unbounded"/>
      <xs:any minOccurs="0"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:ID"/>
  </xs:complexType>
</xs:schema>"#;

    #[test]
    fn test_scan_captures_target_namespace() {
        let unit = scan(SAMPLE).unwrap();
        assert_eq!(unit.target_namespace, "urn:example:jxdm");
    }

    #[test]
    fn test_scan_captures_global_element() {
        let unit = scan(SAMPLE).unwrap();
        let name = QName::namespaced("urn:example:jxdm", "ChargeDescriptionText");
        let decl = unit.elements.get(&name).unwrap();
        assert_eq!(decl.type_ref.as_ref().unwrap().local_name, "TextType");
    }

    #[test]
    fn test_scan_detects_wildcard_in_complex_type() {
        let unit = scan(SAMPLE).unwrap();
        let name = QName::namespaced("urn:example:jxdm", "ChargeType");
        let ct = unit.complex_types.get(&name).unwrap();
        assert!(ct.content.as_ref().unwrap().contains_wildcard());
        assert_eq!(ct.attributes.len(), 1);
    }

    #[test]
    fn test_scan_captures_simple_type_restriction() {
        let unit = scan(SAMPLE).unwrap();
        let name = QName::namespaced("urn:example:jxdm", "TextType");
        let st = unit.simple_types.get(&name).unwrap();
        match &st.kind {
            SimpleTypeKind::Atomic { base } => {
                assert_eq!(base.namespace.as_deref(), Some(XSD_NS));
                assert_eq!(base.local_name, "string");
            }
            _ => panic!("expected atomic restriction"),
        }
    }

    #[test]
    fn test_scan_rejects_non_schema_root() {
        assert!(scan("<root/>").is_err());
    }

    #[test]
    fn test_scan_captures_import_directive() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:example:crash-driver" elementFormDefault="qualified">
  <xs:import namespace="urn:example:jxdm" schemaLocation="jxdm.xsd"/>
  <xs:include schemaLocation="shared.xsd"/>
</xs:schema>"#;
        let unit = scan(xml).unwrap();
        assert_eq!(unit.imports.len(), 1);
        assert_eq!(unit.imports[0].namespace.as_deref(), Some("urn:example:jxdm"));
        assert_eq!(unit.imports[0].schema_location.as_deref(), Some("jxdm.xsd"));
        assert_eq!(unit.includes.len(), 1);
        assert_eq!(unit.includes[0].schema_location.as_deref(), Some("shared.xsd"));
    }
}
