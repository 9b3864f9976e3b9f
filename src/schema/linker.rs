//! Merges per-document [`RawSchemaUnit`]s into one [`SchemaModel`]
//!
//! Where the teacher's `validators::globals::XsdGlobals` mediates lookups
//! across schemas once each document is fully validated, this linker skips
//! validation and just unions the global declaration maps — later units
//! win on a name collision, matching last-assembled-wins for redefine-style
//! overrides (spec's XML-Schema engine is assumed to have already resolved
//! `redefine` before this stage sees the components).

use std::collections::HashMap;

use crate::namespaces::QName;
use crate::schema::builtins;
use crate::schema::model::{AttributeDecl, ComplexType, ElementDecl, Particle, SimpleType, SimpleTypeKind};
use crate::schema::raw::RawSchemaUnit;

/// The merged, queryable schema model for one assembled schema
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    /// Global element declarations, keyed by qualified name
    pub elements: HashMap<QName, ElementDecl>,
    /// Global attribute declarations, keyed by qualified name
    pub attributes: HashMap<QName, AttributeDecl>,
    /// Global complex type declarations, keyed by qualified name
    pub complex_types: HashMap<QName, ComplexType>,
    /// Global simple type declarations, keyed by qualified name
    pub simple_types: HashMap<QName, SimpleType>,
    /// Every document's raw scan, retained for namespace-info extraction
    pub units: Vec<RawSchemaUnit>,
}

impl SchemaModel {
    /// Merge a set of per-document scans into a single model
    pub fn from_units(units: Vec<RawSchemaUnit>) -> Self {
        let mut model = SchemaModel::default();
        for unit in &units {
            for (k, v) in &unit.elements {
                model.elements.insert(k.clone(), v.clone());
            }
            for (k, v) in &unit.attributes {
                model.attributes.insert(k.clone(), v.clone());
            }
            for (k, v) in &unit.complex_types {
                model.complex_types.insert(k.clone(), v.clone());
            }
            for (k, v) in &unit.simple_types {
                model.simple_types.insert(k.clone(), v.clone());
            }
        }
        model.units = units;
        model
    }

    /// True if any complex type in the model contains an element or
    /// attribute wildcard term
    pub fn has_wildcard(&self) -> bool {
        self.complex_types.values().any(|ct| {
            ct.has_attribute_wildcard
                || ct
                    .content
                    .as_ref()
                    .map(Particle::contains_wildcard)
                    .unwrap_or(false)
        })
    }

    /// Resolve the base-type token for a type reference, walking the
    /// restriction/extension/list derivation chain down to a built-in
    /// primitive (spec §3's base-type token, §8 invariant 5).
    ///
    /// Returns `None` on an unresolvable or cyclic reference.
    pub fn type_token(&self, type_ref: &QName) -> Option<String> {
        self.type_token_inner(type_ref, 0)
    }

    fn type_token_inner(&self, type_ref: &QName, depth: usize) -> Option<String> {
        if depth > 64 {
            return None;
        }

        if type_ref.namespace.as_deref() == Some(builtins::XSD_NAMESPACE) {
            return if builtins::is_primitive(&type_ref.local_name) {
                Some(type_ref.local_name.clone())
            } else {
                // A derived built-in (e.g. xs:normalizedString) not in the
                // fixed primitive set collapses to its nearest ancestor;
                // lacking the full XSD built-in hierarchy, treat as string.
                Some("string".to_string())
            };
        }

        if let Some(st) = self.simple_types.get(type_ref) {
            return self.simple_type_kind_token(&st.kind, depth);
        }

        if let Some(ct) = self.complex_types.get(type_ref) {
            if let Some(base) = &ct.simple_content_base {
                return self.type_token_inner(base, depth + 1);
            }
        }

        None
    }

    fn simple_type_kind_token(&self, kind: &SimpleTypeKind, depth: usize) -> Option<String> {
        match kind {
            SimpleTypeKind::Atomic { base } => self.type_token_inner(base, depth + 1),
            SimpleTypeKind::List { item_type } => {
                let item_token = self.type_token_inner(item_type, depth + 1)?;
                Some(format!("list/{}", item_token))
            }
            SimpleTypeKind::Union { member_types } => {
                member_types.first().and_then(|t| self.type_token_inner(t, depth + 1))
            }
        }
    }

    /// Resolve the base-type token for an inline (anonymous) simple type
    /// declaration, such as an element or attribute's directly nested
    /// `<xs:simpleType>` (spec §4.6 step 5, applied to inline types).
    pub fn simple_type_token_of(&self, kind: &SimpleTypeKind) -> Option<String> {
        self.simple_type_kind_token(kind, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::raw::scan;

    #[test]
    fn test_type_token_resolves_through_restriction_chain() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:ex" elementFormDefault="qualified">
  <xs:simpleType name="PositiveAmount">
    <xs:restriction base="xs:nonNegativeInteger"/>
  </xs:simpleType>
</xs:schema>"#;
        let unit = scan(xml).unwrap();
        let model = SchemaModel::from_units(vec![unit]);
        let type_ref = QName::namespaced("urn:ex", "PositiveAmount");
        assert_eq!(model.type_token(&type_ref).unwrap(), "nonNegativeInteger");
    }

    #[test]
    fn test_type_token_list_of_decimal() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:ex" elementFormDefault="qualified">
  <xs:simpleType name="DecimalList">
    <xs:list itemType="xs:decimal"/>
  </xs:simpleType>
</xs:schema>"#;
        let unit = scan(xml).unwrap();
        let model = SchemaModel::from_units(vec![unit]);
        let type_ref = QName::namespaced("urn:ex", "DecimalList");
        assert_eq!(model.type_token(&type_ref).unwrap(), "list/decimal");
    }

    #[test]
    fn test_has_wildcard_detects_any() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:ex" elementFormDefault="qualified">
  <xs:complexType name="OpenType">
    <xs:sequence>
      <xs:any minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;
        let unit = scan(xml).unwrap();
        let model = SchemaModel::from_units(vec![unit]);
        assert!(model.has_wildcard());
    }
}
