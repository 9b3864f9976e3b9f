//! Schema Compiler (spec §4.6)
//!
//! Turns the merged [`SchemaModel`] plus the extractor's namespace info into
//! the four/five [`TranslationModel`] tables: seed the RDF prefix, walk the
//! ordered namespace list assigning bindings (band order + Context
//! Registry precedence does the rest via [`NamespaceBindings::assign`]'s
//! synthesis rule), classify external namespaces, detect wildcards, and
//! compile per-component base-type tokens.

use crate::extractor::NamespaceInfo;
use crate::model::{RDF_NAMESPACE, TranslationModel};
use crate::namespaces::NamespaceBindings;
use crate::schema::SchemaModel;

/// Compile a [`TranslationModel`] from a merged schema and its extracted
/// namespace info (spec §4.6, steps 1-8)
pub fn compile(schema: &SchemaModel, ns_info: &NamespaceInfo) -> TranslationModel {
    let mut bindings = NamespaceBindings::new();
    bindings.assign(RDF_NAMESPACE, "rdf");

    for ordered in &ns_info.ordered_namespaces {
        if let Some(decls) = ns_info.decls.get(&ordered.uri) {
            for (prefix, uri) in decls {
                bindings.assign(uri.clone(), prefix.clone());
            }
        }
    }

    let mut model = TranslationModel::default();

    for (name, decl) in &schema.elements {
        // An element is a "simple element" if it is directly simple (an
        // inline simple type, or a type reference that resolves through
        // simple types / built-ins), or complex with simple content (an
        // inline complex type whose own simple-content base resolves, or a
        // named complex type reference -- `type_token` already walks that
        // chain for us).
        let simple_base = if let Some(inline) = &decl.inline_simple_type {
            schema.simple_type_token_of(inline)
        } else if let Some(type_ref) = &decl.type_ref {
            schema.type_token(type_ref)
        } else if decl.is_complex {
            schema
                .complex_types
                .get(name)
                .and_then(|ct| ct.simple_content_base.as_ref())
                .and_then(|base| schema.type_token(base))
        } else {
            None
        };

        if let Some(token) = simple_base {
            model
                .simple_element_type
                .insert(name.component_iri(), token);
        }
    }

    for (name, decl) in &schema.attributes {
        let token = if let Some(inline) = &decl.inline_simple_type {
            schema.simple_type_token_of(inline)
        } else {
            decl.type_ref.as_ref().and_then(|t| schema.type_token(t))
        };
        if let Some(token) = token {
            model.attribute_type.insert(name.component_iri(), token);
        }
    }

    for (uri, version) in &ns_info.ndr_version {
        if version.is_empty() {
            model.external_namespaces.push(uri.clone());
        }
    }
    model.external_namespaces.sort();

    model.has_wildcard = schema.has_wildcard();

    model.context_bindings = bindings
        .iter()
        .map(|(p, u)| (p.to_string(), u.to_string()))
        .collect();

    model
}
