//! A non-validating structural schema model
//!
//! Stands in for the "XML-Schema engine exposing a post-validation info
//! set" the data model assumes is available externally (spec §9): this
//! crate has no such engine, so it builds just enough of one — global
//! element/attribute/type declarations, particle trees, wildcard detection,
//! and base-type derivation — grounded in the teacher's
//! `validators::{globals, elements, complex_types, simple_types, particles,
//! wildcards, builtins}` but stripped of everything that validates instance
//! *values* (facets, identity constraints, assertions), which is out of
//! scope (spec §1).

pub mod builtins;
pub mod linker;
pub mod model;
pub mod raw;

pub use linker::SchemaModel;
pub use raw::{scan, RawSchemaUnit};
