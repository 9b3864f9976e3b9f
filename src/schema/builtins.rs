//! XML-Schema built-in primitive type names
//!
//! Trimmed from the teacher's `validators::builtins` (which carries facet
//! validators for every derived type) down to the fixed, exhaustive base-type
//! token vocabulary the compiler emits (spec §3, §6): names only, no value
//! validation — validating instance *values* against facets is out of scope.

/// The XSD namespace URI
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// The fixed, exhaustive set of base-type tokens the compiler may emit.
/// Order matches the integer family as listed in spec §3/§6.
pub const PRIMITIVE_TOKENS: &[&str] = &[
    "string",
    "token",
    "boolean",
    "decimal",
    "double",
    "float",
    "integer",
    "nonNegativeInteger",
    "positiveInteger",
    "negativeInteger",
    "nonPositiveInteger",
    "long",
    "int",
    "short",
    "byte",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
];

/// True if `local_name` names one of the fixed base-type tokens
pub fn is_primitive(local_name: &str) -> bool {
    PRIMITIVE_TOKENS.contains(&local_name)
}

/// The built-in XSD type that a derived primitive ultimately restricts,
/// for the purpose of value coercion (spec §6's integer family collapses
/// onto a handful of Rust-level numeric shapes in `translator::coerce`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionClass {
    /// `string`, `token`, and anything with no narrower coercion
    String,
    /// `boolean`
    Boolean,
    /// `decimal` and the entire derived-integer family
    Decimal,
    /// `double`
    Double,
    /// `float`
    Float,
}

/// Classify a base-type token for coercion purposes
pub fn coercion_class(token: &str) -> CoercionClass {
    match token {
        "boolean" => CoercionClass::Boolean,
        "double" => CoercionClass::Double,
        "float" => CoercionClass::Float,
        "decimal" | "integer" | "nonNegativeInteger" | "positiveInteger" | "negativeInteger"
        | "nonPositiveInteger" | "long" | "int" | "short" | "byte" | "unsignedLong"
        | "unsignedInt" | "unsignedShort" | "unsignedByte" => CoercionClass::Decimal,
        _ => CoercionClass::String,
    }
}
