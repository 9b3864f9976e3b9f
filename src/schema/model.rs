//! The non-validating structural schema model
//!
//! Shares its component vocabulary with the teacher's
//! `validators::{elements, attributes, complex_types, simple_types,
//! particles}` — `XsdElement`, `XsdAttribute`, the complex/simple type
//! split, `Particle`/`Occurs` — but keeps only enough shape to compile a
//! [`crate::model::TranslationModel`]: no facets, assertions, or identity
//! constraints, since those validate instance *values*, which is out of
//! scope (spec §1).

use crate::namespaces::QName;

/// Occurrence bounds for a particle (`minOccurs`, `maxOccurs`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences
    pub min: u32,
    /// Maximum number of occurrences (`None` = unbounded)
    pub max: Option<u32>,
}

impl Default for Occurs {
    fn default() -> Self {
        Self { min: 1, max: Some(1) }
    }
}

impl Occurs {
    /// `(min, max)` occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }
}

/// The compositor of a model group (`<sequence>`, `<choice>`, `<all>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compositor {
    /// `<xs:sequence>`
    Sequence,
    /// `<xs:choice>`
    Choice,
    /// `<xs:all>`
    All,
}

/// One term of a content model
#[derive(Debug, Clone)]
pub enum Particle {
    /// A reference to a global element, or an inline local element
    Element {
        /// Qualified name of the element (target namespace + local name)
        name: QName,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// `<xs:any>` — a wildcard term
    Wildcard {
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// A nested model group
    Group {
        /// The group's compositor
        compositor: Compositor,
        /// Member particles, in document order
        particles: Vec<Particle>,
        /// Occurrence bounds on the group itself
        occurs: Occurs,
    },
}

impl Particle {
    /// True if this particle, or anything nested beneath it, is a wildcard
    pub fn contains_wildcard(&self) -> bool {
        match self {
            Particle::Wildcard { .. } => true,
            Particle::Element { .. } => false,
            Particle::Group { particles, .. } => {
                particles.iter().any(Particle::contains_wildcard)
            }
        }
    }
}

/// The value-space shape of a simple type
#[derive(Debug, Clone)]
pub enum SimpleTypeKind {
    /// A restriction of another (possibly built-in) simple type
    Atomic {
        /// The base type being restricted
        base: QName,
    },
    /// A list of items of `item_type`
    List {
        /// The member item type
        item_type: QName,
    },
    /// A union of member types; treated as its first member for coercion
    Union {
        /// Member types, in declaration order
        member_types: Vec<QName>,
    },
}

/// A named or anonymous simple type declaration
#[derive(Debug, Clone)]
pub struct SimpleType {
    /// Qualified name, when this is a global declaration
    pub name: Option<QName>,
    /// The type's value-space shape
    pub kind: SimpleTypeKind,
}

/// A complex type declaration
#[derive(Debug, Clone, Default)]
pub struct ComplexType {
    /// Qualified name, when this is a global declaration
    pub name: Option<QName>,
    /// The content model, if the type has element content
    pub content: Option<Particle>,
    /// Attribute uses declared directly on this type
    pub attributes: Vec<AttributeUse>,
    /// True if the type carries an `<xs:anyAttribute>` wildcard
    pub has_attribute_wildcard: bool,
    /// Simple content base, for types deriving from a simple type
    /// (`<xs:simpleContent><xs:extension base="...">`)
    pub simple_content_base: Option<QName>,
}

/// An attribute use within a complex type
#[derive(Debug, Clone)]
pub struct AttributeUse {
    /// Qualified name of the attribute
    pub name: QName,
    /// The attribute's declared type, when directly typed
    pub type_ref: Option<QName>,
}

/// A global or local element declaration
#[derive(Debug, Clone)]
pub struct ElementDecl {
    /// Qualified name of the element
    pub name: QName,
    /// Named type reference (`type="..."`), if any
    pub type_ref: Option<QName>,
    /// Inline anonymous simple type, if any
    pub inline_simple_type: Option<SimpleTypeKind>,
    /// Substitution-group head, if this element heads or joins one
    pub substitution_group: Option<QName>,
    /// True if this declaration is itself a complex type (vs. simple content)
    pub is_complex: bool,
}

/// A global attribute declaration
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    /// Qualified name of the attribute
    pub name: QName,
    /// Named type reference (`type="..."`), if any
    pub type_ref: Option<QName>,
    /// Inline anonymous simple type, if any
    pub inline_simple_type: Option<SimpleTypeKind>,
}
