//! # Type Classifier
//!
//! Classifies a [`TypeExpr`] into a [`TypeShape`] — the closed vocabulary
//! the schema generator and codec engine dispatch on. Classification is a
//! pure function with no access to the registries: record, enum, and scalar
//! references are carried through by name and resolved downstream.
//!
//! ## Soft-Fail, Loud-Warn
//!
//! Unrecognized generic heads, malformed arity, and a misplaced variadic
//! marker classify to [`TypeShape::Opaque`] with a `tracing` warning rather
//! than an error. An unanticipated type declaration must never crash
//! schema generation; it degrades to an object schema and the warning makes
//! the degradation diagnosable.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expr::TypeExpr;

/// The four JSON primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    String,
    Integer,
    Boolean,
    Number,
}

impl PrimitiveKind {
    /// The JSON Schema `type` keyword value for this kind.
    pub fn json_type(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Number => "number",
        }
    }

    /// The primitive kind a JSON value belongs to, if any.
    ///
    /// Integers are distinguished from general numbers, matching the
    /// schema `type` split; null, arrays, and objects have no kind.
    pub fn of_value(value: &Value) -> Option<PrimitiveKind> {
        match value {
            Value::String(_) => Some(PrimitiveKind::String),
            Value::Bool(_) => Some(PrimitiveKind::Boolean),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(PrimitiveKind::Integer),
            Value::Number(_) => Some(PrimitiveKind::Number),
            _ => None,
        }
    }
}

/// The classified structural kind of a type expression.
///
/// Shapes form the dispatch alphabet of the whole engine: every schema
/// fragment and every codec plan is derived from a shape, and shape
/// identity (via [`TypeShape::cache_key`]) keys the codec cache.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    /// One of the four JSON primitives.
    Primitive(PrimitiveKind),
    /// A registry-backed scalar leaf, keyed by name.
    Scalar(String),
    /// A value that may be absent. Absence is encoded by omission, not
    /// by schema nullability.
    Optional(Box<TypeShape>),
    /// A value that may be the explicit wire `null`.
    Nullable(Box<TypeShape>),
    /// An ordered union; order is the encode/decode fallback order.
    Union(Vec<TypeShape>),
    /// A closed set of literal values.
    Literal(Vec<Value>),
    /// A registered enum type, by name.
    Enum(String),
    /// A mapping with typed keys and values.
    Mapping(Box<TypeShape>, Box<TypeShape>),
    /// An ordered sequence of one element type.
    Sequence(Box<TypeShape>),
    /// A fixed-length heterogeneous tuple.
    FixedTuple(Vec<TypeShape>),
    /// A tuple of any length with one element type.
    VariadicTuple(Box<TypeShape>),
    /// An unordered collection of unique elements.
    Set(Box<TypeShape>),
    /// A registered record type, by name.
    Record(String),
    /// A transparent newtype/final wrapper.
    Wrapped(Box<TypeShape>),
    /// The unconstrained "any" type.
    Any,
    /// An unrecognized declaration; carries a description for diagnostics.
    Opaque(String),
}

impl TypeShape {
    /// True if a field of this shape may be absent from the wire object.
    ///
    /// Looks through `Nullable` and `Wrapped`: nullability alone does not
    /// make a field optional, and wrappers are transparent.
    pub fn makes_field_optional(&self) -> bool {
        match self {
            TypeShape::Optional(_) => true,
            TypeShape::Nullable(inner) | TypeShape::Wrapped(inner) => {
                inner.makes_field_optional()
            }
            _ => false,
        }
    }

    /// True if `null` is a legal wire value for this shape.
    pub fn accepts_null(&self) -> bool {
        match self {
            TypeShape::Nullable(_) => true,
            TypeShape::Optional(inner) | TypeShape::Wrapped(inner) => inner.accepts_null(),
            TypeShape::Literal(values) => values.iter().any(Value::is_null),
            _ => false,
        }
    }

    /// A deterministic rendering of the shape, used as codec-cache identity.
    ///
    /// Two structurally equal shapes always render identically, so plans
    /// built for one declaration are shared by every other declaration of
    /// the same shape.
    pub fn cache_key(&self) -> String {
        match self {
            TypeShape::Primitive(kind) => format!("prim:{}", kind.json_type()),
            TypeShape::Scalar(name) => format!("scalar:{name}"),
            TypeShape::Optional(inner) => format!("opt<{}>", inner.cache_key()),
            TypeShape::Nullable(inner) => format!("nullable<{}>", inner.cache_key()),
            TypeShape::Union(variants) => {
                let keys: Vec<String> = variants.iter().map(TypeShape::cache_key).collect();
                format!("union<{}>", keys.join("|"))
            }
            TypeShape::Literal(values) => format!("lit:{}", Value::Array(values.clone())),
            TypeShape::Enum(name) => format!("enum:{name}"),
            TypeShape::Mapping(key, value) => {
                format!("map<{},{}>", key.cache_key(), value.cache_key())
            }
            TypeShape::Sequence(elem) => format!("seq<{}>", elem.cache_key()),
            TypeShape::FixedTuple(elems) => {
                let keys: Vec<String> = elems.iter().map(TypeShape::cache_key).collect();
                format!("tuple<{}>", keys.join(","))
            }
            TypeShape::VariadicTuple(elem) => format!("tuple*<{}>", elem.cache_key()),
            TypeShape::Set(elem) => format!("set<{}>", elem.cache_key()),
            TypeShape::Record(name) => format!("record:{name}"),
            TypeShape::Wrapped(inner) => format!("wrapped<{}>", inner.cache_key()),
            TypeShape::Any => "any".to_owned(),
            TypeShape::Opaque(desc) => format!("opaque:{desc}"),
        }
    }
}

/// Classify a type expression into its structural shape.
pub fn classify(expr: &TypeExpr) -> TypeShape {
    match expr {
        TypeExpr::Any => TypeShape::Any,
        TypeExpr::Literal(values) => TypeShape::Literal(values.clone()),
        TypeExpr::Record(name) => TypeShape::Record(name.clone()),
        TypeExpr::Enum(name) => TypeShape::Enum(name.clone()),
        TypeExpr::Named(name) => classify_named(name),
        TypeExpr::Rest => opaque("variadic marker outside a tuple"),
        TypeExpr::Generic(head, args) => classify_generic(head, args),
    }
}

fn classify_named(name: &str) -> TypeShape {
    match name {
        "String" | "str" => TypeShape::Primitive(PrimitiveKind::String),
        "Integer" | "int" | "i64" | "i32" | "u64" | "u32" => {
            TypeShape::Primitive(PrimitiveKind::Integer)
        }
        "Boolean" | "bool" => TypeShape::Primitive(PrimitiveKind::Boolean),
        "Number" | "float" | "f64" | "f32" => TypeShape::Primitive(PrimitiveKind::Number),
        other => TypeShape::Scalar(other.to_owned()),
    }
}

fn classify_generic(head: &str, args: &[TypeExpr]) -> TypeShape {
    match (head, args) {
        ("Option" | "Optional", [inner]) => {
            TypeShape::Optional(Box::new(classify(inner)))
        }
        ("Nullable", [inner]) => TypeShape::Nullable(Box::new(classify(inner))),
        ("Final" | "NewType", [inner]) => TypeShape::Wrapped(Box::new(classify(inner))),
        ("Union", variants) if variants.len() >= 2 => {
            TypeShape::Union(variants.iter().map(classify).collect())
        }
        ("Map" | "Mapping" | "Dict" | "HashMap" | "BTreeMap", [key, value]) => {
            TypeShape::Mapping(Box::new(classify(key)), Box::new(classify(value)))
        }
        ("Vec" | "List" | "Sequence", [elem]) => {
            TypeShape::Sequence(Box::new(classify(elem)))
        }
        ("Set" | "HashSet" | "BTreeSet", [elem]) => {
            TypeShape::Set(Box::new(classify(elem)))
        }
        ("Tuple", elems) if !elems.is_empty() => classify_tuple(elems),
        (head, args) => opaque(format!("{head} with {} argument(s)", args.len())),
    }
}

fn classify_tuple(elems: &[TypeExpr]) -> TypeShape {
    match elems {
        // The variadic form is exactly one element type plus the marker.
        [elem, TypeExpr::Rest] => TypeShape::VariadicTuple(Box::new(classify(elem))),
        _ if elems.iter().any(|e| matches!(e, TypeExpr::Rest)) => {
            opaque("variadic marker not in final tuple position")
        }
        _ => TypeShape::FixedTuple(elems.iter().map(classify).collect()),
    }
}

fn opaque(description: impl Into<String>) -> TypeShape {
    let description = description.into();
    tracing::warn!(
        shape = %description,
        "unrecognized type declaration; treating as an opaque object"
    );
    TypeShape::Opaque(description)
}
