//! # Type Expressions
//!
//! `TypeExpr` is the input language of the type classifier: a resolved,
//! syntax-level description of a field's declared type, supplied by record
//! descriptors. Record and enum references are explicit variants — the
//! descriptor service resolves forward references before handing
//! expressions to the engine, so nothing here is lazy or self-referential.
//!
//! Constructor helpers (`TypeExpr::option`, `TypeExpr::union`, ...) build
//! the canonical spellings; the classifier additionally accepts common
//! synonyms (`List` for `Vec`, `Dict` for `Map`, `NewType` for `Final`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical scalar type names for the built-in codecs.
///
/// These are the keys under which the codec registry seeds its built-ins;
/// custom scalars may use any name not claimed by a JSON primitive.
pub mod scalar_names {
    /// RFC 3339 timestamps.
    pub const DATETIME: &str = "DateTime";
    /// Canonical hyphenated UUIDs.
    pub const UUID: &str = "Uuid";
    /// Arbitrary-precision decimals carried as JSON numbers.
    pub const DECIMAL: &str = "Decimal";
    /// IPv4 addresses in dotted-quad form.
    pub const IPV4: &str = "Ipv4Addr";
    /// IPv6 addresses in canonical form.
    pub const IPV6: &str = "Ipv6Addr";
}

/// A resolved type expression as declared on a record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// A named leaf type: a JSON primitive (`"String"`, `"Integer"`,
    /// `"Boolean"`, `"Number"`) or a registered scalar (`"Uuid"`, ...).
    Named(String),
    /// A generic application: head name plus ordered arguments,
    /// e.g. `Generic("Vec", [Named("String")])`.
    Generic(String, Vec<TypeExpr>),
    /// Reference to a registered record type by schema name.
    Record(String),
    /// Reference to a registered enum type by schema name.
    Enum(String),
    /// An inline set of literal values, any JSON primitive including null.
    Literal(Vec<Value>),
    /// The unconstrained "any" type.
    Any,
    /// The variadic marker; legal only as the final argument of a `Tuple`.
    Rest,
}

impl TypeExpr {
    /// JSON string primitive.
    pub fn string() -> Self {
        TypeExpr::Named("String".to_owned())
    }

    /// JSON integer primitive.
    pub fn integer() -> Self {
        TypeExpr::Named("Integer".to_owned())
    }

    /// JSON boolean primitive.
    pub fn boolean() -> Self {
        TypeExpr::Named("Boolean".to_owned())
    }

    /// JSON number primitive.
    pub fn number() -> Self {
        TypeExpr::Named("Number".to_owned())
    }

    /// A named scalar type resolved through the codec registry.
    pub fn scalar(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    /// The built-in RFC 3339 timestamp scalar.
    pub fn datetime() -> Self {
        Self::scalar(scalar_names::DATETIME)
    }

    /// The built-in UUID scalar.
    pub fn uuid() -> Self {
        Self::scalar(scalar_names::UUID)
    }

    /// The built-in decimal scalar.
    pub fn decimal() -> Self {
        Self::scalar(scalar_names::DECIMAL)
    }

    /// The built-in IPv4 address scalar.
    pub fn ipv4() -> Self {
        Self::scalar(scalar_names::IPV4)
    }

    /// The built-in IPv6 address scalar.
    pub fn ipv6() -> Self {
        Self::scalar(scalar_names::IPV6)
    }

    /// Reference to a registered record type.
    pub fn record(name: impl Into<String>) -> Self {
        TypeExpr::Record(name.into())
    }

    /// Reference to a registered enum type.
    pub fn enumeration(name: impl Into<String>) -> Self {
        TypeExpr::Enum(name.into())
    }

    /// An inline literal-value set.
    pub fn literal(values: Vec<Value>) -> Self {
        TypeExpr::Literal(values)
    }

    /// An optional type: absence of the value, not schema nullability.
    pub fn option(inner: TypeExpr) -> Self {
        TypeExpr::Generic("Option".to_owned(), vec![inner])
    }

    /// The explicit nullability wrapper: the wire value may be `null`.
    pub fn nullable(inner: TypeExpr) -> Self {
        TypeExpr::Generic("Nullable".to_owned(), vec![inner])
    }

    /// An ordered union of two or more variants.
    pub fn union(variants: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic("Union".to_owned(), variants)
    }

    /// A transparent newtype/final wrapper around another type.
    pub fn wrapped(inner: TypeExpr) -> Self {
        TypeExpr::Generic("Final".to_owned(), vec![inner])
    }

    /// A mapping with typed keys and values.
    pub fn mapping(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Generic("Map".to_owned(), vec![key, value])
    }

    /// An ordered sequence.
    pub fn sequence(elem: TypeExpr) -> Self {
        TypeExpr::Generic("Vec".to_owned(), vec![elem])
    }

    /// A set: unordered, unique elements.
    pub fn set(elem: TypeExpr) -> Self {
        TypeExpr::Generic("Set".to_owned(), vec![elem])
    }

    /// A fixed-length heterogeneous tuple.
    pub fn tuple(elems: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic("Tuple".to_owned(), elems)
    }

    /// A variadic tuple: any number of elements of one type.
    pub fn variadic_tuple(elem: TypeExpr) -> Self {
        TypeExpr::Generic("Tuple".to_owned(), vec![elem, TypeExpr::Rest])
    }

    /// The unconstrained "any" type.
    pub fn any() -> Self {
        TypeExpr::Any
    }
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Generic(head, args) => {
                write!(f, "{head}[")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("]")
            }
            TypeExpr::Record(name) => write!(f, "record {name}"),
            TypeExpr::Enum(name) => write!(f, "enum {name}"),
            TypeExpr::Literal(values) => {
                f.write_str("Literal[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            TypeExpr::Any => f.write_str("Any"),
            TypeExpr::Rest => f.write_str("..."),
        }
    }
}
