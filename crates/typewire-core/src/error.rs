//! # Error Types
//!
//! The error hierarchy for schema generation and the wire codecs. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations, one enum per concern plus the top-level
//! [`TypewireError`] wrapper.
//!
//! Validation failures carry structured violations — the instance path,
//! the schema path, and a message per violation — so callers can report
//! exactly which field broke which constraint.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Top-level error type for the Typewire engine.
#[derive(Error, Debug)]
pub enum TypewireError {
    /// Encoding a value to its wire form failed.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Decoding a wire value failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Schema generation failed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Type registration was rejected.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Error while encoding a value to its wire form.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The value does not fit the declared shape.
    #[error("cannot encode {found} value where {expected} was declared")]
    TypeMismatch {
        /// Description of the declared shape.
        expected: String,
        /// Label of the value actually supplied.
        found: &'static str,
    },

    /// A record value of the wrong type was supplied.
    #[error("record value of type '{found}' supplied where '{expected}' was declared")]
    RecordMismatch {
        /// Declared record type.
        expected: String,
        /// Type of the supplied record value.
        found: String,
    },

    /// No union variant accepted the value.
    #[error("no union variant matched a {found} value")]
    NoUnionVariant {
        /// Label of the value that matched nothing.
        found: &'static str,
    },

    /// An enum value names a member the enum does not declare.
    #[error("enum '{enum_name}' has no member '{member}'")]
    UnknownEnumMember {
        /// The enum type.
        enum_name: String,
        /// The undeclared member name.
        member: String,
    },

    /// The record type is not registered.
    #[error("unknown record type '{0}'")]
    UnknownRecord(String),

    /// The enum type is not registered.
    #[error("unknown enum type '{0}'")]
    UnknownEnum(String),

    /// A scalar codec rejected the value.
    #[error("scalar codec '{scalar}' failed: {reason}")]
    Scalar {
        /// Registry name of the codec.
        scalar: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A map key encoded to a wire value that cannot become an object key.
    #[error("map key encoded to {found}, which cannot be an object key")]
    NonScalarMapKey {
        /// Label of the encoded key value.
        found: &'static str,
    },

    /// The encoded output failed validation against the record's schema.
    #[error("encoded value failed schema validation: {0}")]
    Validation(#[from] ValidationFailure),

    /// Schema generation failed while preparing validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// JSON string serialization failed.
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error while decoding a wire value.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The wire value does not fit the declared shape.
    #[error("cannot decode {found} value where {expected} was declared")]
    TypeMismatch {
        /// Description of the declared shape.
        expected: String,
        /// JSON type label of the wire value.
        found: &'static str,
    },

    /// No union variant accepted the wire value.
    #[error("no union variant accepted the wire value: {value}")]
    UnionExhausted {
        /// The rejected wire value.
        value: Value,
    },

    /// Strict-mode decode met a value outside the enum's members.
    #[error("value {value} is not a member of enum '{enum_name}'")]
    UnknownEnumMember {
        /// The enum type.
        enum_name: String,
        /// The unrecognized wire value.
        value: Value,
    },

    /// A required field is missing from the wire object.
    #[error("record '{record}' is missing required field '{field}'")]
    MissingField {
        /// The record being decoded.
        record: String,
        /// The missing field's name.
        field: String,
    },

    /// A discriminator named a subtype that was never registered.
    #[error("discriminator value '{tag}' names no registered subtype of '{base}'")]
    UnknownSubtype {
        /// The declared base record.
        base: String,
        /// The unrecognized discriminator value.
        tag: String,
    },

    /// The record type is not registered.
    #[error("unknown record type '{0}'")]
    UnknownRecord(String),

    /// The enum type is not registered.
    #[error("unknown enum type '{0}'")]
    UnknownEnum(String),

    /// A scalar codec rejected the wire value.
    #[error("scalar codec '{scalar}' failed: {reason}")]
    Scalar {
        /// Registry name of the codec.
        scalar: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The wire data failed validation against the record's schema.
    #[error("wire value failed schema validation: {0}")]
    Validation(#[from] ValidationFailure),

    /// Schema generation failed while preparing validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// JSON string parsing failed.
    #[error("json parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error during schema generation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The requested dialect cannot express the declared type.
    #[error("{feature} cannot be expressed in {dialect}")]
    UnsupportedDialect {
        /// The dialect that lacks the feature.
        dialect: String,
        /// The feature that cannot be expressed.
        feature: String,
    },

    /// The record type is not registered.
    #[error("unknown record type '{0}'")]
    UnknownRecord(String),

    /// The enum type is not registered.
    #[error("unknown enum type '{0}'")]
    UnknownEnum(String),
}

/// Error while registering a record or enum type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// A record participating in discriminated inheritance cannot close
    /// itself to additional properties: subtype fields arrive as extra
    /// properties of the base schema.
    #[error(
        "record '{record}' disallows additional properties but participates in inheritance"
    )]
    AdditionalPropertiesConflict {
        /// The conflicting record.
        record: String,
    },

    /// A subtype named a base record that is not registered yet.
    #[error("record '{subtype}' names unknown base record '{base}'")]
    UnknownBase {
        /// The subtype being registered.
        subtype: String,
        /// The missing base record.
        base: String,
    },

    /// The record name is already taken.
    #[error("record '{0}' is already registered")]
    DuplicateRecord(String),

    /// The enum name is already taken.
    #[error("enum '{0}' is already registered")]
    DuplicateEnum(String),
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn new(violations: Vec<Violation>) -> Self {
        ValidationViolations { violations }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// The wire data did not conform to the generated schema.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("validation failed against schema '{schema_name}':\n{violations}")]
pub struct ValidationFailure {
    /// Name of the schema that was validated against.
    pub schema_name: String,
    /// Structured list of individual violations.
    pub violations: ValidationViolations,
}
