//! # Schema Dialects
//!
//! The four output formats the generator can target, and the per-dialect
//! knobs the rest of the engine consults: reference paths, `$schema` URIs,
//! extension support, and union support.
//!
//! Swagger 2.0 and OpenAPI 3.0 are embeddable-only formats — they describe
//! fragments of an API document, not standalone schemas. Requesting one
//! standalone falls back to Draft-06 with a warning.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A schema output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaDialect {
    /// JSON Schema Draft-04.
    Draft04,
    /// JSON Schema Draft-06, the default.
    Draft06,
    /// Swagger 2.0 definitions.
    Swagger2,
    /// OpenAPI 3.0 component schemas.
    OpenApi3,
}

impl SchemaDialect {
    /// The `$schema` URI for standalone documents, where one exists.
    pub fn schema_uri(&self) -> Option<&'static str> {
        match self {
            SchemaDialect::Draft04 => Some("http://json-schema.org/draft-04/schema#"),
            SchemaDialect::Draft06 => Some("http://json-schema.org/draft-06/schema#"),
            SchemaDialect::Swagger2 | SchemaDialect::OpenApi3 => None,
        }
    }

    /// The path under which record definitions are referenced.
    pub fn reference_path(&self) -> &'static str {
        match self {
            SchemaDialect::OpenApi3 => "#/components/schemas",
            _ => "#/definitions",
        }
    }

    /// A `$ref` fragment pointing at a named record definition.
    pub fn reference(&self, name: &str) -> Value {
        json!({ "$ref": format!("{}/{}", self.reference_path(), name) })
    }

    /// Whether `x-*` extension properties are legal.
    pub fn supports_extensions(&self) -> bool {
        matches!(self, SchemaDialect::Swagger2 | SchemaDialect::OpenApi3)
    }

    /// Whether type unions can be expressed at all.
    pub fn supports_unions(&self) -> bool {
        !matches!(self, SchemaDialect::Swagger2)
    }

    /// Embeddable-only API-specification dialects.
    pub fn is_api_spec(&self) -> bool {
        matches!(self, SchemaDialect::Swagger2 | SchemaDialect::OpenApi3)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SchemaDialect::Draft04 => "JSON Schema Draft-04",
            SchemaDialect::Draft06 => "JSON Schema Draft-06",
            SchemaDialect::Swagger2 => "Swagger 2.0",
            SchemaDialect::OpenApi3 => "OpenAPI 3.0",
        }
    }
}

impl std::fmt::Display for SchemaDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The default output dialect.
pub const DEFAULT_DIALECT: SchemaDialect = SchemaDialect::Draft06;

/// Options keying one generated schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaOptions {
    pub dialect: SchemaDialect,
    /// Whether enum member lists are emitted into the schema. Turning this
    /// off produces a schema that accepts unrecognized enum values, pairing
    /// with the lenient decode mode.
    pub validate_enums: bool,
}

impl SchemaOptions {
    pub fn new(dialect: SchemaDialect) -> Self {
        SchemaOptions {
            dialect,
            validate_enums: true,
        }
    }

    pub fn without_enum_validation(mut self) -> Self {
        self.validate_enums = false;
        self
    }
}

impl Default for SchemaOptions {
    fn default() -> Self {
        SchemaOptions::new(DEFAULT_DIALECT)
    }
}
