//! # typewire-schema — The Typewire Engine
//!
//! Derives a JSON Schema document and a bidirectional wire codec for a set
//! of record types, purely from each type's declared shape. One descriptor
//! registration yields:
//!
//! - schema documents in four dialects (JSON Schema Draft-04/06, Swagger
//!   2.0, OpenAPI 3.0), with nested records flattened into a definitions
//!   map — finite even for recursive record graphs;
//! - `encode_record`/`decode_record`, mapping instances to and from JSON
//!   value trees with field-declaration-order keys, optional-field
//!   omission, defaults, unions, discriminated inheritance, and pluggable
//!   scalar codecs;
//! - validation of wire data against the generated schema, through a
//!   pluggable validator collaborator.
//!
//! ## Shape of the Crate
//!
//! - [`registry`] — ahead-of-time record/enum registration, the
//!   replacement for runtime reflection.
//! - [`scalars`] — the encoder/decoder registry and its built-ins
//!   (timestamp, UUID, decimal, IP addresses).
//! - [`engine`] — the [`Engine`]: field models, caches, and the top-level
//!   encode/decode operations.
//! - [`generator`] — per-dialect schema generation and the cycle-safe
//!   definition resolver.
//! - [`codec`] — memoized per-shape codec plans and their execution.
//! - [`validate`] — the validator collaborator trait and its
//!   `jsonschema`-backed default.
//! - [`record`] — the typed [`WireRecord`]/[`WireEnum`] traits.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use typewire_core::{FieldDescriptor, RecordDescriptor, TypeExpr};
//! use typewire_schema::{Engine, SchemaOptions, TypeRegistry};
//!
//! let mut types = TypeRegistry::new();
//! types
//!     .register(
//!         RecordDescriptor::new("Product")
//!             .field(FieldDescriptor::new("name", TypeExpr::string()))
//!             .field(FieldDescriptor::new("cost", TypeExpr::number()).default_value(20.0)),
//!     )
//!     .unwrap();
//!
//! let engine = Engine::new(types);
//! let schema = engine
//!     .json_schema("Product", SchemaOptions::default(), false)
//!     .unwrap();
//! assert_eq!(schema["properties"]["cost"]["default"], json!(20.0));
//! assert_eq!(schema["required"], json!(["name"]));
//! ```

pub mod codec;
pub mod dialect;
pub mod engine;
pub mod generator;
pub mod record;
pub mod registry;
pub mod scalars;
pub mod validate;

// Re-export primary types for ergonomic imports.
pub use dialect::{SchemaDialect, SchemaOptions, DEFAULT_DIALECT};
pub use engine::{
    DecodeOptions, DiscriminatorModel, EncodeOptions, Engine, FieldModel, RecordModel,
};
pub use generator::DefinitionSet;
pub use record::{WireEnum, WireRecord};
pub use registry::TypeRegistry;
pub use scalars::{
    CodecRegistry, DecimalCodec, Ipv4Codec, Ipv6Codec, ScalarCodec, TimestampCodec, UuidCodec,
    UUID_PATTERN,
};
pub use validate::{JsonschemaValidator, WireValidator};

// The core vocabulary, re-exported so downstream crates need only one
// dependency.
pub use typewire_core::{
    classify, json_type_label, scalar_names, Datum, DecodeError, EncodeError, EnumDescriptor,
    EnumValue, FieldDefault, FieldDescriptor, FieldMetadata, PrimitiveKind, RecordDescriptor,
    RecordValue, RegistryError, SchemaError, TypeExpr, TypeShape, TypewireError,
    ValidationFailure, ValidationViolations, Violation,
};
