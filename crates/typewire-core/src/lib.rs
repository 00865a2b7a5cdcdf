//! # typewire-core — Foundational Types for Typewire
//!
//! Typewire derives JSON Schema documents and bidirectional wire codecs
//! from declared record shapes. This crate is the leaf of the workspace:
//! it defines the vocabulary everything else dispatches on, and depends on
//! nothing internal.
//!
//! ## What Lives Here
//!
//! 1. **Type expressions** ([`TypeExpr`]) — the resolved, syntax-level
//!    declaration of a field's type, supplied by record descriptors.
//! 2. **The type classifier** ([`classify`], [`TypeShape`]) — a pure
//!    function mapping expressions into the closed shape vocabulary.
//!    Unrecognized declarations soft-fail to `Opaque` with a loud warning.
//! 3. **The value tree** ([`Datum`], [`RecordValue`]) — the typed
//!    in-memory counterpart of the JSON wire value.
//! 4. **Descriptors** ([`RecordDescriptor`], [`FieldDescriptor`],
//!    [`EnumDescriptor`]) — the ahead-of-time replacement for reflection.
//! 5. **The error hierarchy** — `thiserror` enums per concern plus the
//!    [`TypewireError`] wrapper.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `typewire-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod datum;
pub mod descriptor;
pub mod error;
pub mod expr;
pub mod shape;

// Re-export primary types for ergonomic imports.
pub use datum::{json_type_label, Datum, EnumValue, RecordValue};
pub use descriptor::{
    EnumDescriptor, FieldDefault, FieldDescriptor, FieldMetadata, RecordDescriptor,
    PRIVATE_FIELD_MARKER,
};
pub use error::{
    DecodeError, EncodeError, RegistryError, SchemaError, TypewireError, ValidationFailure,
    ValidationViolations, Violation,
};
pub use expr::{scalar_names, TypeExpr};
pub use shape::{classify, PrimitiveKind, TypeShape};
