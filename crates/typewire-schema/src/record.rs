//! # Typed Record & Enum Traits
//!
//! [`WireRecord`] is the boundary between concrete Rust types and the
//! untyped engine: a record type supplies its descriptor once and converts
//! instances to and from [`RecordValue`] trees. The provided methods wire
//! those conversions through an [`Engine`] for schema-validated encode and
//! decode, plus JSON-string convenience forms.
//!
//! Decoding a discriminated base type can legitimately produce a subtype
//! value; the typed `from_wire` cannot express that, so polymorphic reads
//! go through [`Engine::decode_record`] and the concrete type's
//! `from_datum`.

use serde_json::Value;

use typewire_core::{
    Datum, DecodeError, EncodeError, EnumDescriptor, EnumValue, RecordDescriptor, RecordValue,
};

use crate::engine::{DecodeOptions, EncodeOptions, Engine};

/// A record type with a wire form derived from its descriptor.
pub trait WireRecord: Sized {
    /// The record's schema name. Must match `descriptor().name`.
    fn type_name() -> &'static str;

    /// The record's declared shape, built once at registration time.
    fn descriptor() -> RecordDescriptor;

    /// Convert an instance into the untyped field tree, including values
    /// for computed serialised properties.
    fn to_datum(&self) -> RecordValue;

    /// Rebuild an instance from a decoded field tree.
    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError>;

    /// Encode to the wire form, optionally validating the result against
    /// this record's schema.
    fn to_wire(&self, engine: &Engine, options: EncodeOptions) -> Result<Value, EncodeError> {
        engine.encode_record(&self.to_datum(), options)
    }

    /// Decode from the wire form, validating first unless disabled.
    fn from_wire(
        engine: &Engine,
        data: &Value,
        options: DecodeOptions,
    ) -> Result<Self, DecodeError> {
        let value = engine.decode_record(Self::type_name(), data, options)?;
        Self::from_datum(&value)
    }

    /// Encode to a JSON string.
    fn to_json(&self, engine: &Engine, options: EncodeOptions) -> Result<String, EncodeError> {
        let wire = self.to_wire(engine, options)?;
        Ok(serde_json::to_string(&wire)?)
    }

    /// Decode from a JSON string.
    fn from_json(
        engine: &Engine,
        data: &str,
        options: DecodeOptions,
    ) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(data)?;
        Self::from_wire(engine, &value, options)
    }
}

/// An enum type with declared members.
pub trait WireEnum: Sized {
    /// The enum's schema name. Must match `descriptor().name`.
    fn type_name() -> &'static str;

    /// The enum's member list, built once at registration time.
    fn descriptor() -> EnumDescriptor;

    /// The member name of this value.
    fn member_name(&self) -> &'static str;

    /// Look a value up by member name.
    fn from_member_name(name: &str) -> Option<Self>;

    /// Convert into the engine-side enum value.
    fn to_datum(&self) -> Datum {
        Datum::Enum(EnumValue {
            type_name: Self::type_name().to_owned(),
            member: self.member_name().to_owned(),
        })
    }

    /// Rebuild from a decoded datum.
    ///
    /// # Errors
    ///
    /// A datum that is not a member of this enum — including raw values
    /// passed through by lenient decoding — is a mismatch.
    fn from_datum(datum: &Datum) -> Result<Self, DecodeError> {
        match datum {
            Datum::Enum(ev) if ev.type_name == Self::type_name() => {
                Self::from_member_name(&ev.member).ok_or_else(|| DecodeError::UnknownEnumMember {
                    enum_name: ev.type_name.clone(),
                    value: Value::String(ev.member.clone()),
                })
            }
            other => Err(DecodeError::TypeMismatch {
                expected: format!("member of enum '{}'", Self::type_name()),
                found: other.type_label(),
            }),
        }
    }
}
