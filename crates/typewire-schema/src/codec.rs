//! # The Codec Engine
//!
//! Encode and decode run through a [`CodecPlan`]: the shape's dispatch
//! tree with registry and enum lookups resolved once, built lazily and
//! cached per shape identity. All records referencing the same shape share
//! one plan. Record references stay symbolic inside plans — they resolve
//! at execution time — which keeps plans for recursive record graphs
//! finite.
//!
//! ## Union Dispatch
//!
//! A union value is encoded by trying each variant's plan in declaration
//! order and taking the first that does not report a mismatch; decoding
//! probes the wire value the same way. This is a deliberately ambiguous,
//! first-structural-match strategy: two variants with identical wire
//! structure are not disambiguated — the earlier declaration wins. The
//! discriminator mechanism exists for cases that need real dispatch.

use std::net::IpAddr;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use typewire_core::{
    json_type_label, Datum, DecodeError, EncodeError, EnumDescriptor, PrimitiveKind, TypeShape,
};

use crate::engine::Engine;
use crate::scalars::{
    DecimalCodec, Ipv4Codec, Ipv6Codec, ScalarCodec, TimestampCodec, UuidCodec,
};

/// A shape's resolved encode/decode dispatch tree.
#[derive(Debug)]
pub(crate) enum CodecPlan {
    Primitive(PrimitiveKind),
    Scalar {
        codec: Arc<dyn ScalarCodec>,
    },
    Optional(Arc<CodecPlan>),
    Nullable(Arc<CodecPlan>),
    Wrapped(Arc<CodecPlan>),
    Union(Vec<Arc<CodecPlan>>),
    Literal(Vec<Value>),
    Enum(Arc<EnumDescriptor>),
    Mapping {
        key: Arc<CodecPlan>,
        value: Arc<CodecPlan>,
    },
    Sequence(Arc<CodecPlan>),
    Set(Arc<CodecPlan>),
    FixedTuple(Vec<Arc<CodecPlan>>),
    VariadicTuple(Arc<CodecPlan>),
    /// Resolved against the field-model cache at execution time.
    Record(String),
    /// Any, opaque, and unregistered scalars: structural passthrough.
    Passthrough,
    /// A reference to a type that was never registered; fails at use.
    Unresolved {
        kind: &'static str,
        name: String,
    },
}

impl Engine {
    /// The memoized codec plan for a shape.
    pub(crate) fn plan_for(&self, shape: &TypeShape) -> Arc<CodecPlan> {
        let key = shape.cache_key();
        if let Ok(plans) = self.plans.read() {
            if let Some(plan) = plans.get(&key) {
                return plan.clone();
            }
        }
        let plan = Arc::new(self.build_plan(shape));
        if let Ok(mut plans) = self.plans.write() {
            plans.insert(key, plan.clone());
        }
        plan
    }

    fn build_plan(&self, shape: &TypeShape) -> CodecPlan {
        match shape {
            TypeShape::Primitive(kind) => CodecPlan::Primitive(*kind),
            TypeShape::Scalar(name) => match self.codecs.lookup(name) {
                Some(codec) => CodecPlan::Scalar { codec },
                None => {
                    tracing::warn!(
                        scalar = %name,
                        "no codec registered for scalar type; values pass through unchanged"
                    );
                    CodecPlan::Passthrough
                }
            },
            TypeShape::Optional(inner) => CodecPlan::Optional(self.plan_for(inner)),
            TypeShape::Nullable(inner) => CodecPlan::Nullable(self.plan_for(inner)),
            TypeShape::Wrapped(inner) => CodecPlan::Wrapped(self.plan_for(inner)),
            TypeShape::Union(variants) => {
                CodecPlan::Union(variants.iter().map(|v| self.plan_for(v)).collect())
            }
            TypeShape::Literal(values) => CodecPlan::Literal(values.clone()),
            TypeShape::Enum(name) => match self.types.enumeration(name) {
                Some(descriptor) => CodecPlan::Enum(descriptor),
                None => CodecPlan::Unresolved {
                    kind: "enum",
                    name: name.clone(),
                },
            },
            TypeShape::Mapping(key, value) => CodecPlan::Mapping {
                key: self.plan_for(key),
                value: self.plan_for(value),
            },
            TypeShape::Sequence(elem) => CodecPlan::Sequence(self.plan_for(elem)),
            TypeShape::Set(elem) => CodecPlan::Set(self.plan_for(elem)),
            TypeShape::FixedTuple(elems) => {
                CodecPlan::FixedTuple(elems.iter().map(|e| self.plan_for(e)).collect())
            }
            TypeShape::VariadicTuple(elem) => CodecPlan::VariadicTuple(self.plan_for(elem)),
            TypeShape::Record(name) => CodecPlan::Record(name.clone()),
            TypeShape::Any => CodecPlan::Passthrough,
            TypeShape::Opaque(description) => {
                tracing::warn!(
                    shape = %description,
                    "opaque type shape; values pass through unchanged"
                );
                CodecPlan::Passthrough
            }
        }
    }

    pub(crate) fn encode_plan(
        &self,
        plan: &CodecPlan,
        datum: &Datum,
        omit_absent: bool,
    ) -> Result<Value, EncodeError> {
        match plan {
            CodecPlan::Primitive(kind) => encode_primitive(*kind, datum),
            CodecPlan::Scalar { codec } => codec.encode(datum),
            CodecPlan::Optional(inner) => match datum {
                Datum::Absent => Ok(Value::Null),
                other => self.encode_plan(inner, other, omit_absent),
            },
            CodecPlan::Nullable(inner) => match datum {
                Datum::Null => Ok(Value::Null),
                other => self.encode_plan(inner, other, omit_absent),
            },
            CodecPlan::Wrapped(inner) => self.encode_plan(inner, datum, omit_absent),
            CodecPlan::Union(variants) => {
                for variant in variants {
                    if let Ok(value) = self.encode_plan(variant, datum, omit_absent) {
                        return Ok(value);
                    }
                }
                Err(EncodeError::NoUnionVariant {
                    found: datum.type_label(),
                })
            }
            CodecPlan::Literal(_) => encode_literal(datum),
            CodecPlan::Enum(descriptor) => encode_enum(descriptor, datum),
            CodecPlan::Mapping { key, value } => {
                let pairs = datum.as_map().ok_or_else(|| EncodeError::TypeMismatch {
                    expected: "map".to_owned(),
                    found: datum.type_label(),
                })?;
                let mut out = Map::new();
                for (k, v) in pairs {
                    let wire_key = match self.encode_plan(key, k, omit_absent)? {
                        Value::String(s) => s,
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        other => {
                            return Err(EncodeError::NonScalarMapKey {
                                found: json_type_label(&other),
                            })
                        }
                    };
                    out.insert(wire_key, self.encode_plan(value, v, omit_absent)?);
                }
                Ok(Value::Object(out))
            }
            CodecPlan::Sequence(inner) => {
                let items = datum.as_list().ok_or_else(|| EncodeError::TypeMismatch {
                    expected: "sequence".to_owned(),
                    found: datum.type_label(),
                })?;
                self.encode_elements(inner, items, omit_absent)
            }
            CodecPlan::Set(inner) => {
                // Sets also accept list datums; order is preserved as given.
                let items = datum
                    .as_set()
                    .or_else(|| datum.as_list())
                    .ok_or_else(|| EncodeError::TypeMismatch {
                        expected: "set".to_owned(),
                        found: datum.type_label(),
                    })?;
                self.encode_elements(inner, items, omit_absent)
            }
            CodecPlan::FixedTuple(plans) => {
                let items = datum.as_tuple().ok_or_else(|| EncodeError::TypeMismatch {
                    expected: "tuple".to_owned(),
                    found: datum.type_label(),
                })?;
                if items.len() != plans.len() {
                    return Err(EncodeError::TypeMismatch {
                        expected: format!("tuple of {} elements", plans.len()),
                        found: datum.type_label(),
                    });
                }
                let mut out = Vec::with_capacity(items.len());
                for (plan, item) in plans.iter().zip(items) {
                    out.push(self.encode_plan(plan, item, omit_absent)?);
                }
                Ok(Value::Array(out))
            }
            CodecPlan::VariadicTuple(inner) => {
                let items = datum.as_tuple().ok_or_else(|| EncodeError::TypeMismatch {
                    expected: "tuple".to_owned(),
                    found: datum.type_label(),
                })?;
                self.encode_elements(inner, items, omit_absent)
            }
            CodecPlan::Record(name) => {
                let record = datum.as_record().ok_or_else(|| EncodeError::TypeMismatch {
                    expected: format!("record '{name}'"),
                    found: datum.type_label(),
                })?;
                // Subtype instances encode where the base is declared.
                if !self.types.is_subtype_of(&record.type_name, name) {
                    return Err(EncodeError::RecordMismatch {
                        expected: name.clone(),
                        found: record.type_name.clone(),
                    });
                }
                self.encode_record_value(record, omit_absent)
            }
            CodecPlan::Passthrough => self.encode_any(datum, omit_absent),
            CodecPlan::Unresolved { kind, name } => Err(match *kind {
                "enum" => EncodeError::UnknownEnum(name.clone()),
                _ => EncodeError::UnknownRecord(name.clone()),
            }),
        }
    }

    fn encode_elements(
        &self,
        plan: &CodecPlan,
        items: &[Datum],
        omit_absent: bool,
    ) -> Result<Value, EncodeError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.encode_plan(plan, item, omit_absent)?);
        }
        Ok(Value::Array(out))
    }

    /// Structural encoding for `Any` and opaque shapes: native scalars use
    /// their built-in wire forms, collections recurse, records encode
    /// through their own model.
    pub(crate) fn encode_any(
        &self,
        datum: &Datum,
        omit_absent: bool,
    ) -> Result<Value, EncodeError> {
        match datum {
            Datum::Absent | Datum::Null => Ok(Value::Null),
            Datum::Bool(b) => Ok(Value::Bool(*b)),
            Datum::Int(i) => Ok(json!(i)),
            Datum::Float(f) => finite_number(*f),
            Datum::Str(s) => Ok(Value::String(s.clone())),
            Datum::Timestamp(_) => TimestampCodec.encode(datum),
            Datum::Uuid(_) => UuidCodec.encode(datum),
            Datum::Decimal(_) => DecimalCodec::new().encode(datum),
            Datum::Ip(IpAddr::V4(_)) => Ipv4Codec.encode(datum),
            Datum::Ip(IpAddr::V6(_)) => Ipv6Codec.encode(datum),
            Datum::Enum(ev) => {
                let descriptor = self
                    .types
                    .enumeration(&ev.type_name)
                    .ok_or_else(|| EncodeError::UnknownEnum(ev.type_name.clone()))?;
                descriptor.value_of(&ev.member).cloned().ok_or_else(|| {
                    EncodeError::UnknownEnumMember {
                        enum_name: ev.type_name.clone(),
                        member: ev.member.clone(),
                    }
                })
            }
            Datum::List(items) | Datum::Tuple(items) | Datum::Set(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.encode_any(item, omit_absent)?);
                }
                Ok(Value::Array(out))
            }
            Datum::Map(pairs) => {
                let mut out = Map::new();
                for (k, v) in pairs {
                    let wire_key = match self.encode_any(k, omit_absent)? {
                        Value::String(s) => s,
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        other => {
                            return Err(EncodeError::NonScalarMapKey {
                                found: json_type_label(&other),
                            })
                        }
                    };
                    out.insert(wire_key, self.encode_any(v, omit_absent)?);
                }
                Ok(Value::Object(out))
            }
            Datum::Record(record) => self.encode_record_value(record, omit_absent),
        }
    }

    pub(crate) fn decode_plan(
        &self,
        plan: &CodecPlan,
        value: &Value,
        validate_enums: bool,
    ) -> Result<Datum, DecodeError> {
        match plan {
            CodecPlan::Primitive(kind) => decode_primitive(*kind, value),
            CodecPlan::Scalar { codec } => codec.decode(value),
            CodecPlan::Optional(inner) => match value {
                Value::Null => Ok(Datum::Absent),
                other => self.decode_plan(inner, other, validate_enums),
            },
            CodecPlan::Nullable(inner) => match value {
                Value::Null => Ok(Datum::Null),
                other => self.decode_plan(inner, other, validate_enums),
            },
            CodecPlan::Wrapped(inner) => self.decode_plan(inner, value, validate_enums),
            CodecPlan::Union(variants) => {
                for variant in variants {
                    if let Ok(datum) = self.decode_plan(variant, value, validate_enums) {
                        return Ok(datum);
                    }
                }
                Err(DecodeError::UnionExhausted {
                    value: value.clone(),
                })
            }
            CodecPlan::Literal(_) => decode_literal(value),
            CodecPlan::Enum(descriptor) => {
                if let Some(member) = descriptor.member_by_value(value) {
                    Ok(Datum::enum_member(descriptor.name.clone(), member))
                } else if validate_enums {
                    Err(DecodeError::UnknownEnumMember {
                        enum_name: descriptor.name.clone(),
                        value: value.clone(),
                    })
                } else {
                    tracing::warn!(
                        enum_name = %descriptor.name,
                        %value,
                        "unrecognized enum value passed through raw"
                    );
                    Ok(any_value_to_datum(value))
                }
            }
            CodecPlan::Mapping { key, value: value_plan } => {
                let object = value.as_object().ok_or_else(|| DecodeError::TypeMismatch {
                    expected: "object".to_owned(),
                    found: json_type_label(value),
                })?;
                let mut pairs = Vec::with_capacity(object.len());
                for (k, v) in object {
                    pairs.push((
                        self.decode_map_key(key, k, validate_enums)?,
                        self.decode_plan(value_plan, v, validate_enums)?,
                    ));
                }
                Ok(Datum::Map(pairs))
            }
            CodecPlan::Sequence(inner) => self
                .decode_elements(inner, value, validate_enums)
                .map(Datum::List),
            CodecPlan::Set(inner) => self
                .decode_elements(inner, value, validate_enums)
                .map(Datum::Set),
            CodecPlan::FixedTuple(plans) => {
                let items = value.as_array().ok_or_else(|| DecodeError::TypeMismatch {
                    expected: "array".to_owned(),
                    found: json_type_label(value),
                })?;
                if items.len() != plans.len() {
                    return Err(DecodeError::TypeMismatch {
                        expected: format!("array of {} elements", plans.len()),
                        found: json_type_label(value),
                    });
                }
                let mut out = Vec::with_capacity(items.len());
                for (plan, item) in plans.iter().zip(items) {
                    out.push(self.decode_plan(plan, item, validate_enums)?);
                }
                Ok(Datum::Tuple(out))
            }
            CodecPlan::VariadicTuple(inner) => self
                .decode_elements(inner, value, validate_enums)
                .map(Datum::Tuple),
            CodecPlan::Record(name) => self
                .decode_record_value(name, value, validate_enums)
                .map(Datum::Record),
            CodecPlan::Passthrough => Ok(any_value_to_datum(value)),
            CodecPlan::Unresolved { kind, name } => Err(match *kind {
                "enum" => DecodeError::UnknownEnum(name.clone()),
                _ => DecodeError::UnknownRecord(name.clone()),
            }),
        }
    }

    fn decode_elements(
        &self,
        plan: &CodecPlan,
        value: &Value,
        validate_enums: bool,
    ) -> Result<Vec<Datum>, DecodeError> {
        let items = value.as_array().ok_or_else(|| DecodeError::TypeMismatch {
            expected: "array".to_owned(),
            found: json_type_label(value),
        })?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.decode_plan(plan, item, validate_enums)?);
        }
        Ok(out)
    }

    /// Map keys arrive as object-key strings. Primitive non-string keys
    /// parse back from their string form; everything else — UUIDs and
    /// other scalars in particular — decodes through its own codec from
    /// the string wire value.
    fn decode_map_key(
        &self,
        plan: &CodecPlan,
        key: &str,
        validate_enums: bool,
    ) -> Result<Datum, DecodeError> {
        match plan {
            CodecPlan::Primitive(PrimitiveKind::Integer) => {
                key.parse::<i64>().map(Datum::Int).map_err(|_| {
                    DecodeError::TypeMismatch {
                        expected: "integer map key".to_owned(),
                        found: "string",
                    }
                })
            }
            CodecPlan::Primitive(PrimitiveKind::Number) => {
                key.parse::<f64>().map(Datum::Float).map_err(|_| {
                    DecodeError::TypeMismatch {
                        expected: "number map key".to_owned(),
                        found: "string",
                    }
                })
            }
            CodecPlan::Primitive(PrimitiveKind::Boolean) => {
                key.parse::<bool>().map(Datum::Bool).map_err(|_| {
                    DecodeError::TypeMismatch {
                        expected: "boolean map key".to_owned(),
                        found: "string",
                    }
                })
            }
            CodecPlan::Wrapped(inner) => self.decode_map_key(inner, key, validate_enums),
            other => self.decode_plan(other, &Value::String(key.to_owned()), validate_enums),
        }
    }
}

fn finite_number(value: f64) -> Result<Value, EncodeError> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| EncodeError::Scalar {
            scalar: "Number".to_owned(),
            reason: format!("{value} is not a finite number"),
        })
}

fn encode_primitive(kind: PrimitiveKind, datum: &Datum) -> Result<Value, EncodeError> {
    match (kind, datum) {
        (PrimitiveKind::String, Datum::Str(s)) => Ok(Value::String(s.clone())),
        (PrimitiveKind::Integer, Datum::Int(i)) => Ok(json!(i)),
        (PrimitiveKind::Boolean, Datum::Bool(b)) => Ok(Value::Bool(*b)),
        (PrimitiveKind::Number, Datum::Float(f)) => finite_number(*f),
        // Integers are numbers; keep the integer wire representation.
        (PrimitiveKind::Number, Datum::Int(i)) => Ok(json!(i)),
        (kind, other) => Err(EncodeError::TypeMismatch {
            expected: kind.json_type().to_owned(),
            found: other.type_label(),
        }),
    }
}

fn decode_primitive(kind: PrimitiveKind, value: &Value) -> Result<Datum, DecodeError> {
    match (kind, value) {
        (PrimitiveKind::String, Value::String(s)) => Ok(Datum::Str(s.clone())),
        (PrimitiveKind::Integer, Value::Number(n)) if n.is_i64() => {
            match n.as_i64() {
                Some(i) => Ok(Datum::Int(i)),
                None => Err(DecodeError::TypeMismatch {
                    expected: "integer".to_owned(),
                    found: "number",
                }),
            }
        }
        (PrimitiveKind::Boolean, Value::Bool(b)) => Ok(Datum::Bool(*b)),
        (PrimitiveKind::Number, Value::Number(n)) => match n.as_f64() {
            Some(f) => Ok(Datum::Float(f)),
            None => Err(DecodeError::TypeMismatch {
                expected: "number".to_owned(),
                found: "number",
            }),
        },
        (kind, other) => Err(DecodeError::TypeMismatch {
            expected: kind.json_type().to_owned(),
            found: json_type_label(other),
        }),
    }
}

/// Literal membership is the validator's concern; the codec only requires
/// a JSON-primitive value on either side.
fn encode_literal(datum: &Datum) -> Result<Value, EncodeError> {
    match datum {
        Datum::Null => Ok(Value::Null),
        Datum::Bool(b) => Ok(Value::Bool(*b)),
        Datum::Int(i) => Ok(json!(i)),
        Datum::Float(f) => finite_number(*f),
        Datum::Str(s) => Ok(Value::String(s.clone())),
        other => Err(EncodeError::TypeMismatch {
            expected: "literal value".to_owned(),
            found: other.type_label(),
        }),
    }
}

fn decode_literal(value: &Value) -> Result<Datum, DecodeError> {
    match value {
        Value::Null => Ok(Datum::Null),
        Value::Bool(b) => Ok(Datum::Bool(*b)),
        Value::Number(_) | Value::String(_) => Ok(any_value_to_datum(value)),
        other => Err(DecodeError::TypeMismatch {
            expected: "literal value".to_owned(),
            found: json_type_label(other),
        }),
    }
}

fn encode_enum(descriptor: &EnumDescriptor, datum: &Datum) -> Result<Value, EncodeError> {
    match datum {
        Datum::Enum(ev) if ev.type_name == descriptor.name => descriptor
            .value_of(&ev.member)
            .cloned()
            .ok_or_else(|| EncodeError::UnknownEnumMember {
                enum_name: descriptor.name.clone(),
                member: ev.member.clone(),
            }),
        Datum::Enum(_) => Err(EncodeError::TypeMismatch {
            expected: format!("member of enum '{}'", descriptor.name),
            found: "enum member",
        }),
        // Raw primitives round-trip values that lenient decoding passed
        // through; a value outside the member set is warned about.
        Datum::Str(s) => {
            let value = Value::String(s.clone());
            if descriptor.member_by_value(&value).is_none() {
                tracing::warn!(
                    enum_name = %descriptor.name,
                    %value,
                    "encoding a value that is not a member of the enum"
                );
            }
            Ok(value)
        }
        Datum::Int(i) => {
            let value = json!(i);
            if descriptor.member_by_value(&value).is_none() {
                tracing::warn!(
                    enum_name = %descriptor.name,
                    %value,
                    "encoding a value that is not a member of the enum"
                );
            }
            Ok(value)
        }
        other => Err(EncodeError::TypeMismatch {
            expected: format!("member of enum '{}'", descriptor.name),
            found: other.type_label(),
        }),
    }
}

/// Structural conversion of an arbitrary JSON value into a datum, used by
/// `Any`/opaque passthrough and lenient enum decoding.
pub(crate) fn any_value_to_datum(value: &Value) -> Datum {
    match value {
        Value::Null => Datum::Null,
        Value::Bool(b) => Datum::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Datum::Int(i)
            } else if let Some(f) = n.as_f64() {
                Datum::Float(f)
            } else {
                // u64 beyond i64 range; the lossy float is the best fit.
                Datum::Float(n.as_u64().map(|u| u as f64).unwrap_or(0.0))
            }
        }
        Value::String(s) => Datum::Str(s.clone()),
        Value::Array(items) => Datum::List(items.iter().map(any_value_to_datum).collect()),
        Value::Object(map) => Datum::Map(
            map.iter()
                .map(|(k, v)| (Datum::Str(k.clone()), any_value_to_datum(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::registry::TypeRegistry;
    use typewire_core::{classify, TypeExpr};

    fn engine() -> Engine {
        Engine::new(TypeRegistry::new())
    }

    fn shape(expr: &TypeExpr) -> TypeShape {
        classify(expr)
    }

    #[test]
    fn test_plan_is_cached_per_shape() {
        let engine = engine();
        let shape = shape(&TypeExpr::sequence(TypeExpr::string()));
        let first = engine.plan_for(&shape);
        let second = engine.plan_for(&shape);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_primitive_roundtrip() {
        let engine = engine();
        let shape = shape(&TypeExpr::integer());
        let wire = engine.encode_value(&shape, &Datum::Int(42), true).unwrap();
        assert_eq!(wire, json!(42));
        assert_eq!(engine.decode_value(&shape, &wire, true).unwrap(), Datum::Int(42));
    }

    #[test]
    fn test_primitive_mismatch() {
        let engine = engine();
        let shape = shape(&TypeExpr::integer());
        assert!(engine
            .encode_value(&shape, &Datum::Str("5".into()), true)
            .is_err());
        assert!(engine.decode_value(&shape, &json!("5"), true).is_err());
    }

    #[test]
    fn test_number_accepts_integer_datum() {
        let engine = engine();
        let shape = shape(&TypeExpr::number());
        assert_eq!(
            engine.encode_value(&shape, &Datum::Int(10), true).unwrap(),
            json!(10)
        );
        assert_eq!(
            engine.decode_value(&shape, &json!(10), true).unwrap(),
            Datum::Float(10.0)
        );
    }

    #[test]
    fn test_optional_absent_encodes_null() {
        let engine = engine();
        let shape = shape(&TypeExpr::option(TypeExpr::string()));
        assert_eq!(
            engine.encode_value(&shape, &Datum::Absent, false).unwrap(),
            Value::Null
        );
        assert_eq!(
            engine.decode_value(&shape, &Value::Null, true).unwrap(),
            Datum::Absent
        );
    }

    #[test]
    fn test_nullable_roundtrips_explicit_null() {
        let engine = engine();
        let shape = shape(&TypeExpr::nullable(TypeExpr::string()));
        assert_eq!(
            engine.encode_value(&shape, &Datum::Null, true).unwrap(),
            Value::Null
        );
        assert_eq!(
            engine.decode_value(&shape, &Value::Null, true).unwrap(),
            Datum::Null
        );
    }

    #[test]
    fn test_sequence_roundtrip() {
        let engine = engine();
        let shape = shape(&TypeExpr::sequence(TypeExpr::string()));
        let datum = Datum::List(vec!["a".into(), "b".into()]);
        let wire = engine.encode_value(&shape, &datum, true).unwrap();
        assert_eq!(wire, json!(["a", "b"]));
        assert_eq!(engine.decode_value(&shape, &wire, true).unwrap(), datum);
    }

    #[test]
    fn test_fixed_tuple_length_enforced() {
        let engine = engine();
        let shape = shape(&TypeExpr::tuple(vec![TypeExpr::string(), TypeExpr::integer()]));
        let datum = Datum::Tuple(vec!["xyz".into(), Datum::Int(6)]);
        let wire = engine.encode_value(&shape, &datum, true).unwrap();
        assert_eq!(wire, json!(["xyz", 6]));
        assert_eq!(engine.decode_value(&shape, &wire, true).unwrap(), datum);

        assert!(engine
            .encode_value(&shape, &Datum::Tuple(vec!["xyz".into()]), true)
            .is_err());
        assert!(engine.decode_value(&shape, &json!(["xyz"]), true).is_err());
    }

    #[test]
    fn test_map_with_integer_keys() {
        let engine = engine();
        let shape = shape(&TypeExpr::mapping(TypeExpr::integer(), TypeExpr::string()));
        let datum = Datum::Map(vec![(Datum::Int(1), "one".into())]);
        let wire = engine.encode_value(&shape, &datum, true).unwrap();
        assert_eq!(wire, json!({"1": "one"}));
        assert_eq!(engine.decode_value(&shape, &wire, true).unwrap(), datum);
    }

    #[test]
    fn test_union_first_match_wins_on_overlap() {
        let engine = engine();
        // Integer and number overlap on integral values; the earlier
        // declaration claims them.
        let shape = shape(&TypeExpr::union(vec![
            TypeExpr::integer(),
            TypeExpr::number(),
        ]));
        assert_eq!(
            engine.decode_value(&shape, &json!(5), true).unwrap(),
            Datum::Int(5)
        );
        assert_eq!(
            engine.decode_value(&shape, &json!(5.5), true).unwrap(),
            Datum::Float(5.5)
        );
    }

    #[test]
    fn test_union_exhaustion() {
        let engine = engine();
        let shape = shape(&TypeExpr::union(vec![
            TypeExpr::integer(),
            TypeExpr::string(),
        ]));
        let err = engine.decode_value(&shape, &json!(true), true).unwrap_err();
        assert!(matches!(err, DecodeError::UnionExhausted { .. }));

        let err = engine
            .encode_value(&shape, &Datum::Bool(true), true)
            .unwrap_err();
        assert!(matches!(err, EncodeError::NoUnionVariant { .. }));
    }

    #[test]
    fn test_literal_passthrough_including_null() {
        let engine = engine();
        let shape = shape(&TypeExpr::literal(vec![
            json!(8),
            json!(16),
            json!("true-color"),
            json!(null),
        ]));
        assert_eq!(
            engine.encode_value(&shape, &Datum::Int(16), true).unwrap(),
            json!(16)
        );
        assert_eq!(
            engine.decode_value(&shape, &json!("true-color"), true).unwrap(),
            Datum::Str("true-color".into())
        );
        assert_eq!(
            engine.decode_value(&shape, &Value::Null, true).unwrap(),
            Datum::Null
        );
    }

    #[test]
    fn test_unregistered_scalar_passes_through_with_warning() {
        let engine = engine();
        let shape = shape(&TypeExpr::scalar("Mystery"));
        assert_eq!(
            engine.encode_value(&shape, &Datum::Str("x".into()), true).unwrap(),
            json!("x")
        );
        assert_eq!(
            engine.decode_value(&shape, &json!("x"), true).unwrap(),
            Datum::Str("x".into())
        );
    }

    #[test]
    fn test_any_passthrough_structural() {
        let engine = engine();
        let shape = shape(&TypeExpr::any());
        let wire = json!({"foo": "bar", "baz": [1, 2.5, null]});
        let datum = engine.decode_value(&shape, &wire, true).unwrap();
        assert_eq!(engine.encode_value(&shape, &datum, true).unwrap(), wire);
    }

    #[test]
    fn test_unresolved_enum_fails_at_use() {
        let engine = engine();
        let shape = shape(&TypeExpr::enumeration("Ghost"));
        assert!(matches!(
            engine.decode_value(&shape, &json!("x"), true).unwrap_err(),
            DecodeError::UnknownEnum(_)
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::engine::Engine;
    use crate::registry::TypeRegistry;
    use proptest::prelude::*;
    use typewire_core::{classify, TypeExpr};

    fn engine() -> Engine {
        Engine::new(TypeRegistry::new())
    }

    proptest! {
        /// Sequences of integers round-trip exactly.
        #[test]
        fn sequence_roundtrip(items in prop::collection::vec(any::<i64>(), 0..16)) {
            let engine = engine();
            let shape = classify(&TypeExpr::sequence(TypeExpr::integer()));
            let datum = Datum::List(items.into_iter().map(Datum::Int).collect());
            let wire = engine.encode_value(&shape, &datum, true).unwrap();
            prop_assert_eq!(engine.decode_value(&shape, &wire, true).unwrap(), datum);
        }

        /// String-keyed maps round-trip exactly, preserving order.
        #[test]
        fn map_roundtrip(pairs in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8)) {
            let engine = engine();
            let shape = classify(&TypeExpr::mapping(TypeExpr::string(), TypeExpr::integer()));
            let datum = Datum::Map(
                pairs.into_iter()
                    .map(|(k, v)| (Datum::Str(k), Datum::Int(v)))
                    .collect(),
            );
            let wire = engine.encode_value(&shape, &datum, true).unwrap();
            prop_assert_eq!(engine.decode_value(&shape, &wire, true).unwrap(), datum);
        }

        /// Optional strings round-trip through both states.
        #[test]
        fn optional_roundtrip(value in prop::option::of("[ -~]{0,24}")) {
            let engine = engine();
            let shape = classify(&TypeExpr::option(TypeExpr::string()));
            let datum = Datum::from_option(value);
            let wire = engine.encode_value(&shape, &datum, false).unwrap();
            prop_assert_eq!(engine.decode_value(&shape, &wire, true).unwrap(), datum);
        }

        /// Encoding is deterministic: equal inputs, equal outputs.
        #[test]
        fn encode_deterministic(items in prop::collection::vec(any::<i64>(), 0..16)) {
            let engine = engine();
            let shape = classify(&TypeExpr::sequence(TypeExpr::integer()));
            let datum = Datum::List(items.into_iter().map(Datum::Int).collect());
            let a = engine.encode_value(&shape, &datum, true).unwrap();
            let b = engine.encode_value(&shape, &datum, true).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
