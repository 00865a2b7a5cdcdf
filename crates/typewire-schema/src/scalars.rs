//! # Scalar Codecs & the Encoder/Decoder Registry
//!
//! A [`ScalarCodec`] is the to-wire / from-wire / schema-fragment triple
//! for one leaf type. The [`CodecRegistry`] maps scalar names to codecs,
//! seeded with the built-ins (timestamp, UUID, decimal, IP addresses) and
//! extensible by registration — re-registering a name replaces the codec,
//! last writer wins, which is how default handling is customized (e.g.
//! decimal precision).
//!
//! A codec handed a mismatched value signals a typed error; nothing passes
//! through silently.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use uuid::Uuid;

use typewire_core::{json_type_label, scalar_names, Datum, DecodeError, EncodeError};

/// Regex constraining the canonical hyphenated UUID wire form.
pub const UUID_PATTERN: &str =
    "^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$";

/// The to-wire / from-wire / schema triple for one scalar type.
pub trait ScalarCodec: Send + Sync + std::fmt::Debug {
    /// The schema fragment describing the wire form.
    fn schema(&self) -> Value;

    /// Encode a datum to its wire value.
    ///
    /// # Errors
    ///
    /// A datum of the wrong variant is a typed mismatch, which union
    /// dispatch relies on to probe variants.
    fn encode(&self, value: &Datum) -> Result<Value, EncodeError>;

    /// Decode a wire value back to a datum.
    fn decode(&self, value: &Value) -> Result<Datum, DecodeError>;
}

/// Process-wide mapping from scalar name to codec.
///
/// Built before the engine and read-only afterwards: registration takes
/// `&mut self`, so mutating a registry an engine already holds is a
/// compile error, not a race.
#[derive(Debug)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn ScalarCodec>>,
}

impl CodecRegistry {
    /// An empty registry with no codecs at all.
    pub fn empty() -> Self {
        CodecRegistry {
            codecs: HashMap::new(),
        }
    }

    /// A registry seeded with the built-in codecs.
    pub fn with_builtins() -> Self {
        let mut registry = CodecRegistry::empty();
        registry.register(scalar_names::DATETIME, TimestampCodec);
        registry.register(scalar_names::UUID, UuidCodec);
        registry.register(scalar_names::DECIMAL, DecimalCodec::new());
        registry.register(scalar_names::IPV4, Ipv4Codec);
        registry.register(scalar_names::IPV6, Ipv6Codec);
        registry
    }

    /// Register a codec under a name. Re-registering replaces: last
    /// writer wins.
    pub fn register(&mut self, name: impl Into<String>, codec: impl ScalarCodec + 'static) {
        self.codecs.insert(name.into(), Arc::new(codec));
    }

    /// Look up a codec by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ScalarCodec>> {
        self.codecs.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.codecs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        CodecRegistry::with_builtins()
    }
}

fn expect_str<'v>(value: &'v Value, scalar: &str) -> Result<&'v str, DecodeError> {
    value.as_str().ok_or_else(|| DecodeError::TypeMismatch {
        expected: format!("{scalar} string"),
        found: json_type_label(value),
    })
}

/// RFC 3339 timestamps.
///
/// UTC instants — including values constructed from timezone-less inputs,
/// which adopt UTC with a warning — take the trailing-`Z` form; zoned
/// instants keep their offset.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampCodec;

fn format_rfc3339(instant: &DateTime<FixedOffset>) -> String {
    let use_z = instant.offset().local_minus_utc() == 0;
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, use_z)
}

impl ScalarCodec for TimestampCodec {
    fn schema(&self) -> Value {
        json!({"type": "string", "format": "date-time"})
    }

    fn encode(&self, value: &Datum) -> Result<Value, EncodeError> {
        match value {
            Datum::Timestamp(instant) => Ok(Value::String(format_rfc3339(instant))),
            other => Err(EncodeError::TypeMismatch {
                expected: "date-time".to_owned(),
                found: other.type_label(),
            }),
        }
    }

    fn decode(&self, value: &Value) -> Result<Datum, DecodeError> {
        let s = expect_str(value, "date-time")?;
        DateTime::parse_from_rfc3339(s)
            .map(Datum::Timestamp)
            .map_err(|e| DecodeError::Scalar {
                scalar: scalar_names::DATETIME.to_owned(),
                reason: format!("invalid RFC 3339 timestamp {s:?}: {e}"),
            })
    }
}

/// Canonical hyphenated UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidCodec;

impl ScalarCodec for UuidCodec {
    fn schema(&self) -> Value {
        json!({
            "type": "string",
            "format": "uuid",
            "pattern": UUID_PATTERN
        })
    }

    fn encode(&self, value: &Datum) -> Result<Value, EncodeError> {
        match value {
            Datum::Uuid(uuid) => Ok(Value::String(uuid.to_string())),
            other => Err(EncodeError::TypeMismatch {
                expected: "uuid".to_owned(),
                found: other.type_label(),
            }),
        }
    }

    fn decode(&self, value: &Value) -> Result<Datum, DecodeError> {
        let s = expect_str(value, "uuid")?;
        Uuid::parse_str(s)
            .map(Datum::Uuid)
            .map_err(|e| DecodeError::Scalar {
                scalar: scalar_names::UUID.to_owned(),
                reason: format!("invalid UUID {s:?}: {e}"),
            })
    }
}

/// Decimals carried as JSON numbers.
///
/// With a precision, the schema constrains values with `multipleOf`
/// (precision 2 → `0.01`). Decoding goes through the number's shortest
/// decimal rendering, so `49.99` on the wire becomes exactly `49.99`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecimalCodec {
    precision: Option<u32>,
}

impl DecimalCodec {
    pub fn new() -> Self {
        DecimalCodec { precision: None }
    }

    /// Constrain values to the given number of decimal places.
    pub fn with_precision(precision: u32) -> Self {
        DecimalCodec {
            precision: Some(precision),
        }
    }
}

impl ScalarCodec for DecimalCodec {
    fn schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_owned(), json!("number"));
        if let Some(precision) = self.precision {
            if precision > 0 {
                let step = 10f64.powi(-(precision as i32));
                if let Some(number) = serde_json::Number::from_f64(step) {
                    schema.insert("multipleOf".to_owned(), Value::Number(number));
                }
            }
        }
        Value::Object(schema)
    }

    fn encode(&self, value: &Datum) -> Result<Value, EncodeError> {
        match value {
            Datum::Decimal(decimal) => {
                let float = rust_decimal::prelude::ToPrimitive::to_f64(decimal).ok_or_else(
                    || EncodeError::Scalar {
                        scalar: scalar_names::DECIMAL.to_owned(),
                        reason: format!("decimal {decimal} is not representable as a number"),
                    },
                )?;
                serde_json::Number::from_f64(float)
                    .map(Value::Number)
                    .ok_or_else(|| EncodeError::Scalar {
                        scalar: scalar_names::DECIMAL.to_owned(),
                        reason: format!("decimal {decimal} is not a finite number"),
                    })
            }
            other => Err(EncodeError::TypeMismatch {
                expected: "decimal number".to_owned(),
                found: other.type_label(),
            }),
        }
    }

    fn decode(&self, value: &Value) -> Result<Datum, DecodeError> {
        match value {
            Value::Number(number) => number
                .to_string()
                .parse::<Decimal>()
                .map(Datum::Decimal)
                .map_err(|e| DecodeError::Scalar {
                    scalar: scalar_names::DECIMAL.to_owned(),
                    reason: format!("number {number} is not a valid decimal: {e}"),
                }),
            other => Err(DecodeError::TypeMismatch {
                expected: "decimal number".to_owned(),
                found: json_type_label(other),
            }),
        }
    }
}

/// IPv4 addresses in dotted-quad string form.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ipv4Codec;

impl ScalarCodec for Ipv4Codec {
    fn schema(&self) -> Value {
        json!({"type": "string", "format": "ipv4"})
    }

    fn encode(&self, value: &Datum) -> Result<Value, EncodeError> {
        match value {
            Datum::Ip(std::net::IpAddr::V4(addr)) => Ok(Value::String(addr.to_string())),
            other => Err(EncodeError::TypeMismatch {
                expected: "ipv4 address".to_owned(),
                found: other.type_label(),
            }),
        }
    }

    fn decode(&self, value: &Value) -> Result<Datum, DecodeError> {
        let s = expect_str(value, "ipv4")?;
        s.parse::<Ipv4Addr>()
            .map(|addr| Datum::Ip(addr.into()))
            .map_err(|e| DecodeError::Scalar {
                scalar: scalar_names::IPV4.to_owned(),
                reason: format!("invalid IPv4 address {s:?}: {e}"),
            })
    }
}

/// IPv6 addresses in canonical string form.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ipv6Codec;

impl ScalarCodec for Ipv6Codec {
    fn schema(&self) -> Value {
        json!({"type": "string", "format": "ipv6"})
    }

    fn encode(&self, value: &Datum) -> Result<Value, EncodeError> {
        match value {
            Datum::Ip(std::net::IpAddr::V6(addr)) => Ok(Value::String(addr.to_string())),
            other => Err(EncodeError::TypeMismatch {
                expected: "ipv6 address".to_owned(),
                found: other.type_label(),
            }),
        }
    }

    fn decode(&self, value: &Value) -> Result<Datum, DecodeError> {
        let s = expect_str(value, "ipv6")?;
        s.parse::<Ipv6Addr>()
            .map(|addr| Datum::Ip(addr.into()))
            .map_err(|e| DecodeError::Scalar {
                scalar: scalar_names::IPV6.to_owned(),
                reason: format!("invalid IPv6 address {s:?}: {e}"),
            })
    }
}
