//! # In-Memory Value Trees
//!
//! [`Datum`] is the engine-side counterpart of the JSON wire value: a typed
//! value tree mirroring the shape vocabulary, with scalar leaves carried in
//! their native representations (timestamps, UUIDs, decimals, addresses)
//! rather than as strings. Record instances convert themselves into a
//! [`RecordValue`] before encoding, and decoding produces one back — the
//! codec engine never touches concrete record types.
//!
//! Two distinct empty states exist: [`Datum::Absent`] is an empty optional
//! (encoded by omission under the omit policy), while [`Datum::Null`] is an
//! explicit wire `null` (always emitted).

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::net::IpAddr;
use uuid::Uuid;

use crate::error::DecodeError;

/// A typed in-memory value, the unit the codec engine encodes and decodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// An empty optional; omitted from wire objects under the omit policy.
    Absent,
    /// An explicit wire `null`.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An RFC 3339 instant. UTC instants encode with the `Z` suffix.
    Timestamp(DateTime<FixedOffset>),
    Uuid(Uuid),
    Decimal(Decimal),
    Ip(IpAddr),
    /// A member of a registered enum type.
    Enum(EnumValue),
    List(Vec<Datum>),
    Tuple(Vec<Datum>),
    /// Set elements in iteration order; uniqueness is the caller's contract.
    Set(Vec<Datum>),
    /// Ordered key/value pairs; keys are themselves typed datums.
    Map(Vec<(Datum, Datum)>),
    Record(RecordValue),
}

/// A reference to one member of a registered enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// Schema name of the enum type.
    pub type_name: String,
    /// Member name within the enum.
    pub member: String,
}

/// An untyped record instance: the record's schema name plus its field
/// values in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    pub type_name: String,
    pub fields: Vec<(String, Datum)>,
}

impl RecordValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        RecordValue {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field value; builder-style.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Datum>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Look up a field value by host name.
    pub fn field(&self, name: &str) -> Option<&Datum> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Look up a field value, erroring with the record context when missing.
    pub fn expect_field(&self, name: &str) -> Result<&Datum, DecodeError> {
        self.field(name).ok_or_else(|| DecodeError::MissingField {
            record: self.type_name.clone(),
            field: name.to_owned(),
        })
    }
}

impl Datum {
    /// A record instance value.
    pub fn record(value: RecordValue) -> Self {
        Datum::Record(value)
    }

    /// A member of a registered enum.
    pub fn enum_member(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Datum::Enum(EnumValue {
            type_name: type_name.into(),
            member: member.into(),
        })
    }

    /// A timestamp from a UTC instant.
    pub fn utc_timestamp(instant: DateTime<Utc>) -> Self {
        Datum::Timestamp(instant.fixed_offset())
    }

    /// A timestamp from a timezone-less wall-clock value.
    ///
    /// The instant is assumed to be UTC — there is no way to recover the
    /// intended zone — and a warning records the assumption.
    pub fn from_naive_datetime(naive: NaiveDateTime) -> Self {
        tracing::warn!("timezone-less datetime value, assuming UTC");
        Datum::Timestamp(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).fixed_offset())
    }

    /// Lift an optional into `Absent`/value form.
    pub fn from_option<T: Into<Datum>>(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Datum::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Datum::Absent)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric access; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Float(f) => Some(*f),
            Datum::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Datum::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Datum::Uuid(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            Datum::Decimal(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<&IpAddr> {
        match self {
            Datum::Ip(ip) => Some(ip),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Datum::Enum(ev) => Some(ev),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Datum]> {
        match self {
            Datum::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Datum]> {
        match self {
            Datum::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&[Datum]> {
        match self {
            Datum::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Datum, Datum)]> {
        match self {
            Datum::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Datum::Record(rv) => Some(rv),
            _ => None,
        }
    }

    /// A short label for error messages.
    pub fn type_label(&self) -> &'static str {
        match self {
            Datum::Absent => "absent",
            Datum::Null => "null",
            Datum::Bool(_) => "boolean",
            Datum::Int(_) => "integer",
            Datum::Float(_) => "number",
            Datum::Str(_) => "string",
            Datum::Timestamp(_) => "timestamp",
            Datum::Uuid(_) => "uuid",
            Datum::Decimal(_) => "decimal",
            Datum::Ip(_) => "ip address",
            Datum::Enum(_) => "enum member",
            Datum::List(_) => "list",
            Datum::Tuple(_) => "tuple",
            Datum::Set(_) => "set",
            Datum::Map(_) => "map",
            Datum::Record(_) => "record",
        }
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Datum::Bool(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::Int(value)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Float(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::Str(value.to_owned())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::Str(value)
    }
}

impl From<Uuid> for Datum {
    fn from(value: Uuid) -> Self {
        Datum::Uuid(value)
    }
}

impl From<Decimal> for Datum {
    fn from(value: Decimal) -> Self {
        Datum::Decimal(value)
    }
}

impl From<IpAddr> for Datum {
    fn from(value: IpAddr) -> Self {
        Datum::Ip(value)
    }
}

impl From<RecordValue> for Datum {
    fn from(value: RecordValue) -> Self {
        Datum::Record(value)
    }
}

impl From<EnumValue> for Datum {
    fn from(value: EnumValue) -> Self {
        Datum::Enum(value)
    }
}

/// A short label for a JSON value's type, for error messages.
pub fn json_type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
