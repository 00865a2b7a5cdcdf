//! # Record & Enum Descriptors
//!
//! Descriptors are the ahead-of-time replacement for reflection: a record
//! type declares its ordered field list (with resolved type expressions,
//! defaults, and metadata) once, at registration time, and the engine
//! derives everything else — schema documents, codecs, definitions — from
//! that single declaration.
//!
//! Declaration order is load-bearing: it is the schema property order, the
//! `required` list order, and the wire object key order.

use serde_json::Value;

use crate::datum::Datum;
use crate::expr::TypeExpr;

/// Host names beginning with this marker are dropped from schema and wire
/// representation entirely.
pub const PRIVATE_FIELD_MARKER: &str = "__";

/// A field's default, mutually exclusive with being required.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// No default: the field is required unless its shape is optional.
    None,
    /// A fixed default value.
    Value(Datum),
    /// A factory invoked per decode; also invoked once at model build time
    /// to compute the encoded default surfaced in the schema.
    Factory(fn() -> Datum),
}

impl FieldDefault {
    pub fn is_none(&self) -> bool {
        matches!(self, FieldDefault::None)
    }
}

/// Schema-facing field annotations, merged onto the generated fragment
/// after shape dispatch so metadata never loses to structural keys.
#[derive(Debug, Clone, Default)]
pub struct FieldMetadata {
    pub description: Option<String>,
    pub title: Option<String>,
    /// Example values, encoded through the codec engine before emission.
    pub examples: Vec<Datum>,
    /// OpenAPI 3 only.
    pub read_only: Option<bool>,
    /// OpenAPI 3 only.
    pub write_only: Option<bool>,
    /// Emitted with an `x-` prefix under Swagger/OpenAPI dialects.
    pub extensions: Vec<(String, Value)>,
}

/// One field of a record: host name, wire name, declared type, default,
/// and annotations.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Name of the field on the host type.
    pub name: String,
    /// Name used in wire objects and schema properties; remappable, e.g.
    /// to dodge a reserved word.
    pub wire_name: String,
    /// The declared type expression.
    pub expr: TypeExpr,
    pub default: FieldDefault,
    pub metadata: FieldMetadata,
    /// Whether the field participates in the host constructor. Advisory to
    /// typed conversions; decoded values for non-init fields are applied
    /// after construction.
    pub init: bool,
    /// A serialised computed property: read-only, present in output only,
    /// never accepted on input.
    pub computed: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, expr: TypeExpr) -> Self {
        let name = name.into();
        FieldDescriptor {
            wire_name: name.clone(),
            name,
            expr,
            default: FieldDefault::None,
            metadata: FieldMetadata::default(),
            init: true,
            computed: false,
        }
    }

    /// Remap the wire name.
    pub fn wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = wire_name.into();
        self
    }

    /// Give the field a fixed default value.
    pub fn default_value(mut self, value: impl Into<Datum>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Give the field a default factory.
    pub fn default_factory(mut self, factory: fn() -> Datum) -> Self {
        self.default = FieldDefault::Factory(factory);
        self
    }

    /// Replace the whole metadata block.
    pub fn metadata(mut self, metadata: FieldMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the metadata description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    /// Set the metadata title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    /// Attach example values.
    pub fn examples(mut self, examples: Vec<Datum>) -> Self {
        self.metadata.examples = examples;
        self
    }

    /// Mark read-only (OpenAPI 3).
    pub fn read_only(mut self) -> Self {
        self.metadata.read_only = Some(true);
        self
    }

    /// Mark write-only (OpenAPI 3).
    pub fn write_only(mut self) -> Self {
        self.metadata.write_only = Some(true);
        self
    }

    /// Attach an extension property (`x-` prefixed under Swagger/OpenAPI).
    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.extensions.push((key.into(), value));
        self
    }

    /// The field does not participate in the host constructor.
    pub fn no_init(mut self) -> Self {
        self.init = false;
        self
    }

    /// Mark as a serialised computed property.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// True when the host name carries the private-field marker and the
    /// field was not opted back in as a computed property.
    pub fn is_private(&self) -> bool {
        self.name.starts_with(PRIVATE_FIELD_MARKER) && !self.computed
    }
}

/// The declared shape of a record type.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    /// Schema name; the key under `definitions`.
    pub name: String,
    /// Record-level description, emitted on the schema body.
    pub description: Option<String>,
    /// Own fields in declaration order. For a subtype, the base's fields
    /// are not repeated here.
    pub fields: Vec<FieldDescriptor>,
    /// Base record for inheritance; must be registered first.
    pub base: Option<String>,
    /// Discriminator key, opting the record into tagged-union inheritance.
    pub discriminator: Option<String>,
    /// Whether wire objects may carry undeclared properties.
    pub allow_additional_properties: bool,
}

impl RecordDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        RecordDescriptor {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            base: None,
            discriminator: None,
            allow_additional_properties: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field; declaration order is preserved.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a base record.
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Opt into discriminated inheritance with the conventional key,
    /// `<Name>Type`.
    pub fn discriminator(mut self) -> Self {
        self.discriminator = Some(format!("{}Type", self.name));
        self
    }

    /// Opt into discriminated inheritance with an explicit key.
    pub fn discriminator_named(mut self, key: impl Into<String>) -> Self {
        self.discriminator = Some(key.into());
        self
    }

    /// Reject undeclared properties in wire objects.
    pub fn deny_additional_properties(mut self) -> Self {
        self.allow_additional_properties = false;
        self
    }
}

/// The declared members of an enum type, in declaration order.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    /// Schema name of the enum.
    pub name: String,
    /// Member name → underlying JSON value, in declaration order.
    pub members: Vec<(String, Value)>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        EnumDescriptor {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Append a member; declaration order is preserved.
    pub fn member(mut self, name: impl Into<String>, value: Value) -> Self {
        self.members.push((name.into(), value));
        self
    }

    /// The member whose underlying value equals `value`.
    pub fn member_by_value(&self, value: &Value) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, v)| v == value)
            .map(|(name, _)| name.as_str())
    }

    /// The underlying value of a member.
    pub fn value_of(&self, member: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|(name, _)| name == member)
            .map(|(_, value)| value)
    }

    /// The underlying values in declaration order.
    pub fn values(&self) -> Vec<Value> {
        self.members.iter().map(|(_, v)| v.clone()).collect()
    }
}
