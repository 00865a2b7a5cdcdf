//! # Schema Generator & Definition Resolver
//!
//! Produces a JSON-Schema-compatible fragment per shape and the full
//! document per record, in any of the four dialects. Nested record
//! references become `$ref`s and land in the active [`DefinitionSet`]; the
//! resolver reserves a record's slot *before* recursing into its body, so
//! self- and mutually-referential records terminate on the second visit.
//!
//! Field metadata merges onto the computed fragment last — metadata never
//! loses to structural keys.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use typewire_core::{PrimitiveKind, SchemaError, TypeShape};

use crate::dialect::{SchemaDialect, SchemaOptions};
use crate::engine::{Engine, FieldModel, RecordModel, SchemaParts};

/// Ordered record-name → schema-fragment map with placeholder reservation
/// to break reference cycles.
#[derive(Debug, Default)]
pub struct DefinitionSet {
    entries: Vec<(String, Option<Value>)>,
}

impl DefinitionSet {
    pub fn new() -> Self {
        DefinitionSet::default()
    }

    /// True once a name is reserved or filled.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(entry, _)| entry == name)
    }

    /// Reserve a slot before recursing into the record's own schema.
    pub(crate) fn reserve(&mut self, name: &str) {
        self.entries.push((name.to_owned(), None));
    }

    /// Fill a reserved slot with the finished schema body.
    pub(crate) fn fill(&mut self, name: &str, schema: Value) {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(entry, _)| entry == name) {
            *slot = Some(schema);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The finished definitions, in first-encountered order.
    pub fn into_map(self) -> Map<String, Value> {
        self.entries
            .into_iter()
            .filter_map(|(name, schema)| schema.map(|s| (name, s)))
            .collect()
    }
}

impl Engine {
    /// The schema document for a record.
    ///
    /// Standalone documents carry `$schema` and a `definitions` map (when
    /// non-empty); embeddable output is a flat map of every involved
    /// definition including the record itself, ready for insertion into a
    /// larger document. The API-specification dialects are embeddable-only
    /// and fall back to Draft-06 with a warning when requested standalone.
    ///
    /// Documents are cached per record and options; repeated calls return
    /// structurally identical values.
    pub fn json_schema(
        &self,
        record: &str,
        options: SchemaOptions,
        embeddable: bool,
    ) -> Result<Value, SchemaError> {
        let mut options = options;
        if options.dialect.is_api_spec() && !embeddable {
            tracing::warn!(
                dialect = %options.dialect,
                "API-specification dialects are embeddable-only; falling back to Draft-06"
            );
            options.dialect = SchemaDialect::Draft06;
        }

        let parts = self.schema_parts(record, options)?;
        if embeddable {
            let mut out = parts.definitions.clone();
            out.insert(record.to_owned(), parts.body.clone());
            Ok(Value::Object(out))
        } else {
            let mut out = match &parts.body {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            };
            if let Some(uri) = options.dialect.schema_uri() {
                out.insert("$schema".to_owned(), json!(uri));
            }
            if !parts.definitions.is_empty() {
                out.insert(
                    "definitions".to_owned(),
                    Value::Object(parts.definitions.clone()),
                );
            }
            Ok(Value::Object(out))
        }
    }

    /// Embeddable schemas for every registered record, merged into one
    /// definitions map in registration order.
    pub fn all_schemas(&self, options: SchemaOptions) -> Result<Value, SchemaError> {
        let names: Vec<String> = self.types.record_names().map(str::to_owned).collect();
        let mut out = Map::new();
        for name in names {
            if let Value::Object(map) = self.json_schema(&name, options, true)? {
                for (key, value) in map {
                    out.insert(key, value);
                }
            }
        }
        Ok(Value::Object(out))
    }

    pub(crate) fn schema_parts(
        &self,
        record: &str,
        options: SchemaOptions,
    ) -> Result<Arc<SchemaParts>, SchemaError> {
        let key = (record.to_owned(), options);
        if let Ok(schemas) = self.schemas.read() {
            if let Some(parts) = schemas.get(&key) {
                return Ok(parts.clone());
            }
        }

        let model = self
            .record_model(record)
            .ok_or_else(|| SchemaError::UnknownRecord(record.to_owned()))?;
        let mut definitions = DefinitionSet::new();
        let body = self.record_body(&model, options, &mut definitions)?;
        let parts = Arc::new(SchemaParts {
            body,
            definitions: definitions.into_map(),
        });
        if let Ok(mut schemas) = self.schemas.write() {
            schemas.insert(key, parts.clone());
        }
        Ok(parts)
    }

    /// The schema body of a record: `{type: object, properties, required}`
    /// plus the additional-properties policy, the discriminator structure,
    /// and the `allOf` wrapper for subtypes.
    pub(crate) fn record_body(
        &self,
        model: &RecordModel,
        options: SchemaOptions,
        definitions: &mut DefinitionSet,
    ) -> Result<Value, SchemaError> {
        let mut properties = Map::new();
        let mut required: Vec<Value> = Vec::new();
        for field in &model.own_fields {
            let fragment = self.field_fragment(field, options, definitions)?;
            self.collect_definitions(&field.shape, options, definitions)?;
            properties.insert(field.wire_name.clone(), fragment);
            if field.required {
                required.push(Value::String(field.wire_name.clone()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_owned(), json!("object"));

        if let Some(discriminator) = &model.discriminator {
            // The synthetic discriminator property belongs to the record
            // that declared it, in the dialect that can express it.
            if options.dialect == SchemaDialect::OpenApi3 && !discriminator.inherited {
                properties.insert(discriminator.key.clone(), json!({"type": "string"}));
                required.push(Value::String(discriminator.key.clone()));
                schema.insert(
                    "discriminator".to_owned(),
                    json!({"propertyName": discriminator.key.clone()}),
                );
            }
        }

        schema.insert("properties".to_owned(), Value::Object(properties));
        // Draft-04 consumers reject an empty required array.
        if !required.is_empty() {
            schema.insert("required".to_owned(), Value::Array(required));
        }
        if !model.allow_additional_properties {
            schema.insert("additionalProperties".to_owned(), json!(false));
        }

        let mut schema = Value::Object(schema);
        if let Some(base) = &model.base {
            self.resolve_record_into(base, options, definitions)?;
            schema = json!({
                "allOf": [options.dialect.reference(base), schema]
            });
        }
        if let Some(description) = &model.description {
            if let Value::Object(map) = &mut schema {
                map.insert("description".to_owned(), json!(description));
            }
        }
        Ok(schema)
    }

    fn field_fragment(
        &self,
        field: &FieldModel,
        options: SchemaOptions,
        definitions: &mut DefinitionSet,
    ) -> Result<Value, SchemaError> {
        let mut fragment = self.fragment(&field.shape, options, definitions)?;
        self.merge_field_metadata(&mut fragment, field, options);
        Ok(fragment)
    }

    fn merge_field_metadata(
        &self,
        fragment: &mut Value,
        field: &FieldModel,
        options: SchemaOptions,
    ) {
        let map = match fragment {
            Value::Object(map) => map,
            _ => return,
        };
        if let Some(default) = &field.default_wire {
            map.insert("default".to_owned(), default.clone());
        }
        if !field.examples_wire.is_empty() {
            // Swagger 2 supports a single example value per property.
            if options.dialect == SchemaDialect::Swagger2 {
                map.insert("example".to_owned(), field.examples_wire[0].clone());
            } else {
                map.insert(
                    "examples".to_owned(),
                    Value::Array(field.examples_wire.clone()),
                );
            }
        }
        if let Some(description) = &field.metadata.description {
            map.insert("description".to_owned(), json!(description));
        }
        if let Some(title) = &field.metadata.title {
            map.insert("title".to_owned(), json!(title));
        }
        if options.dialect == SchemaDialect::OpenApi3 {
            if let Some(read_only) = field.metadata.read_only {
                map.insert("readOnly".to_owned(), json!(read_only));
                if read_only && field.default_wire.is_none() {
                    tracing::warn!(
                        field = %field.name,
                        "read-only field should have a default value"
                    );
                }
            }
            if let Some(write_only) = field.metadata.write_only {
                map.insert("writeOnly".to_owned(), json!(write_only));
            }
        }
        if options.dialect.supports_extensions() {
            for (key, value) in &field.metadata.extensions {
                map.insert(format!("x-{key}"), value.clone());
            }
        }
        if field.computed {
            map.insert("readOnly".to_owned(), json!(true));
        }
    }

    /// The schema fragment for one shape. One dispatch case per shape.
    pub(crate) fn fragment(
        &self,
        shape: &TypeShape,
        options: SchemaOptions,
        definitions: &mut DefinitionSet,
    ) -> Result<Value, SchemaError> {
        match shape {
            TypeShape::Primitive(kind) => Ok(json!({"type": kind.json_type()})),
            TypeShape::Scalar(name) => match self.codecs.lookup(name) {
                Some(codec) => Ok(codec.schema()),
                None => {
                    tracing::warn!(
                        scalar = %name,
                        "no codec registered for scalar type; emitting an object schema"
                    );
                    Ok(json!({"type": "object"}))
                }
            },
            // Optionality is a field-presence concern, not a schema one.
            TypeShape::Optional(inner) => self.fragment(inner, options, definitions),
            TypeShape::Nullable(inner) => {
                let inner_fragment = self.fragment(inner, options, definitions)?;
                Ok(match options.dialect {
                    SchemaDialect::OpenApi3 => {
                        let mut map = match inner_fragment {
                            Value::Object(map) => map,
                            other => {
                                let mut map = Map::new();
                                map.insert("allOf".to_owned(), json!([other]));
                                map
                            }
                        };
                        map.insert("nullable".to_owned(), json!(true));
                        Value::Object(map)
                    }
                    // Swagger 2 has no way to say it; the marker is dropped.
                    SchemaDialect::Swagger2 => inner_fragment,
                    _ => json!({"oneOf": [inner_fragment, {"type": "null"}]}),
                })
            }
            TypeShape::Union(variants) => {
                if !options.dialect.supports_unions() {
                    return Err(SchemaError::UnsupportedDialect {
                        dialect: options.dialect.to_string(),
                        feature: "type unions".to_owned(),
                    });
                }
                let fragments = variants
                    .iter()
                    .map(|variant| self.fragment(variant, options, definitions))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({"oneOf": fragments}))
            }
            TypeShape::Literal(values) => Ok(json!({"enum": values})),
            TypeShape::Enum(name) => self.enum_fragment(name, options),
            TypeShape::Mapping(_, value) => {
                let mut fragment = Map::new();
                fragment.insert("type".to_owned(), json!("object"));
                if !matches!(**value, TypeShape::Any) {
                    fragment.insert(
                        "additionalProperties".to_owned(),
                        self.fragment(value, options, definitions)?,
                    );
                }
                Ok(Value::Object(fragment))
            }
            TypeShape::Sequence(elem) | TypeShape::VariadicTuple(elem) => {
                self.array_fragment(elem, options, definitions)
            }
            TypeShape::Set(elem) => {
                let mut fragment = match self.array_fragment(elem, options, definitions)? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                fragment.insert("uniqueItems".to_owned(), json!(true));
                Ok(Value::Object(fragment))
            }
            TypeShape::FixedTuple(elems) => {
                let items = elems
                    .iter()
                    .map(|elem| self.fragment(elem, options, definitions))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({
                    "type": "array",
                    "minItems": elems.len(),
                    "maxItems": elems.len(),
                    "items": items
                }))
            }
            TypeShape::Record(name) => {
                self.resolve_record_into(name, options, definitions)?;
                Ok(options.dialect.reference(name))
            }
            TypeShape::Wrapped(inner) => self.fragment(inner, options, definitions),
            TypeShape::Any => Ok(json!({})),
            TypeShape::Opaque(description) => {
                tracing::warn!(
                    shape = %description,
                    "opaque type shape; emitting an object schema"
                );
                Ok(json!({"type": "object"}))
            }
        }
    }

    fn array_fragment(
        &self,
        elem: &TypeShape,
        options: SchemaOptions,
        definitions: &mut DefinitionSet,
    ) -> Result<Value, SchemaError> {
        let mut fragment = Map::new();
        fragment.insert("type".to_owned(), json!("array"));
        if !matches!(elem, TypeShape::Any) {
            fragment.insert(
                "items".to_owned(),
                self.fragment(elem, options, definitions)?,
            );
        }
        Ok(Value::Object(fragment))
    }

    fn enum_fragment(&self, name: &str, options: SchemaOptions) -> Result<Value, SchemaError> {
        let descriptor = self
            .types
            .enumeration(name)
            .ok_or_else(|| SchemaError::UnknownEnum(name.to_owned()))?;

        let mut kinds: Vec<PrimitiveKind> = Vec::new();
        let mut all_primitive = true;
        for (_, value) in &descriptor.members {
            match PrimitiveKind::of_value(value) {
                Some(kind) => {
                    if !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                None => {
                    all_primitive = false;
                    break;
                }
            }
        }

        let mut fragment = Map::new();
        if all_primitive {
            if let [kind] = kinds.as_slice() {
                fragment.insert("type".to_owned(), json!(kind.json_type()));
            }
        }
        if options.validate_enums {
            fragment.insert("enum".to_owned(), Value::Array(descriptor.values()));
            // JSON Schema proper has no extension properties; the API
            // dialects carry the enum's name for code generators.
            if options.dialect.supports_extensions() {
                fragment.insert("x-enum-name".to_owned(), Value::String(descriptor.name.clone()));
            }
        }
        Ok(Value::Object(fragment))
    }

    /// Walk a shape for nested record references, filling the definition
    /// set. Reaches through every composite shape, including mapping keys.
    pub(crate) fn collect_definitions(
        &self,
        shape: &TypeShape,
        options: SchemaOptions,
        definitions: &mut DefinitionSet,
    ) -> Result<(), SchemaError> {
        match shape {
            TypeShape::Optional(inner)
            | TypeShape::Nullable(inner)
            | TypeShape::Wrapped(inner)
            | TypeShape::Sequence(inner)
            | TypeShape::Set(inner)
            | TypeShape::VariadicTuple(inner) => {
                self.collect_definitions(inner, options, definitions)
            }
            TypeShape::FixedTuple(elems) => {
                for elem in elems {
                    self.collect_definitions(elem, options, definitions)?;
                }
                Ok(())
            }
            TypeShape::Mapping(key, value) => {
                self.collect_definitions(key, options, definitions)?;
                self.collect_definitions(value, options, definitions)
            }
            TypeShape::Union(variants) => {
                for variant in variants {
                    self.collect_definitions(variant, options, definitions)?;
                }
                Ok(())
            }
            TypeShape::Record(name) => self.resolve_record_into(name, options, definitions),
            _ => Ok(()),
        }
    }

    /// Resolve one record into the definition set.
    ///
    /// The slot is reserved before recursing into the record's body, so a
    /// second visit — a self-reference or a mutual-reference cycle —
    /// short-circuits immediately instead of recursing forever.
    pub(crate) fn resolve_record_into(
        &self,
        name: &str,
        options: SchemaOptions,
        definitions: &mut DefinitionSet,
    ) -> Result<(), SchemaError> {
        if definitions.contains(name) {
            return Ok(());
        }
        definitions.reserve(name);
        let model = self
            .record_model(name)
            .ok_or_else(|| SchemaError::UnknownRecord(name.to_owned()))?;
        let body = self.record_body(&model, options, definitions)?;
        definitions.fill(name, body);
        Ok(())
    }
}
