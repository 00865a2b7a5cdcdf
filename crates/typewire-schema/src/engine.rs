//! # The Engine
//!
//! [`Engine`] owns the two registries and every lazy cache: the per-record
//! field model, the per-dialect schema documents, and the per-shape codec
//! plans. It is passed by shared reference; all public operations take
//! `&self`.
//!
//! ## Cache Discipline
//!
//! Every cached artifact is a pure function of the immutable descriptors,
//! so a cold-cache race between two threads is resolved by idempotent
//! recomputation: both compute outside the lock, both insert, last writer
//! wins, and either result is correct. Nothing is ever invalidated — the
//! registries cannot change once the engine holds them.
//!
//! ## Validation
//!
//! Validation runs at the outermost encode/decode call only, against the
//! default-dialect standalone schema. Nested records are converted without
//! re-validation; the outer schema already constrains the full tree.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use typewire_core::{
    classify, json_type_label, Datum, DecodeError, EncodeError, FieldDefault, FieldMetadata,
    RecordDescriptor, RecordValue, TypeShape,
};

use crate::codec::CodecPlan;
use crate::dialect::{SchemaOptions, DEFAULT_DIALECT};
use crate::registry::TypeRegistry;
use crate::scalars::CodecRegistry;
use crate::validate::{JsonschemaValidator, WireValidator};

/// Options for encoding a record to its wire form.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Drop fields whose value is an empty optional instead of emitting
    /// `null`. On by default.
    pub omit_absent: bool,
    /// Validate the assembled wire object against the record's schema.
    pub validate: bool,
    /// Whether the validation schema carries enum member lists.
    pub validate_enums: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            omit_absent: true,
            validate: false,
            validate_enums: true,
        }
    }
}

impl EncodeOptions {
    /// Validate the output against the record's schema.
    pub fn validated(mut self) -> Self {
        self.validate = true;
        self
    }

    /// Emit `null` for empty optionals instead of dropping them.
    pub fn keep_absent(mut self) -> Self {
        self.omit_absent = false;
        self
    }
}

/// Options for decoding a record from its wire form.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Validate the wire data against the record's schema before decoding.
    /// On by default.
    pub validate: bool,
    /// Strict enum decoding: an unrecognized member value is an error.
    /// When off, unrecognized values pass through raw with a warning.
    pub validate_enums: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            validate: true,
            validate_enums: true,
        }
    }
}

impl DecodeOptions {
    /// Skip schema validation.
    pub fn unvalidated(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Lenient enum decoding: unrecognized values pass through raw.
    pub fn lenient_enums(mut self) -> Self {
        self.validate_enums = false;
        self
    }
}

/// The effective discriminator of a record.
#[derive(Debug, Clone)]
pub struct DiscriminatorModel {
    /// The synthetic wire property carrying the concrete type name.
    pub key: String,
    /// True when the discriminator is declared on an ancestor.
    pub inherited: bool,
}

/// One field of the derived field model.
#[derive(Debug, Clone)]
pub struct FieldModel {
    pub name: String,
    pub wire_name: String,
    pub shape: TypeShape,
    /// No default and not optional-shaped (and not computed).
    pub required: bool,
    pub default: FieldDefault,
    /// The default's encoded form, computed once through the codec engine;
    /// surfaces as the schema `default` property.
    pub default_wire: Option<Value>,
    /// Metadata examples, encoded the same way.
    pub examples_wire: Vec<Value>,
    pub metadata: FieldMetadata,
    pub computed: bool,
}

/// The derived model of a record type: classified shapes, wire names,
/// encoded defaults, and the flattened inheritance chain. Built once per
/// record and cached for the engine's lifetime.
#[derive(Debug)]
pub struct RecordModel {
    pub name: String,
    pub description: Option<String>,
    /// The record's own fields, declaration order. Schema generation uses
    /// these: a subtype's schema lists only subtype fields under `allOf`.
    pub own_fields: Vec<FieldModel>,
    /// The full field list with the base chain flattened in, root first.
    /// A redeclared field keeps its original position with the subtype's
    /// definition. The wire codec uses these.
    pub all_fields: Vec<FieldModel>,
    pub base: Option<String>,
    pub discriminator: Option<DiscriminatorModel>,
    pub allow_additional_properties: bool,
}

/// A cached schema body plus its definitions map.
pub(crate) struct SchemaParts {
    pub body: Value,
    pub definitions: Map<String, Value>,
}

/// The schema/codec engine.
pub struct Engine {
    pub(crate) types: TypeRegistry,
    pub(crate) codecs: CodecRegistry,
    validator: Box<dyn WireValidator>,
    models: RwLock<HashMap<String, Arc<RecordModel>>>,
    pub(crate) schemas: RwLock<HashMap<(String, SchemaOptions), Arc<SchemaParts>>>,
    pub(crate) plans: RwLock<HashMap<String, Arc<CodecPlan>>>,
}

impl Engine {
    /// An engine over the given types, with the built-in scalar codecs and
    /// the default `jsonschema`-backed validator.
    pub fn new(types: TypeRegistry) -> Self {
        Engine::with_codecs(types, CodecRegistry::with_builtins())
    }

    /// An engine with a custom codec registry.
    pub fn with_codecs(types: TypeRegistry, codecs: CodecRegistry) -> Self {
        Engine {
            types,
            codecs,
            validator: Box::new(JsonschemaValidator),
            models: RwLock::new(HashMap::new()),
            schemas: RwLock::new(HashMap::new()),
            plans: RwLock::new(HashMap::new()),
        }
    }

    /// Substitute the validator collaborator.
    pub fn with_validator(mut self, validator: Box<dyn WireValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// The derived field model of a record, built on first use.
    pub fn record_model(&self, name: &str) -> Option<Arc<RecordModel>> {
        if let Ok(models) = self.models.read() {
            if let Some(model) = models.get(name) {
                return Some(model.clone());
            }
        }
        let descriptor = self.types.record(name)?;
        let model = Arc::new(self.build_model(&descriptor));
        if let Ok(mut models) = self.models.write() {
            models.insert(name.to_owned(), model.clone());
        }
        Some(model)
    }

    fn build_model(&self, descriptor: &RecordDescriptor) -> RecordModel {
        let discriminator = self
            .types
            .discriminator_of(&descriptor.name)
            .map(|(key, inherited)| DiscriminatorModel { key, inherited });

        let mut own_fields = Vec::with_capacity(descriptor.fields.len());
        for field in &descriptor.fields {
            if field.is_private() {
                continue;
            }
            let shape = classify(&field.expr);
            let required =
                field.default.is_none() && !shape.makes_field_optional() && !field.computed;

            let default_datum = match &field.default {
                FieldDefault::Value(datum) => Some(datum.clone()),
                FieldDefault::Factory(factory) => Some(factory()),
                FieldDefault::None => None,
            };
            // An absent default (the "optional, defaults to nothing"
            // pattern) never surfaces in the schema.
            let default_wire = default_datum.filter(|datum| !datum.is_absent()).and_then(|datum| {
                match self.encode_value(&shape, &datum, false) {
                    Ok(value) => Some(value),
                    Err(error) => {
                        tracing::warn!(
                            record = %descriptor.name,
                            field = %field.name,
                            %error,
                            "failed to encode field default; omitting it from the schema"
                        );
                        None
                    }
                }
            });
            let examples_wire = field
                .metadata
                .examples
                .iter()
                .filter_map(|example| match self.encode_value(&shape, example, false) {
                    Ok(value) => Some(value),
                    Err(error) => {
                        tracing::warn!(
                            record = %descriptor.name,
                            field = %field.name,
                            %error,
                            "failed to encode field example; omitting it from the schema"
                        );
                        None
                    }
                })
                .collect();

            own_fields.push(FieldModel {
                name: field.name.clone(),
                wire_name: field.wire_name.clone(),
                shape,
                required,
                default: field.default.clone(),
                default_wire,
                examples_wire,
                metadata: field.metadata.clone(),
                computed: field.computed,
            });
        }

        let mut all_fields: Vec<FieldModel> = match &descriptor.base {
            Some(base) => self
                .record_model(base)
                .map(|model| model.all_fields.clone())
                .unwrap_or_default(),
            None => Vec::new(),
        };
        for field in &own_fields {
            if let Some(existing) = all_fields.iter_mut().find(|f| f.name == field.name) {
                // A narrowed field keeps its inherited position.
                *existing = field.clone();
            } else {
                all_fields.push(field.clone());
            }
        }

        RecordModel {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            own_fields,
            all_fields,
            base: descriptor.base.clone(),
            discriminator,
            allow_additional_properties: descriptor.allow_additional_properties,
        }
    }

    /// Encode a record value to its wire object, in field declaration
    /// order, optionally validating the result.
    pub fn encode_record(
        &self,
        value: &RecordValue,
        options: EncodeOptions,
    ) -> Result<Value, EncodeError> {
        let wire = self.encode_record_value(value, options.omit_absent)?;
        if options.validate {
            let schema_options = SchemaOptions {
                dialect: DEFAULT_DIALECT,
                validate_enums: options.validate_enums,
            };
            let schema = self.json_schema(&value.type_name, schema_options, false)?;
            self.validator.validate(&schema, &wire, &value.type_name)?;
        }
        Ok(wire)
    }

    pub(crate) fn encode_record_value(
        &self,
        value: &RecordValue,
        omit_absent: bool,
    ) -> Result<Value, EncodeError> {
        let model = self
            .record_model(&value.type_name)
            .ok_or_else(|| EncodeError::UnknownRecord(value.type_name.clone()))?;

        let mut out = Map::new();
        for field in &model.all_fields {
            let datum = match value.field(&field.name) {
                Some(datum) => datum,
                // A computed property the instance did not supply is
                // simply not serialised.
                None if field.computed => continue,
                None => &Datum::Absent,
            };
            if datum.is_absent() && (omit_absent || field.computed) {
                continue;
            }
            let encoded = self.encode_value(&field.shape, datum, omit_absent)?;
            out.insert(field.wire_name.clone(), encoded);
        }
        if let Some(discriminator) = &model.discriminator {
            out.insert(
                discriminator.key.clone(),
                Value::String(value.type_name.clone()),
            );
        }
        Ok(Value::Object(out))
    }

    /// Decode a wire object into a record value, validating first unless
    /// disabled. A discriminator in the data dispatches to the registered
    /// concrete subtype.
    pub fn decode_record(
        &self,
        name: &str,
        data: &Value,
        options: DecodeOptions,
    ) -> Result<RecordValue, DecodeError> {
        if options.validate {
            let schema_options = SchemaOptions {
                dialect: DEFAULT_DIALECT,
                validate_enums: options.validate_enums,
            };
            let schema = self.json_schema(name, schema_options, false)?;
            self.validator.validate(&schema, data, name)?;
        }
        self.decode_record_value(name, data, options.validate_enums)
    }

    pub(crate) fn decode_record_value(
        &self,
        name: &str,
        data: &Value,
        validate_enums: bool,
    ) -> Result<RecordValue, DecodeError> {
        let model = self
            .record_model(name)
            .ok_or_else(|| DecodeError::UnknownRecord(name.to_owned()))?;
        let object = data.as_object().ok_or_else(|| DecodeError::TypeMismatch {
            expected: format!("object for record '{name}'"),
            found: json_type_label(data),
        })?;

        if let Some(discriminator) = &model.discriminator {
            if let Some(tag) = object.get(&discriminator.key).and_then(Value::as_str) {
                if tag != name {
                    let subtype = self.types.resolve_subtype(name, tag).ok_or_else(|| {
                        DecodeError::UnknownSubtype {
                            base: name.to_owned(),
                            tag: tag.to_owned(),
                        }
                    })?;
                    return self.decode_record_value(&subtype, data, validate_enums);
                }
            }
        }

        let mut fields = Vec::with_capacity(model.all_fields.len());
        for field in &model.all_fields {
            if field.computed {
                continue;
            }
            match object.get(&field.wire_name) {
                Some(value) => fields.push((
                    field.name.clone(),
                    self.decode_value(&field.shape, value, validate_enums)?,
                )),
                None => match &field.default {
                    FieldDefault::Value(datum) => {
                        fields.push((field.name.clone(), datum.clone()))
                    }
                    FieldDefault::Factory(factory) => {
                        fields.push((field.name.clone(), factory()))
                    }
                    FieldDefault::None if field.required => {
                        return Err(DecodeError::MissingField {
                            record: name.to_owned(),
                            field: field.wire_name.clone(),
                        });
                    }
                    FieldDefault::None => fields.push((field.name.clone(), Datum::Absent)),
                },
            }
        }
        Ok(RecordValue {
            type_name: model.name.clone(),
            fields,
        })
    }

    /// Encode a single value of the given shape.
    pub fn encode_value(
        &self,
        shape: &TypeShape,
        datum: &Datum,
        omit_absent: bool,
    ) -> Result<Value, EncodeError> {
        let plan = self.plan_for(shape);
        self.encode_plan(&plan, datum, omit_absent)
    }

    /// Decode a single wire value of the given shape.
    pub fn decode_value(
        &self,
        shape: &TypeShape,
        value: &Value,
        validate_enums: bool,
    ) -> Result<Datum, DecodeError> {
        let plan = self.plan_for(shape);
        self.decode_plan(&plan, value, validate_enums)
    }
}
