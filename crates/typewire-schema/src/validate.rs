//! # Validator Collaborator
//!
//! The engine never judges wire data itself: conformance checking is
//! delegated to a pluggable [`WireValidator`], handed the generated schema
//! and the wire value. The default implementation is backed by the
//! `jsonschema` crate; substituting another validator changes nothing in
//! engine behavior as long as it reports failures as a
//! [`ValidationFailure`] with structured violations.
//!
//! Validation happens at the outermost encode/decode call only — nested
//! records are decoded without re-validation, since the outer schema
//! already constrains the whole tree.

use serde_json::Value;
use typewire_core::{ValidationFailure, ValidationViolations, Violation};

/// Checks a wire value against a generated JSON Schema document.
pub trait WireValidator: Send + Sync {
    /// Validates `instance` against `schema`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFailure`] carrying every violation found.
    /// `schema_name` is only used to label the failure.
    fn validate(
        &self,
        schema: &Value,
        instance: &Value,
        schema_name: &str,
    ) -> Result<(), ValidationFailure>;
}

/// The default validator, backed by the `jsonschema` crate.
///
/// The draft is selected from the document's `$schema` URI; generated
/// standalone documents always carry one.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonschemaValidator;

impl WireValidator for JsonschemaValidator {
    fn validate(
        &self,
        schema: &Value,
        instance: &Value,
        schema_name: &str,
    ) -> Result<(), ValidationFailure> {
        let validator =
            jsonschema::validator_for(schema).map_err(|e| ValidationFailure {
                schema_name: schema_name.to_owned(),
                violations: ValidationViolations::new(vec![Violation {
                    instance_path: String::new(),
                    schema_path: String::new(),
                    message: format!("schema compilation failed: {e}"),
                }]),
            })?;

        let violations: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure {
                schema_name: schema_name.to_owned(),
                violations: ValidationViolations::new(violations),
            })
        }
    }
}
