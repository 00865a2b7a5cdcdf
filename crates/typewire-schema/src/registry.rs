//! # Type Registry
//!
//! The descriptor collaborator: every record and enum type is registered
//! here ahead of time, with resolved type expressions. The registry is the
//! only place that knows the inheritance graph, so discriminator dispatch
//! tables (base → subtypes) are populated as subtypes register.
//!
//! Registration happens before the engine is constructed; the engine holds
//! the registry immutably, so init-time-only mutation is enforced by the
//! borrow checker rather than by convention.

use std::collections::HashMap;
use std::sync::Arc;

use typewire_core::{EnumDescriptor, RecordDescriptor, RegistryError};

use crate::record::{WireEnum, WireRecord};

/// Registry of record and enum descriptors.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    records: HashMap<String, Arc<RecordDescriptor>>,
    enums: HashMap<String, Arc<EnumDescriptor>>,
    /// Base record name → directly registered subtype names, in
    /// registration order.
    subtypes: HashMap<String, Vec<String>>,
    /// Registration order of records, for deterministic `all_schemas`.
    order: Vec<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Register a record descriptor.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateRecord`] if the name is taken.
    /// - [`RegistryError::UnknownBase`] if the declared base is not
    ///   registered yet — bases must register before their subtypes.
    /// - [`RegistryError::AdditionalPropertiesConflict`] if the record
    ///   closes itself to additional properties while participating in
    ///   inheritance, on either side of the relationship.
    pub fn register(&mut self, descriptor: RecordDescriptor) -> Result<(), RegistryError> {
        if self.records.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateRecord(descriptor.name));
        }

        if let Some(base) = &descriptor.base {
            let base_descriptor =
                self.records
                    .get(base)
                    .cloned()
                    .ok_or_else(|| RegistryError::UnknownBase {
                        subtype: descriptor.name.clone(),
                        base: base.clone(),
                    })?;
            if !descriptor.allow_additional_properties {
                return Err(RegistryError::AdditionalPropertiesConflict {
                    record: descriptor.name,
                });
            }
            if !base_descriptor.allow_additional_properties {
                return Err(RegistryError::AdditionalPropertiesConflict {
                    record: base.clone(),
                });
            }
            self.subtypes
                .entry(base.clone())
                .or_default()
                .push(descriptor.name.clone());
        } else if descriptor.discriminator.is_some()
            && !descriptor.allow_additional_properties
        {
            // A discriminated base will grow subtype properties on the wire.
            return Err(RegistryError::AdditionalPropertiesConflict {
                record: descriptor.name,
            });
        }

        self.order.push(descriptor.name.clone());
        self.records
            .insert(descriptor.name.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Register a typed record via its [`WireRecord`] descriptor.
    pub fn register_record<R: WireRecord>(&mut self) -> Result<(), RegistryError> {
        self.register(R::descriptor())
    }

    /// Register an enum descriptor.
    pub fn register_enum(&mut self, descriptor: EnumDescriptor) -> Result<(), RegistryError> {
        if self.enums.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateEnum(descriptor.name));
        }
        self.enums
            .insert(descriptor.name.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Register a typed enum via its [`WireEnum`] descriptor.
    pub fn register_wire_enum<E: WireEnum>(&mut self) -> Result<(), RegistryError> {
        self.register_enum(E::descriptor())
    }

    pub fn record(&self, name: &str) -> Option<Arc<RecordDescriptor>> {
        self.records.get(name).cloned()
    }

    pub fn enumeration(&self, name: &str) -> Option<Arc<EnumDescriptor>> {
        self.enums.get(name).cloned()
    }

    /// Record names in registration order.
    pub fn record_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Directly registered subtypes of a base record.
    pub fn subtypes_of(&self, base: &str) -> &[String] {
        self.subtypes.get(base).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The effective discriminator of a record: its own, or the nearest
    /// one up the base chain. The flag is true when inherited.
    pub fn discriminator_of(&self, name: &str) -> Option<(String, bool)> {
        let mut current = self.records.get(name)?;
        if let Some(key) = &current.discriminator {
            return Some((key.clone(), false));
        }
        while let Some(base) = &current.base {
            current = self.records.get(base)?;
            if let Some(key) = &current.discriminator {
                return Some((key.clone(), true));
            }
        }
        None
    }

    /// Resolve a discriminator tag against the subtype tree of `base`.
    ///
    /// The tag is the concrete record's name; the search is depth-first
    /// over transitive subtypes, so grandchildren dispatch too.
    pub fn resolve_subtype(&self, base: &str, tag: &str) -> Option<String> {
        for subtype in self.subtypes_of(base) {
            if subtype == tag {
                return Some(subtype.clone());
            }
            if let Some(found) = self.resolve_subtype(subtype, tag) {
                return Some(found);
            }
        }
        None
    }

    /// Whether `name` is `base` or a transitive subtype of it.
    pub fn is_subtype_of(&self, name: &str, base: &str) -> bool {
        if name == base {
            return true;
        }
        let mut current = self.records.get(name);
        while let Some(descriptor) = current {
            match &descriptor.base {
                Some(parent) if parent == base => return true,
                Some(parent) => current = self.records.get(parent),
                None => return false,
            }
        }
        false
    }
}
