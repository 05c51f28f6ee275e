//! Schema registry: startup-time registration and cross-schema validation.
//!
//! Schemas are registered once, validated together (duplicate names,
//! dangling nested references, reference cycles, body-only rules for nested
//! targets), and then shared read-only for the remainder of the process.
//! Registration either succeeds with an immutable [`SchemaRegistry`] or
//! fails with every configuration problem found, mirroring the aggregation
//! discipline used at request time.

use std::collections::{BTreeMap, HashSet};

use crate::types::{Schema, Source};
use crate::validate::{SchemaError, validate_schema};

/// Builder collecting schemas for registration.
///
/// # Examples
///
/// ```
/// use request_schema_core::*;
///
/// let registry = SchemaRegistry::builder()
///     .register(
///         Schema::new("Image")
///             .with_field(Field::required("url", Source::Body, FieldType::Str))
///             .with_field(Field::required("name", Source::Body, FieldType::Str)),
///     )
///     .register(
///         Schema::new("Item")
///             .with_field(Field::required("name", Source::Body, FieldType::Str))
///             .with_field(Field::optional(
///                 "image",
///                 Source::Body,
///                 FieldType::optional(FieldType::nested("Image")),
///             )),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(registry.len(), 2);
/// assert!(registry.get("Item").is_some());
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    schemas: Vec<Schema>,
}

impl RegistryBuilder {
    /// Adds one schema.
    #[must_use]
    pub fn register(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Adds every schema from an iterator (e.g. a loaded bundle).
    #[must_use]
    pub fn register_all(mut self, schemas: impl IntoIterator<Item = Schema>) -> Self {
        self.schemas.extend(schemas);
        self
    }

    /// Validates all registered schemas and builds the registry.
    ///
    /// # Errors
    ///
    /// Returns every configuration problem found across all schemas:
    /// per-schema structural errors, duplicate registry names, unknown
    /// nested references, non-body fields in nested targets, and reference
    /// cycles.
    pub fn build(self) -> Result<SchemaRegistry, Vec<SchemaError>> {
        let mut errors = Vec::new();

        for schema in &self.schemas {
            errors.extend(validate_schema(schema));
        }

        let mut by_name: BTreeMap<String, Schema> = BTreeMap::new();
        for schema in self.schemas {
            if by_name.contains_key(&schema.name) {
                errors.push(SchemaError::DuplicateSchema(schema.name.clone()));
            } else {
                by_name.insert(schema.name.clone(), schema);
            }
        }

        errors.extend(check_references(&by_name));
        errors.extend(check_cycles(&by_name));

        if errors.is_empty() {
            Ok(SchemaRegistry { schemas: by_name })
        } else {
            Err(errors)
        }
    }
}

/// Immutable collection of validated schemas.
///
/// Built once at startup; reads need no locking and no mutation path exists
/// afterwards, so a registry can be shared freely across worker threads.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaRegistry {
    /// Starts a registry builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Looks up a schema by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True if no schema is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}

/// Checks that every nested reference resolves, and that referenced schemas
/// contain only body-sourced fields (a nested sub-object lives entirely in
/// the body).
fn check_references(schemas: &BTreeMap<String, Schema>) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut flagged_targets: HashSet<&str> = HashSet::new();

    for schema in schemas.values() {
        for field in &schema.fields {
            for reference in field.ty.nested_refs() {
                match schemas.get(reference) {
                    None => errors.push(SchemaError::UnknownSchemaRef {
                        schema: schema.name.clone(),
                        field: field.name.clone(),
                        reference: reference.to_string(),
                    }),
                    Some(target) => {
                        if flagged_targets.insert(reference) {
                            for target_field in &target.fields {
                                if target_field.source != Source::Body {
                                    errors.push(SchemaError::NestedNonBodyField {
                                        target: target.name.clone(),
                                        field: target_field.name.clone(),
                                        src: target_field.source,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    errors
}

/// Rejects cycles in the nested-reference graph with a depth-first walk.
fn check_cycles(schemas: &BTreeMap<String, Schema>) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut done: HashSet<&str> = HashSet::new();

    for name in schemas.keys() {
        if done.contains(name.as_str()) {
            continue;
        }
        let mut path: Vec<&str> = Vec::new();
        walk(name, schemas, &mut path, &mut done, &mut errors);
    }

    errors
}

fn walk<'a>(
    name: &'a str,
    schemas: &'a BTreeMap<String, Schema>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
    errors: &mut Vec<SchemaError>,
) {
    if let Some(pos) = path.iter().position(|seen| *seen == name) {
        let cycle: Vec<&str> = path[pos..].iter().copied().chain([name]).collect();
        errors.push(SchemaError::SchemaCycle(cycle.join(" -> ")));
        return;
    }
    if done.contains(name) {
        return;
    }

    let Some(schema) = schemas.get(name) else {
        // Dangling references are reported separately.
        return;
    };

    path.push(name);
    let mut refs: Vec<&str> = schema.nested_refs();
    refs.dedup();
    for reference in refs {
        walk(reference, schemas, path, done, errors);
    }
    path.pop();
    done.insert(name);
}
