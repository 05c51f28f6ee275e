//! Schema registration validation.
//!
//! Validates structural invariants of schemas before they enter a registry:
//! duplicate or empty names, constraint/type mismatches, path-field rules,
//! body-only types outside the body, malformed patterns, and defaults that
//! do not match their declared type. All problems found are reported
//! together; configuration errors are never truncated to the first one.
//!
//! # Examples
//!
//! ```
//! use request_schema_core::*;
//!
//! let schema = Schema::new("Item")
//!     .with_field(Field::required("name", Source::Body, FieldType::Str));
//! assert!(validate_schema(&schema).is_empty());
//!
//! // Pattern constraints only apply to strings.
//! let bad = Schema::new("Item").with_field(
//!     Field::required("price", Source::Body, FieldType::Float)
//!         .with_constraint(Constraint::Pattern("^\\d+$".into())),
//! );
//! assert!(!validate_schema(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::types::{Constraint, Field, FieldType, KeyType, Schema, Source};

/// Schema configuration errors.
///
/// These are startup-time failures: they indicate a mistake in schema
/// authoring, are reported exhaustively by registration, and are fatal to
/// the registering component. They are disjoint from request validation
/// errors, which are aggregated per request and recoverable by design.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema name is empty or whitespace-only.
    #[error("schema name cannot be empty")]
    EmptySchemaName,
    /// Two schemas in the registry share a name.
    #[error("duplicate schema in registry: {0}")]
    DuplicateSchema(String),
    /// Field name is empty or whitespace-only.
    #[error("field name cannot be empty in schema '{schema}'")]
    EmptyFieldName {
        /// Owning schema.
        schema: String,
    },
    /// Two fields in the same schema share a name.
    #[error("duplicate field in schema '{schema}': {field}")]
    DuplicateField {
        /// Owning schema.
        schema: String,
        /// Colliding field name.
        field: String,
    },
    /// Two schemas in one binding set declare the same field name.
    #[error("duplicate field across binding set: {field} (in '{first}' and '{second}')")]
    DuplicateFieldInSet {
        /// Colliding field name.
        field: String,
        /// Schema that declared it first.
        first: String,
        /// Schema that declared it again.
        second: String,
    },
    /// Alias is present but empty.
    #[error("alias cannot be empty on field '{schema}.{field}'")]
    EmptyAlias {
        /// Owning schema.
        schema: String,
        /// Field with the empty alias.
        field: String,
    },
    /// Path-sourced field is optional, defaulted, or optionally typed.
    #[error("path field '{schema}.{field}' must be required and cannot carry a default")]
    PathFieldOptional {
        /// Owning schema.
        schema: String,
        /// Offending field.
        field: String,
    },
    /// Optional field has no default and no optional type, so absence would
    /// have no bound value.
    #[error("field '{schema}.{field}' is optional but has neither a default nor an optional type")]
    OptionalWithoutDefault {
        /// Owning schema.
        schema: String,
        /// Offending field.
        field: String,
    },
    /// Constraint declared on an incompatible field type.
    #[error("constraint {constraint} does not apply to {ty} field '{schema}.{field}'")]
    ConstraintMismatch {
        /// Owning schema.
        schema: String,
        /// Offending field.
        field: String,
        /// Constraint name.
        constraint: &'static str,
        /// Declared type name.
        ty: &'static str,
    },
    /// Pattern constraint does not compile as a regex.
    #[error("invalid pattern on field '{schema}.{field}': {reason}")]
    InvalidPattern {
        /// Owning schema.
        schema: String,
        /// Offending field.
        field: String,
        /// Compilation failure text.
        reason: String,
    },
    /// Mapping or nested type declared outside the body.
    #[error("{ty} field '{schema}.{field}' must be body-sourced")]
    BodyOnlyType {
        /// Owning schema.
        schema: String,
        /// Offending field.
        field: String,
        /// Declared type name.
        ty: &'static str,
    },
    /// Default value does not structurally match the declared type.
    #[error("default on field '{schema}.{field}' does not match its declared type")]
    DefaultMismatch {
        /// Owning schema.
        schema: String,
        /// Offending field.
        field: String,
    },
    /// Defaults are not supported on nested-schema fields.
    #[error("nested field '{schema}.{field}' cannot carry a default")]
    NestedDefault {
        /// Owning schema.
        schema: String,
        /// Offending field.
        field: String,
    },
    /// `Nested` type names a schema absent from the registry.
    #[error("unknown schema reference '{reference}' on field '{schema}.{field}'")]
    UnknownSchemaRef {
        /// Referencing schema.
        schema: String,
        /// Referencing field.
        field: String,
        /// Missing schema name.
        reference: String,
    },
    /// A schema referenced as nested declares a non-body field.
    #[error("schema '{target}' is referenced as nested but field '{field}' is {src}-sourced")]
    NestedNonBodyField {
        /// Referenced schema.
        target: String,
        /// Offending field in the referenced schema.
        field: String,
        /// That field's declared source.
        src: Source,
    },
    /// Nested references form a cycle.
    #[error("schema reference cycle: {0}")]
    SchemaCycle(String),
    /// A binding set names a schema absent from the registry.
    #[error("unknown schema in binding set: {0}")]
    UnknownSchema(String),
}

/// Validates one schema in isolation.
///
/// Cross-schema checks (duplicate registry names, dangling nested
/// references, reference cycles) run when the registry is built; this
/// function covers everything decidable from the schema alone, reporting
/// every problem found.
///
/// # Examples
///
/// ```
/// use request_schema_core::*;
///
/// // Path fields must be required.
/// let schema = Schema::new("ReadItem").with_field(
///     Field::optional("item_id", Source::Path, FieldType::optional(FieldType::Int)),
/// );
/// let errors = validate_schema(&schema);
/// assert!(errors
///     .iter()
///     .any(|e| matches!(e, SchemaError::PathFieldOptional { .. })));
/// ```
#[must_use]
pub fn validate_schema(schema: &Schema) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if schema.name.trim().is_empty() {
        errors.push(SchemaError::EmptySchemaName);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for field in &schema.fields {
        if field.name.trim().is_empty() {
            errors.push(SchemaError::EmptyFieldName {
                schema: schema.name.clone(),
            });
            continue;
        }
        if !seen.insert(field.name.as_str()) {
            errors.push(SchemaError::DuplicateField {
                schema: schema.name.clone(),
                field: field.name.clone(),
            });
        }
        errors.extend(validate_field(schema, field));
    }

    errors
}

fn validate_field(schema: &Schema, field: &Field) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if field.alias.as_deref().is_some_and(|a| a.trim().is_empty()) {
        errors.push(SchemaError::EmptyAlias {
            schema: schema.name.clone(),
            field: field.name.clone(),
        });
    }

    if field.source == Source::Path
        && (!field.required || field.default.is_some() || field.ty.is_optional())
    {
        errors.push(SchemaError::PathFieldOptional {
            schema: schema.name.clone(),
            field: field.name.clone(),
        });
    }

    if field.ty.requires_body() && field.source != Source::Body {
        errors.push(SchemaError::BodyOnlyType {
            schema: schema.name.clone(),
            field: field.name.clone(),
            ty: field.ty.unwrapped().describe(),
        });
    }

    if field.source != Source::Path
        && !field.required
        && field.default.is_none()
        && !field.ty.is_optional()
    {
        errors.push(SchemaError::OptionalWithoutDefault {
            schema: schema.name.clone(),
            field: field.name.clone(),
        });
    }

    for constraint in &field.constraints {
        if !constraint_applies(constraint, field.ty.unwrapped()) {
            errors.push(SchemaError::ConstraintMismatch {
                schema: schema.name.clone(),
                field: field.name.clone(),
                constraint: constraint.describe(),
                ty: field.ty.unwrapped().describe(),
            });
        }
        if let Constraint::Pattern(pattern) = constraint {
            if let Err(err) = regex::Regex::new(pattern) {
                errors.push(SchemaError::InvalidPattern {
                    schema: schema.name.clone(),
                    field: field.name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    if let Some(default) = &field.default {
        if !field.ty.nested_refs().is_empty() {
            errors.push(SchemaError::NestedDefault {
                schema: schema.name.clone(),
                field: field.name.clone(),
            });
        } else if !default_shape_ok(&field.ty, default) {
            errors.push(SchemaError::DefaultMismatch {
                schema: schema.name.clone(),
                field: field.name.clone(),
            });
        }
    }

    errors
}

/// True if the constraint can apply to the (optionality-stripped) type.
fn constraint_applies(constraint: &Constraint, ty: &FieldType) -> bool {
    match constraint {
        Constraint::MinLength(_) | Constraint::MaxLength(_) => matches!(
            ty,
            FieldType::Str | FieldType::Sequence(_) | FieldType::Set(_) | FieldType::Mapping(..)
        ),
        Constraint::Pattern(_) => matches!(ty, FieldType::Str),
        Constraint::Ge(_) | Constraint::Gt(_) | Constraint::Le(_) | Constraint::Lt(_) => {
            matches!(ty, FieldType::Int | FieldType::Float)
        }
        Constraint::EnumOf(_) => matches!(
            ty,
            FieldType::Str | FieldType::Int | FieldType::Float | FieldType::Bool
        ),
        Constraint::UniqueItems => matches!(ty, FieldType::Sequence(_)),
    }
}

/// Structural check that an authored JSON default matches the declared type.
///
/// Intentionally stricter than request coercion: defaults are written by the
/// schema author in their final JSON shape, so no lexical conversion is
/// applied.
fn default_shape_ok(ty: &FieldType, value: &serde_json::Value) -> bool {
    match ty {
        FieldType::Str => value.is_string(),
        FieldType::Int => value.as_i64().is_some(),
        FieldType::Float => value.as_f64().is_some(),
        FieldType::Bool => value.is_boolean(),
        FieldType::Optional(inner) => value.is_null() || default_shape_ok(inner, value),
        FieldType::Sequence(inner) | FieldType::Set(inner) => value
            .as_array()
            .is_some_and(|items| items.iter().all(|item| default_shape_ok(inner, item))),
        FieldType::Mapping(key, val) => value.as_object().is_some_and(|entries| {
            entries.iter().all(|(k, v)| {
                let key_ok = match key {
                    KeyType::Str => true,
                    KeyType::Int => k.parse::<i64>().is_ok(),
                };
                key_ok && default_shape_ok(val, v)
            })
        }),
        FieldType::Nested(_) => false,
    }
}
