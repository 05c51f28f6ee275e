//! Schema type definitions for request binding.
//!
//! This module defines the core data model used to describe how one inbound
//! request binds to typed values: schemas, fields, sources, declared types,
//! and constraints. The types are designed for serialization with [`serde`]
//! so schema bundles can round-trip through JSON and YAML; custom validator
//! functions are the one non-serializable part and can only be attached
//! through the builder API.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Version of the schema contract (semver).
///
/// Embedded in every [`SchemaBundle`](crate::SchemaBundle) to track
/// compatibility across bundle versions.
pub const SCHEMA_CONTRACT_VERSION: &str = "1.0.0";

/// Part of the request a field's raw value is extracted from.
///
/// # Examples
///
/// ```
/// use request_schema_core::Source;
///
/// let source = Source::default();
/// assert_eq!(source, Source::Query);
/// assert_eq!(Source::Header.as_str(), "header");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Path segment captured by the route template. Always required.
    Path,
    /// Query string parameter (the default source).
    #[default]
    Query,
    /// Request header. Lookup is case-insensitive and converts underscores
    /// in the declared name to hyphens unless an alias is set.
    Header,
    /// Request cookie.
    Cookie,
    /// JSON request body, resolved through body merging.
    Body,
}

impl Source {
    /// Returns the wire name used as the leading error-location segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy for request keys that match no declared field.
///
/// Applies to the namespace a schema's field set binds: the body sub-object
/// for nested schemas, the raw body for a single body schema, and the query
/// string for query-model schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtraPolicy {
    /// Unknown keys are silently dropped (the default).
    #[default]
    Allow,
    /// Unknown keys produce an `extra_forbidden` error.
    Forbid,
}

/// Declared key type of a mapping field.
///
/// Structured-text wire formats carry object keys as strings; keys are
/// coerced to this type on bind, so only string-representable key types
/// are declarable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// String keys, used as-is (the default).
    #[default]
    Str,
    /// Integer keys, coerced from their string wire form.
    Int,
}

/// Declared type of a field.
///
/// Types nest arbitrarily: collections of scalars, mappings of collections,
/// optional nested schemas. Nested schemas are referenced by registry name
/// and resolved (and cycle-checked) when the registry is built.
///
/// # Examples
///
/// ```
/// use request_schema_core::{FieldType, KeyType};
///
/// let tags = FieldType::set(FieldType::Str);
/// assert!(matches!(tags, FieldType::Set(_)));
///
/// let weights = FieldType::mapping(KeyType::Int, FieldType::Float);
/// let image = FieldType::optional(FieldType::nested("Image"));
/// assert!(image.is_optional());
/// assert!(weights.requires_body());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// String scalar.
    Str,
    /// Integer scalar.
    Int,
    /// Float scalar.
    Float,
    /// Boolean scalar.
    Bool,
    /// Value that may be absent or null.
    Optional(Box<FieldType>),
    /// Ordered sequence; collects every repeated occurrence.
    Sequence(Box<FieldType>),
    /// De-duplicating collection; duplicates of the *coerced* value collapse.
    Set(Box<FieldType>),
    /// Mapping with coerced keys.
    Mapping(KeyType, Box<FieldType>),
    /// Reference to another registered schema, by name. Body-sourced only.
    Nested(String),
}

impl FieldType {
    /// Wraps a type as optional.
    #[must_use]
    pub fn optional(inner: FieldType) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Sequence of the given element type.
    #[must_use]
    pub fn sequence(element: FieldType) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// Set of the given element type.
    #[must_use]
    pub fn set(element: FieldType) -> Self {
        Self::Set(Box::new(element))
    }

    /// Mapping from the given key type to the given value type.
    #[must_use]
    pub fn mapping(key: KeyType, value: FieldType) -> Self {
        Self::Mapping(key, Box::new(value))
    }

    /// Reference to a registered schema by name.
    #[must_use]
    pub fn nested(schema: impl Into<String>) -> Self {
        Self::Nested(schema.into())
    }

    /// True if the type is `Optional` at the top level.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// The type with any top-level `Optional` wrapper removed.
    #[must_use]
    pub fn unwrapped(&self) -> &FieldType {
        match self {
            Self::Optional(inner) => inner.unwrapped(),
            other => other,
        }
    }

    /// True if the unwrapped type collects repeated raw occurrences.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self.unwrapped(), Self::Sequence(_) | Self::Set(_))
    }

    /// True if the type can only be carried by a JSON body, at any depth.
    #[must_use]
    pub fn requires_body(&self) -> bool {
        match self {
            Self::Mapping(..) | Self::Nested(_) => true,
            Self::Optional(inner) | Self::Sequence(inner) | Self::Set(inner) => {
                inner.requires_body()
            }
            _ => false,
        }
    }

    /// Names of schemas referenced anywhere in this type tree.
    #[must_use]
    pub fn nested_refs(&self) -> Vec<&str> {
        match self {
            Self::Nested(name) => vec![name.as_str()],
            Self::Optional(inner) | Self::Sequence(inner) | Self::Set(inner) => {
                inner.nested_refs()
            }
            Self::Mapping(_, value) => value.nested_refs(),
            _ => Vec::new(),
        }
    }

    /// Short name used in error and diagnostic messages.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Optional(_) => "optional",
            Self::Sequence(_) => "sequence",
            Self::Set(_) => "set",
            Self::Mapping(..) => "mapping",
            Self::Nested(_) => "nested",
        }
    }

    /// Shallow check that a bound value matches this type.
    ///
    /// Used to verify custom-validator output; `Nested` accepts any object
    /// since deep verification already happened when the object was bound.
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Str, Value::Str(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::Bool, Value::Bool(_))
            | (Self::Nested(_), Value::Object(_)) => true,
            (Self::Optional(inner), v) => v.is_null() || inner.admits(v),
            (Self::Sequence(inner), Value::Seq(items)) => {
                items.iter().all(|item| inner.admits(item))
            }
            (Self::Set(inner), Value::Set(items)) => items.iter().all(|item| inner.admits(item)),
            (Self::Mapping(key, val), Value::Map(entries)) => entries.iter().all(|(k, v)| {
                let key_ok = match key {
                    KeyType::Str => matches!(k, crate::MapKey::Str(_)),
                    KeyType::Int => matches!(k, crate::MapKey::Int(_)),
                };
                key_ok && val.admits(v)
            }),
            _ => false,
        }
    }
}

/// Structural constraint applied to a coerced value.
///
/// Each constraint applies to a specific value shape; declaring one on an
/// incompatible field type is a configuration error caught at registration,
/// never at request time.
///
/// # Examples
///
/// ```
/// use request_schema_core::Constraint;
///
/// let length = Constraint::MinLength(3);
/// let bound = Constraint::Le(1000.0);
/// assert_eq!(length.describe(), "min_length");
/// assert_eq!(bound.describe(), "le");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Minimum character count for strings, item count for collections.
    MinLength(usize),
    /// Maximum character count for strings, item count for collections.
    MaxLength(usize),
    /// Full-match regular expression for strings.
    Pattern(String),
    /// Numeric value must be `>=` the bound.
    Ge(f64),
    /// Numeric value must be `>` the bound.
    Gt(f64),
    /// Numeric value must be `<=` the bound.
    Le(f64),
    /// Numeric value must be `<` the bound.
    Lt(f64),
    /// Scalar value must be a member of the listed JSON values.
    EnumOf(Vec<serde_json::Value>),
    /// Sequence elements must be pairwise distinct after coercion.
    UniqueItems,
}

impl Constraint {
    /// Short name used in configuration-error messages.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::Pattern(_) => "pattern",
            Self::Ge(_) => "ge",
            Self::Gt(_) => "gt",
            Self::Le(_) => "le",
            Self::Lt(_) => "lt",
            Self::EnumOf(_) => "enum_of",
            Self::UniqueItems => "unique_items",
        }
    }
}

/// Type of a custom validation function.
///
/// Receives the coerced, constraint-checked value and returns either the
/// (possibly transformed) value or a failure message. Must be synchronous,
/// deterministic, and free of shared mutable state.
pub type ValidatorFn = dyn Fn(Value) -> Result<Value, String> + Send + Sync;

/// A named custom validator attached to a field.
///
/// The name is used in diagnostics only; failures surface as `value_error`
/// validation errors carrying the validator's message.
///
/// # Examples
///
/// ```
/// use request_schema_core::{Validator, Value};
///
/// let v = Validator::new("item_id_prefix", |value| match value.as_str() {
///     Some(s) if s.starts_with("isbn-") || s.starts_with("imdb-") => Ok(value),
///     _ => Err("id must start with 'isbn-' or 'imdb-'".to_string()),
/// });
///
/// assert!(v.run(Value::Str("isbn-9781529046137".into())).is_ok());
/// assert!(v.run(Value::Str("abc-123".into())).is_err());
/// ```
#[derive(Clone)]
pub struct Validator {
    name: String,
    func: Arc<ValidatorFn>,
}

impl Validator {
    /// Creates a named validator from a function.
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// The validator's diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the validator on a coerced value.
    ///
    /// # Errors
    ///
    /// Returns the validator's failure message when the value is rejected.
    pub fn run(&self, value: Value) -> Result<Value, String> {
        (self.func)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name)
            .finish()
    }
}

/// One named, typed, sourced, constrained unit within a [`Schema`].
///
/// Use the constructors [`required`](Field::required) and
/// [`optional`](Field::optional), then chain builder methods.
///
/// # Examples
///
/// ```
/// use request_schema_core::{Constraint, Field, FieldType, Source};
///
/// let item_id = Field::required("item_id", Source::Path, FieldType::Int)
///     .with_constraint(Constraint::Gt(0.0))
///     .with_constraint(Constraint::Le(1000.0));
/// assert!(item_id.required);
///
/// let q = Field::optional("q", Source::Query, FieldType::optional(FieldType::Str))
///     .with_alias("item-query");
/// assert_eq!(q.wire_name(), "item-query");
/// assert_eq!(q.name, "q");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Declared name, the binding-target key in the bound output.
    pub name: String,
    /// Where the raw value is extracted from.
    pub source: Source,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Whether absence is an error.
    pub required: bool,
    /// Default applied when the value is absent. Authored as JSON and
    /// shape-checked against the declared type at registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Wire name used for extraction instead of the declared name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Structural constraints, evaluated in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Custom validators, run after constraints pass. Not serialized.
    #[serde(skip)]
    pub validators: Vec<Validator>,
}

impl Field {
    /// Creates a required field.
    pub fn required(name: impl Into<String>, source: Source, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            source,
            ty,
            required: true,
            default: None,
            alias: None,
            constraints: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// Creates an optional field.
    ///
    /// An optional field must carry a default or an `Optional` type so that
    /// absence has a well-defined bound value; registration enforces this.
    pub fn optional(name: impl Into<String>, source: Source, ty: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, source, ty)
        }
    }

    /// Sets the wire name used for extraction.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets a default and marks the field optional.
    #[must_use]
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self.required = false;
        self
    }

    /// Appends a constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Appends a custom validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// The name used for extraction: the alias when set, else the declared
    /// name.
    #[must_use]
    pub fn wire_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Immutable description of a set of typed, constrained fields.
///
/// This is the primary type in the crate. Schemas are registered into a
/// [`SchemaRegistry`](crate::SchemaRegistry) at startup, validated there,
/// and shared read-only for the life of the process.
///
/// # Examples
///
/// ```
/// use request_schema_core::*;
///
/// let item = Schema::new("Item")
///     .with_field(Field::required("name", Source::Body, FieldType::Str))
///     .with_field(Field::optional(
///         "description",
///         Source::Body,
///         FieldType::optional(FieldType::Str),
///     ))
///     .with_field(Field::required("price", Source::Body, FieldType::Float))
///     .with_field(
///         Field::optional("tags", Source::Body, FieldType::set(FieldType::Str))
///             .with_default(serde_json::json!([])),
///     );
///
/// assert_eq!(item.name, "Item");
/// assert!(item.field("price").is_some());
/// assert_eq!(item.body_fields().count(), 4);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Schema contract version (populated from [`SCHEMA_CONTRACT_VERSION`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Registry name, unique across the registry.
    pub name: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Policy for keys that match no declared field.
    #[serde(default)]
    pub extra: ExtraPolicy,
    /// Field descriptors, in declaration order.
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Schema {
    /// Creates an empty schema with the given registry name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema_version: Some(SCHEMA_CONTRACT_VERSION.to_string()),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the unknown-key policy.
    #[must_use]
    pub fn with_extra(mut self, extra: ExtraPolicy) -> Self {
        self.extra = extra;
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Finds a field by declared name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields extracted from the request body, in declaration order.
    pub fn body_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.source == Source::Body)
    }

    /// Names of schemas referenced by any field's type tree.
    #[must_use]
    pub fn nested_refs(&self) -> Vec<&str> {
        self.fields
            .iter()
            .flat_map(|f| f.ty.nested_refs())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_wire_name_prefers_alias() {
        let field = Field::optional("q", Source::Query, FieldType::optional(FieldType::Str))
            .with_alias("item-query");

        assert_eq!(field.wire_name(), "item-query");
        assert_eq!(field.name, "q");
    }

    #[test]
    fn test_with_default_clears_required() {
        let field = Field::required("limit", Source::Query, FieldType::Int)
            .with_default(serde_json::json!(100));

        assert!(!field.required);
        assert_eq!(field.default, Some(serde_json::json!(100)));
    }

    #[test]
    fn test_field_type_unwrapped_sees_through_optional() {
        let ty = FieldType::optional(FieldType::set(FieldType::Str));

        assert!(ty.is_optional());
        assert!(ty.is_collection());
        assert!(matches!(ty.unwrapped(), FieldType::Set(_)));
    }

    #[test]
    fn test_nested_refs_walk_the_type_tree() {
        let schema = Schema::new("Item")
            .with_field(Field::optional(
                "image",
                Source::Body,
                FieldType::optional(FieldType::nested("Image")),
            ))
            .with_field(Field::required(
                "gallery",
                Source::Body,
                FieldType::sequence(FieldType::nested("Image")),
            ));

        assert_eq!(schema.nested_refs(), vec!["Image", "Image"]);
    }

    #[test]
    fn test_admits_checks_value_shape() {
        let ty = FieldType::sequence(FieldType::Int);
        assert!(ty.admits(&Value::Seq(vec![Value::Int(1), Value::Int(2)])));
        assert!(!ty.admits(&Value::Seq(vec![Value::Str("x".into())])));

        let opt = FieldType::optional(FieldType::Str);
        assert!(opt.admits(&Value::Null));
        assert!(opt.admits(&Value::Str("x".into())));
        assert!(!opt.admits(&Value::Int(1)));
    }
}
