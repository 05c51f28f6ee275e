//! The binder: a compiled schema set and the per-request bind pipeline.
//!
//! A [`Binder`] is built once at startup from a registry and the names of
//! the schemas a route binds against. Construction validates the set
//! (every name resolves, field names are unique across the set), compiles
//! every pattern constraint reachable from the set, and precomputes the
//! body shape. Binding a request is then a pure, synchronous walk over the
//! fields in declaration order, aggregating every validation error.

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use tracing::debug;

use request_schema_core::{
    BindResult, Constraint, ExtraPolicy, Field, FieldType, LocItem, Schema, SchemaError,
    SchemaRegistry, Source, ValidationError, Value, loc,
};

use crate::body::{self, BodyShape, BodyView};
use crate::coerce;
use crate::constrain;
use crate::extract::{self, RawValue};
use crate::request::RawRequest;

/// Shared lookups handed through the coercion recursion.
pub(crate) struct Context<'a> {
    pub(crate) registry: &'a SchemaRegistry,
    pub(crate) patterns: &'a HashMap<String, Regex>,
}

/// A compiled binding of one or more named schemas.
///
/// # Examples
///
/// ```
/// use request_schema_bind::{Binder, RawRequest};
/// use request_schema_core::*;
///
/// let registry = SchemaRegistry::builder()
///     .register(
///         Schema::new("ReadItems").with_field(
///             Field::optional("q", Source::Query, FieldType::optional(FieldType::Str))
///                 .with_constraint(Constraint::MaxLength(10)),
///         ),
///     )
///     .build()
///     .unwrap();
///
/// let binder = Binder::new(&registry, &["ReadItems"]).unwrap();
/// let bound = binder
///     .bind(&RawRequest::new().with_query("q", "fixedquery"))
///     .unwrap();
/// assert_eq!(bound.get("q").and_then(Value::as_str), Some("fixedquery"));
/// ```
#[derive(Debug)]
pub struct Binder<'a> {
    registry: &'a SchemaRegistry,
    schemas: Vec<&'a Schema>,
    shape: BodyShape<'a>,
    patterns: HashMap<String, Regex>,
}

impl<'a> Binder<'a> {
    /// Compiles a binding set.
    ///
    /// # Errors
    ///
    /// Returns every configuration problem found: unknown schema names and
    /// field names duplicated across the set. These are startup errors of
    /// the same class as registration failures.
    pub fn new(registry: &'a SchemaRegistry, names: &[&str]) -> Result<Self, Vec<SchemaError>> {
        let mut errors = Vec::new();

        let mut schemas: Vec<&Schema> = Vec::with_capacity(names.len());
        for name in names {
            match registry.get(name) {
                Some(schema) => schemas.push(schema),
                None => errors.push(SchemaError::UnknownSchema((*name).to_string())),
            }
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();
        for schema in &schemas {
            for field in &schema.fields {
                if let Some(first) = owners.get(field.name.as_str()).copied() {
                    errors.push(SchemaError::DuplicateFieldInSet {
                        field: field.name.clone(),
                        first: first.to_string(),
                        second: schema.name.clone(),
                    });
                } else {
                    owners.insert(field.name.as_str(), schema.name.as_str());
                }
            }
        }

        let patterns = compile_patterns(registry, &schemas, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        let shape = body::analyze(&schemas);
        Ok(Self {
            registry,
            schemas,
            shape,
            patterns,
        })
    }

    /// Binds one request against the compiled set.
    ///
    /// Produces either the fully bound object keyed by declared field
    /// names, or every validation error found, ordered by schema-set and
    /// field declaration order with sub-element indices nested below.
    /// Binding is pure: the same request always yields the same result.
    pub fn bind(&self, req: &RawRequest) -> BindResult {
        debug!(schemas = ?self.schema_names(), "binding request");
        let cx = Context {
            registry: self.registry,
            patterns: &self.patterns,
        };
        let mut errors: Vec<ValidationError> = Vec::new();
        let mut bound: BTreeMap<String, Value> = BTreeMap::new();

        let body = body::view(&self.shape, req, &mut errors);

        for schema in &self.schemas {
            for field in &schema.fields {
                let outcome = if field.source == Source::Body {
                    self.bind_body_field(&cx, &body, field)
                } else {
                    bind_text_field(&cx, field, req).map(Some)
                };
                match outcome {
                    Ok(Some(value)) => {
                        bound.insert(field.name.clone(), value);
                    }
                    Ok(None) => {}
                    Err(mut errs) => errors.append(&mut errs),
                }
            }
        }

        body::check_extra(&self.shape, &body, &mut errors);
        self.check_query_extra(req, &mut errors);

        if errors.is_empty() {
            debug!(fields = bound.len(), "request bound");
            Ok(Value::Object(bound))
        } else {
            debug!(errors = errors.len(), "request rejected");
            Err(errors)
        }
    }

    /// Names of the schemas in this binding set, in set order.
    #[must_use]
    pub fn schema_names(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.name.as_str()).collect()
    }

    fn bind_body_field(
        &self,
        cx: &Context<'_>,
        body: &BodyView<'_>,
        field: &Field,
    ) -> Result<Option<Value>, Vec<ValidationError>> {
        match (&self.shape, body) {
            (BodyShape::Direct(_), BodyView::Direct(json)) => {
                bind_json_field(cx, field, Some(*json), loc::body()).map(Some)
            }
            (BodyShape::Direct(_), BodyView::Empty) => {
                bind_json_field(cx, field, None, loc::body()).map(Some)
            }
            (BodyShape::Keyed { .. }, BodyView::Keyed(obj)) => bind_json_field(
                cx,
                field,
                obj.get(field.wire_name()),
                loc::body_field(field.wire_name()),
            )
            .map(Some),
            (BodyShape::Keyed { .. }, BodyView::Empty) => {
                bind_json_field(cx, field, None, loc::body_field(field.wire_name())).map(Some)
            }
            (_, BodyView::Broken) => Ok(None),
            _ => unreachable!("mismatched body shape and view"),
        }
    }

    fn check_query_extra(&self, req: &RawRequest, errors: &mut Vec<ValidationError>) {
        let forbids = self.schemas.iter().any(|s| {
            s.extra == ExtraPolicy::Forbid && s.fields.iter().any(|f| f.source == Source::Query)
        });
        if !forbids {
            return;
        }

        let known: HashSet<&str> = self
            .schemas
            .iter()
            .flat_map(|s| s.fields.iter())
            .filter(|f| f.source == Source::Query)
            .map(|f| f.wire_name())
            .collect();
        for key in req.query.keys() {
            if !known.contains(key.as_str()) {
                errors.push(ValidationError::extra_forbidden(loc::query(key)));
            }
        }
    }
}

/// Compiles every pattern constraint reachable from the set, including
/// through nested schema references, as full-match regexes.
fn compile_patterns(
    registry: &SchemaRegistry,
    schemas: &[&Schema],
    errors: &mut Vec<SchemaError>,
) -> HashMap<String, Regex> {
    let mut patterns = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&Schema> = schemas.to_vec();

    while let Some(schema) = stack.pop() {
        if !visited.insert(schema.name.as_str()) {
            continue;
        }
        for field in &schema.fields {
            for constraint in &field.constraints {
                if let Constraint::Pattern(pattern) = constraint {
                    if patterns.contains_key(pattern) {
                        continue;
                    }
                    match Regex::new(&format!("^(?:{pattern})$")) {
                        Ok(regex) => {
                            patterns.insert(pattern.clone(), regex);
                        }
                        Err(err) => errors.push(SchemaError::InvalidPattern {
                            schema: schema.name.clone(),
                            field: field.name.clone(),
                            reason: err.to_string(),
                        }),
                    }
                }
            }
            for reference in field.ty.nested_refs() {
                if let Some(target) = registry.get(reference) {
                    stack.push(target);
                }
            }
        }
    }

    patterns
}

fn bind_text_field(
    cx: &Context<'_>,
    field: &Field,
    req: &RawRequest,
) -> Result<Value, Vec<ValidationError>> {
    let wire = match field.source {
        Source::Header => extract::header_wire_name(field),
        _ => field.wire_name().to_string(),
    };
    let floc = loc::source(field.source, &wire);

    match extract::extract(req, field) {
        RawValue::Absent => absent_value(field, floc),
        RawValue::Single(raw) => bind_single_text(cx, field, raw, floc),
        RawValue::Multi(values) => {
            if field.ty.is_collection() {
                bind_text_collection(cx, field, &values, floc)
            } else if values.len() == 1 {
                bind_single_text(cx, field, values[0], floc)
            } else {
                Err(vec![ValidationError::multiple_values(floc, values.len())])
            }
        }
    }
}

fn bind_single_text(
    cx: &Context<'_>,
    field: &Field,
    raw: &str,
    floc: Vec<LocItem>,
) -> Result<Value, Vec<ValidationError>> {
    if field.ty.is_collection() {
        return bind_text_collection(cx, field, &[raw], floc);
    }
    let value = coerce::coerce_text(&field.ty, raw, &floc).map_err(|e| vec![e])?;
    finish_field(cx, field, value, &floc)
}

fn bind_text_collection(
    cx: &Context<'_>,
    field: &Field,
    raws: &[&str],
    floc: Vec<LocItem>,
) -> Result<Value, Vec<ValidationError>> {
    let element_ty = match field.ty.unwrapped() {
        FieldType::Sequence(inner) | FieldType::Set(inner) => inner.as_ref(),
        _ => unreachable!("collection binding on non-collection field"),
    };

    let mut items = Vec::with_capacity(raws.len());
    let mut errors = Vec::new();
    for (idx, raw) in raws.iter().enumerate() {
        let mut item_loc = floc.clone();
        item_loc.push(LocItem::index(idx));
        match coerce::coerce_text(element_ty, raw, &item_loc) {
            Ok(value) => items.push(value),
            Err(err) => errors.push(err),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let value = match field.ty.unwrapped() {
        FieldType::Set(_) => Value::Set(coerce::dedup_values(items)),
        _ => Value::Seq(items),
    };
    finish_field(cx, field, value, &floc)
}

/// Bound value for an absent field: the default, `Null` for optional
/// types, or a `missing` error for required fields.
fn absent_value(field: &Field, floc: Vec<LocItem>) -> Result<Value, Vec<ValidationError>> {
    if let Some(default) = &field.default {
        Ok(coerce::default_value(&field.ty, default))
    } else if field.ty.is_optional() {
        Ok(Value::Null)
    } else if field.required {
        Err(vec![ValidationError::missing(floc)])
    } else {
        panic!(
            "field '{}' is optional without a default or optional type",
            field.name
        )
    }
}

/// Full pipeline for one field resolved from a JSON value: coercion,
/// constraints, custom validators. An explicit null on an optional field
/// follows the same rules as absence.
pub(crate) fn bind_json_field(
    cx: &Context<'_>,
    field: &Field,
    json: Option<&serde_json::Value>,
    floc: Vec<LocItem>,
) -> Result<Value, Vec<ValidationError>> {
    let effective = match json {
        Some(v) if v.is_null() && field.ty.is_optional() => None,
        other => other,
    };
    match effective {
        None => absent_value(field, floc),
        Some(json) => {
            let value = coerce::coerce_json(cx, &field.ty, json, &floc)?;
            finish_field(cx, field, value, &floc)
        }
    }
}

/// Binds a JSON object against a schema's full field set, applying the
/// schema's extra-key policy. Errors are prefixed with `prefix`.
pub(crate) fn bind_object(
    cx: &Context<'_>,
    schema: &Schema,
    obj: &serde_json::Map<String, serde_json::Value>,
    prefix: &[LocItem],
) -> Result<BTreeMap<String, Value>, Vec<ValidationError>> {
    let mut bound = BTreeMap::new();
    let mut errors = Vec::new();

    for field in &schema.fields {
        let mut floc = prefix.to_vec();
        floc.push(LocItem::field(field.wire_name()));
        match bind_json_field(cx, field, obj.get(field.wire_name()), floc) {
            Ok(value) => {
                bound.insert(field.name.clone(), value);
            }
            Err(mut errs) => errors.append(&mut errs),
        }
    }

    if schema.extra == ExtraPolicy::Forbid {
        let known: HashSet<&str> = schema.fields.iter().map(|f| f.wire_name()).collect();
        for key in obj.keys() {
            if !known.contains(key.as_str()) {
                let mut floc = prefix.to_vec();
                floc.push(LocItem::field(key.as_str()));
                errors.push(ValidationError::extra_forbidden(floc));
            }
        }
    }

    if errors.is_empty() { Ok(bound) } else { Err(errors) }
}

/// Constraints, then custom validators, on a coerced value.
///
/// Constraints never short-circuit each other; validators run only when
/// every constraint passed, and a validator's transformed output must
/// still match the declared type.
pub(crate) fn finish_field(
    cx: &Context<'_>,
    field: &Field,
    value: Value,
    floc: &[LocItem],
) -> Result<Value, Vec<ValidationError>> {
    let errors = constrain::check(field, &value, floc, cx.patterns);
    if !errors.is_empty() {
        return Err(errors);
    }
    if value.is_null() {
        return Ok(value);
    }

    let mut value = value;
    for validator in &field.validators {
        match validator.run(value) {
            Ok(out) => value = out,
            Err(msg) => return Err(vec![ValidationError::value_error(floc.to_vec(), msg)]),
        }
    }
    if !field.validators.is_empty() && !field.ty.admits(&value) {
        panic!(
            "validator output for field '{}' does not match its declared {} type",
            field.name,
            field.ty.describe()
        );
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .register(
                Schema::new("ReadItems").with_field(Field::optional(
                    "q",
                    Source::Query,
                    FieldType::optional(FieldType::Str),
                )),
            )
            .register(
                Schema::new("Paging").with_field(
                    Field::optional("limit", Source::Query, FieldType::Int)
                        .with_default(serde_json::json!(100)),
                ),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_rejects_unknown_schema() {
        let registry = registry();
        let errors = Binder::new(&registry, &["Nope"]).unwrap_err();
        assert_eq!(errors, vec![SchemaError::UnknownSchema("Nope".to_string())]);
    }

    #[test]
    fn test_new_rejects_duplicate_field_across_set() {
        let registry = SchemaRegistry::builder()
            .register(
                Schema::new("A").with_field(Field::optional(
                    "q",
                    Source::Query,
                    FieldType::optional(FieldType::Str),
                )),
            )
            .register(
                Schema::new("B").with_field(Field::optional(
                    "q",
                    Source::Query,
                    FieldType::optional(FieldType::Str),
                )),
            )
            .build()
            .unwrap();

        let errors = Binder::new(&registry, &["A", "B"]).unwrap_err();
        assert_eq!(
            errors,
            vec![SchemaError::DuplicateFieldInSet {
                field: "q".to_string(),
                first: "A".to_string(),
                second: "B".to_string(),
            }]
        );
    }

    #[test]
    fn test_bind_is_idempotent() {
        let registry = registry();
        let binder = Binder::new(&registry, &["ReadItems", "Paging"]).unwrap();
        let req = RawRequest::new().with_query("q", "foo");

        let first = binder.bind(&req);
        let second = binder.bind(&req);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bind_applies_defaults_for_absent_fields() {
        let registry = registry();
        let binder = Binder::new(&registry, &["Paging"]).unwrap();

        let bound = binder.bind(&RawRequest::new()).unwrap();
        assert_eq!(bound.get("limit").and_then(Value::as_int), Some(100));
    }
}
