//! Coercion of raw values into declared types.
//!
//! Two entry paths exist: text coercion for the string-carrying sources
//! (path, query, header, cookie) with strict lexical rules, and JSON
//! coercion for body values with strict type matching. Collection and
//! mapping coercion recurses element-wise and aggregates every element
//! failure; nested schema references recurse into the full binding
//! pipeline through the binder.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use request_schema_core::{
    ErrorKind, FieldType, KeyType, LocItem, MapKey, ValidationError, Value,
};

use crate::binder::{Context, bind_object};

/// Lexical form of an integer value.
static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid regex"));

/// Coerces a single textual raw value into a scalar (or optional scalar)
/// type.
///
/// Registration guarantees text-carrying sources declare only scalars and
/// collections of scalars; the caller handles collections element-wise.
pub(crate) fn coerce_text(
    ty: &FieldType,
    raw: &str,
    loc: &[LocItem],
) -> Result<Value, ValidationError> {
    match ty {
        FieldType::Str => Ok(Value::Str(raw.to_string())),
        FieldType::Int => {
            if INT_RE.is_match(raw) {
                if let Ok(i) = raw.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
            }
            Err(ValidationError::new(
                ErrorKind::IntType,
                loc.to_vec(),
                format!("Input should be a valid integer, got '{raw}'"),
            ))
        }
        FieldType::Float => match raw.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(ValidationError::new(
                ErrorKind::FloatType,
                loc.to_vec(),
                format!("Input should be a valid number, got '{raw}'"),
            )),
        },
        FieldType::Bool => {
            let lowered = raw.to_ascii_lowercase();
            match lowered.as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(ValidationError::new(
                    ErrorKind::BoolType,
                    loc.to_vec(),
                    format!("Input should be a valid boolean, got '{raw}'"),
                )),
            }
        }
        FieldType::Optional(inner) => coerce_text(inner, raw, loc),
        FieldType::Sequence(_) | FieldType::Set(_) | FieldType::Mapping(..) | FieldType::Nested(_) => {
            panic!("non-scalar type {} cannot be coerced from text", ty.describe())
        }
    }
}

/// Coerces a JSON body value into a declared type, recursively.
///
/// All element and key failures inside collections are aggregated; a value
/// is produced only when every part coerced.
pub(crate) fn coerce_json(
    cx: &Context<'_>,
    ty: &FieldType,
    json: &serde_json::Value,
    loc: &[LocItem],
) -> Result<Value, Vec<ValidationError>> {
    match ty {
        FieldType::Optional(inner) => {
            if json.is_null() {
                Ok(Value::Null)
            } else {
                coerce_json(cx, inner, json, loc)
            }
        }
        FieldType::Str => json
            .as_str()
            .map(|s| Value::Str(s.to_string()))
            .ok_or_else(|| vec![scalar_error(ErrorKind::StringType, "string", json, loc)]),
        FieldType::Int => json
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| vec![scalar_error(ErrorKind::IntType, "integer", json, loc)]),
        FieldType::Float => json
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| vec![scalar_error(ErrorKind::FloatType, "number", json, loc)]),
        FieldType::Bool => json
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| vec![scalar_error(ErrorKind::BoolType, "boolean", json, loc)]),
        FieldType::Sequence(inner) | FieldType::Set(inner) => {
            let Some(items) = json.as_array() else {
                return Err(vec![ValidationError::new(
                    ErrorKind::JsonType,
                    loc.to_vec(),
                    "Input should be a valid array",
                )]);
            };
            let mut values = Vec::with_capacity(items.len());
            let mut errors = Vec::new();
            for (idx, item) in items.iter().enumerate() {
                let mut item_loc = loc.to_vec();
                item_loc.push(LocItem::index(idx));
                match coerce_json(cx, inner, item, &item_loc) {
                    Ok(value) => values.push(value),
                    Err(mut errs) => errors.append(&mut errs),
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            Ok(match ty {
                FieldType::Set(_) => Value::Set(dedup_values(values)),
                _ => Value::Seq(values),
            })
        }
        FieldType::Mapping(key_ty, value_ty) => {
            let Some(entries) = json.as_object() else {
                return Err(vec![ValidationError::new(
                    ErrorKind::JsonType,
                    loc.to_vec(),
                    "Input should be a valid object",
                )]);
            };
            let mut map = BTreeMap::new();
            let mut errors = Vec::new();
            for (raw_key, raw_value) in entries {
                let mut entry_loc = loc.to_vec();
                entry_loc.push(LocItem::field(raw_key.as_str()));
                let key = match coerce_map_key(key_ty, raw_key, &entry_loc) {
                    Ok(key) => Some(key),
                    Err(err) => {
                        errors.push(err);
                        None
                    }
                };
                match coerce_json(cx, value_ty, raw_value, &entry_loc) {
                    Ok(value) => {
                        if let Some(key) = key {
                            map.insert(key, value);
                        }
                    }
                    Err(mut errs) => errors.append(&mut errs),
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            Ok(Value::Map(map))
        }
        FieldType::Nested(name) => {
            let schema = cx
                .registry
                .get(name)
                .unwrap_or_else(|| panic!("unresolved schema reference '{name}'"));
            let Some(obj) = json.as_object() else {
                return Err(vec![ValidationError::new(
                    ErrorKind::JsonType,
                    loc.to_vec(),
                    format!("Input should be a valid object, got {json}"),
                )]);
            };
            bind_object(cx, schema, obj, loc).map(Value::Object)
        }
    }
}

fn coerce_map_key(
    key_ty: &KeyType,
    raw: &str,
    loc: &[LocItem],
) -> Result<MapKey, ValidationError> {
    match key_ty {
        KeyType::Str => Ok(MapKey::Str(raw.to_string())),
        KeyType::Int => {
            if INT_RE.is_match(raw) {
                if let Ok(i) = raw.parse::<i64>() {
                    return Ok(MapKey::Int(i));
                }
            }
            Err(ValidationError::new(
                ErrorKind::IntType,
                loc.to_vec(),
                format!("Invalid mapping key '{raw}', expected an integer"),
            ))
        }
    }
}

fn scalar_error(
    kind: ErrorKind,
    expected: &str,
    json: &serde_json::Value,
    loc: &[LocItem],
) -> ValidationError {
    ValidationError::new(
        kind,
        loc.to_vec(),
        format!("Input should be a valid {expected}, got {json}"),
    )
}

/// Removes duplicate coerced values, keeping the first occurrence.
pub(crate) fn dedup_values(values: Vec<Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

/// Materializes a registered default.
///
/// Defaults are shape-checked at registration, so a mismatch here is a
/// schema-authoring bug, not bad input.
pub(crate) fn default_value(ty: &FieldType, json: &serde_json::Value) -> Value {
    convert_default(ty, json)
        .unwrap_or_else(|| panic!("registered default does not match declared {} type", ty.describe()))
}

fn convert_default(ty: &FieldType, json: &serde_json::Value) -> Option<Value> {
    match ty {
        FieldType::Str => json.as_str().map(|s| Value::Str(s.to_string())),
        FieldType::Int => json.as_i64().map(Value::Int),
        FieldType::Float => json.as_f64().map(Value::Float),
        FieldType::Bool => json.as_bool().map(Value::Bool),
        FieldType::Optional(inner) => {
            if json.is_null() {
                Some(Value::Null)
            } else {
                convert_default(inner, json)
            }
        }
        FieldType::Sequence(inner) | FieldType::Set(inner) => {
            let items = json
                .as_array()?
                .iter()
                .map(|item| convert_default(inner, item))
                .collect::<Option<Vec<Value>>>()?;
            Some(match ty {
                FieldType::Set(_) => Value::Set(dedup_values(items)),
                _ => Value::Seq(items),
            })
        }
        FieldType::Mapping(key_ty, value_ty) => {
            let mut map = BTreeMap::new();
            for (raw_key, raw_value) in json.as_object()? {
                let key = match key_ty {
                    KeyType::Str => MapKey::Str(raw_key.clone()),
                    KeyType::Int => MapKey::Int(raw_key.parse().ok()?),
                };
                map.insert(key, convert_default(value_ty, raw_value)?);
            }
            Some(Value::Map(map))
        }
        FieldType::Nested(_) => None,
    }
}
