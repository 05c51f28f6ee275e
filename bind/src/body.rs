//! Body merging: deciding how the raw JSON body maps onto body fields.
//!
//! The shape is computed once per binder, at startup, from the body fields
//! declared across the binding set: exactly one body field binds the raw
//! body directly; two or more treat the body as an object keyed by the
//! fields' wire names, with scalars folded in under their own names.

use std::collections::HashSet;

use request_schema_core::{ErrorKind, ExtraPolicy, Field, Schema, ValidationError, loc};

use crate::request::RawRequest;

/// How the request body distributes over the binding set's body fields.
#[derive(Debug)]
pub(crate) enum BodyShape<'a> {
    /// No body field declared; any body present is ignored.
    None,
    /// One body field: the raw body binds to it directly.
    Direct(&'a Field),
    /// Several body fields: the body is an object keyed by wire name.
    Keyed {
        fields: Vec<&'a Field>,
        forbid_extra: bool,
    },
}

/// Computes the body shape for a binding set.
pub(crate) fn analyze<'a>(schemas: &[&'a Schema]) -> BodyShape<'a> {
    let fields: Vec<&Field> = schemas.iter().flat_map(|s| s.body_fields()).collect();
    match fields.len() {
        0 => BodyShape::None,
        1 => BodyShape::Direct(fields[0]),
        _ => {
            let forbid_extra = schemas
                .iter()
                .any(|s| s.extra == ExtraPolicy::Forbid && s.body_fields().next().is_some());
            BodyShape::Keyed {
                fields,
                forbid_extra,
            }
        }
    }
}

/// Per-request view of the body after shape checking.
#[derive(Debug)]
pub(crate) enum BodyView<'a> {
    /// No body present (or no body fields declared).
    Empty,
    /// Raw body for direct binding.
    Direct(&'a serde_json::Value),
    /// Keyed body object.
    Keyed(&'a serde_json::Map<String, serde_json::Value>),
    /// Keyed shape with a non-object body; the error is already recorded
    /// and body fields are skipped.
    Broken,
}

/// Resolves the request body against the precomputed shape.
pub(crate) fn view<'a>(
    shape: &BodyShape<'_>,
    req: &'a RawRequest,
    errors: &mut Vec<ValidationError>,
) -> BodyView<'a> {
    match shape {
        BodyShape::None => BodyView::Empty,
        BodyShape::Direct(_) => match &req.body {
            Some(json) => BodyView::Direct(json),
            None => BodyView::Empty,
        },
        BodyShape::Keyed { .. } => match &req.body {
            None => BodyView::Empty,
            Some(serde_json::Value::Object(obj)) => BodyView::Keyed(obj),
            Some(other) => {
                errors.push(ValidationError::new(
                    ErrorKind::JsonType,
                    loc::body(),
                    format!("Input should be a valid object, got {other}"),
                ));
                BodyView::Broken
            }
        },
    }
}

/// Reports unknown top-level keys of a keyed body under the forbid policy.
pub(crate) fn check_extra(
    shape: &BodyShape<'_>,
    body: &BodyView<'_>,
    errors: &mut Vec<ValidationError>,
) {
    let (
        BodyShape::Keyed {
            fields,
            forbid_extra: true,
        },
        BodyView::Keyed(obj),
    ) = (shape, body)
    else {
        return;
    };

    let known: HashSet<&str> = fields.iter().map(|f| f.wire_name()).collect();
    for key in obj.keys() {
        if !known.contains(key.as_str()) {
            errors.push(ValidationError::extra_forbidden(loc::body_field(key)));
        }
    }
}
