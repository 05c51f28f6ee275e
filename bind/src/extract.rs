//! Per-field raw value lookup.
//!
//! Resolves a field's wire name against the right part of the request and
//! reports what was found: nothing, a single value, or repeated values in
//! request order. Body fields are resolved by the body merger, never here.
//!
//! Header lookup follows common transport behavior: names compare
//! case-insensitively, and a declared field name has its underscores
//! converted to hyphens to form the wire name unless an alias is set.

use request_schema_core::{Field, Source};

use crate::request::RawRequest;

/// Raw occurrences found for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawValue<'a> {
    /// No occurrence.
    Absent,
    /// Exactly one value from a single-valued source (path, cookie).
    Single(&'a str),
    /// One or more occurrences from a repeatable source, request order.
    Multi(Vec<&'a str>),
}

/// Looks up the raw value(s) for a non-body field.
pub(crate) fn extract<'a>(req: &'a RawRequest, field: &Field) -> RawValue<'a> {
    match field.source {
        Source::Path => match req.path.get(field.wire_name()) {
            Some(value) => RawValue::Single(value),
            None => RawValue::Absent,
        },
        Source::Query => match req.query.get(field.wire_name()) {
            Some(values) if !values.is_empty() => {
                RawValue::Multi(values.iter().map(String::as_str).collect())
            }
            _ => RawValue::Absent,
        },
        Source::Header => {
            let wire = header_wire_name(field);
            let mut values: Vec<&str> = Vec::new();
            for (name, occurrences) in &req.headers {
                if name.eq_ignore_ascii_case(&wire) {
                    values.extend(occurrences.iter().map(String::as_str));
                }
            }
            if values.is_empty() {
                RawValue::Absent
            } else {
                RawValue::Multi(values)
            }
        }
        Source::Cookie => match req.cookies.get(field.wire_name()) {
            Some(value) => RawValue::Single(value),
            None => RawValue::Absent,
        },
        Source::Body => unreachable!("body fields are resolved by the body merger"),
    }
}

/// Wire name used for header extraction and header error locations.
pub(crate) fn header_wire_name(field: &Field) -> String {
    match &field.alias {
        Some(alias) => alias.clone(),
        None => field.name.replace('_', "-"),
    }
}
