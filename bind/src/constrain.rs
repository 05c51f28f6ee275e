//! Constraint validation over coerced values.
//!
//! Constraints run after coercion, in declaration order, and never
//! short-circuit: every constraint on a field is evaluated and every
//! failure recorded, so one value can violate `min_length` and `pattern`
//! at once. String lengths count characters, not bytes; patterns are full
//! matches; numeric bounds honor their closed/open declarations exactly.

use std::collections::HashMap;

use regex::Regex;
use request_schema_core::{Constraint, ErrorKind, Field, LocItem, ValidationError, Value};

/// Checks every constraint of a field against its coerced value.
///
/// `Null` (an absent optional) is exempt: there is no value to constrain.
pub(crate) fn check(
    field: &Field,
    value: &Value,
    loc: &[LocItem],
    patterns: &HashMap<String, Regex>,
) -> Vec<ValidationError> {
    if value.is_null() {
        return Vec::new();
    }

    field
        .constraints
        .iter()
        .filter_map(|constraint| violation(constraint, value, loc, patterns))
        .collect()
}

fn violation(
    constraint: &Constraint,
    value: &Value,
    loc: &[LocItem],
    patterns: &HashMap<String, Regex>,
) -> Option<ValidationError> {
    match constraint {
        Constraint::MinLength(min) => match value {
            Value::Str(s) => (s.chars().count() < *min).then(|| {
                ValidationError::new(
                    ErrorKind::StringTooShort,
                    loc.to_vec(),
                    format!(
                        "String should have at least {min} character{}",
                        plural(*min)
                    ),
                )
            }),
            other => other.len().and_then(|len| {
                (len < *min).then(|| {
                    ValidationError::new(
                        ErrorKind::TooShort,
                        loc.to_vec(),
                        format!("Collection should have at least {min} item{}", plural(*min)),
                    )
                })
            }),
        },
        Constraint::MaxLength(max) => match value {
            Value::Str(s) => (s.chars().count() > *max).then(|| {
                ValidationError::new(
                    ErrorKind::StringTooLong,
                    loc.to_vec(),
                    format!("String should have at most {max} character{}", plural(*max)),
                )
            }),
            other => other.len().and_then(|len| {
                (len > *max).then(|| {
                    ValidationError::new(
                        ErrorKind::TooLong,
                        loc.to_vec(),
                        format!("Collection should have at most {max} item{}", plural(*max)),
                    )
                })
            }),
        },
        Constraint::Pattern(pattern) => {
            let Value::Str(s) = value else { return None };
            let regex = patterns
                .get(pattern)
                .unwrap_or_else(|| panic!("pattern '{pattern}' missing from binder cache"));
            (!regex.is_match(s)).then(|| {
                ValidationError::new(
                    ErrorKind::PatternMismatch,
                    loc.to_vec(),
                    format!("String should match pattern '{pattern}'"),
                )
            })
        }
        Constraint::Ge(bound) => numeric(value).and_then(|n| {
            (n < *bound).then(|| {
                ValidationError::new(
                    ErrorKind::GreaterThanEqual,
                    loc.to_vec(),
                    format!("Input should be greater than or equal to {bound}"),
                )
            })
        }),
        Constraint::Gt(bound) => numeric(value).and_then(|n| {
            (n <= *bound).then(|| {
                ValidationError::new(
                    ErrorKind::GreaterThan,
                    loc.to_vec(),
                    format!("Input should be greater than {bound}"),
                )
            })
        }),
        Constraint::Le(bound) => numeric(value).and_then(|n| {
            (n > *bound).then(|| {
                ValidationError::new(
                    ErrorKind::LessThanEqual,
                    loc.to_vec(),
                    format!("Input should be less than or equal to {bound}"),
                )
            })
        }),
        Constraint::Lt(bound) => numeric(value).and_then(|n| {
            (n >= *bound).then(|| {
                ValidationError::new(
                    ErrorKind::LessThan,
                    loc.to_vec(),
                    format!("Input should be less than {bound}"),
                )
            })
        }),
        Constraint::EnumOf(choices) => {
            let json = value.to_json();
            (!choices.contains(&json)).then(|| {
                let listed: Vec<String> = choices.iter().map(ToString::to_string).collect();
                ValidationError::new(
                    ErrorKind::Enum,
                    loc.to_vec(),
                    format!("Input should be one of: {}", listed.join(", ")),
                )
            })
        }
        Constraint::UniqueItems => {
            let Value::Seq(items) = value else { return None };
            for (idx, item) in items.iter().enumerate().skip(1) {
                if items[..idx].contains(item) {
                    return Some(ValidationError::new(
                        ErrorKind::UniqueItems,
                        loc.to_vec(),
                        format!("List items are not unique, duplicate at index {idx}"),
                    ));
                }
            }
            None
        }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use request_schema_core::{FieldType, Source, loc};

    fn cache(patterns: &[&str]) -> HashMap<String, Regex> {
        patterns
            .iter()
            .map(|p| ((*p).to_string(), Regex::new(&format!("^(?:{p})$")).unwrap()))
            .collect()
    }

    #[test]
    fn test_all_constraints_are_evaluated() {
        let field = Field::optional("q", Source::Query, FieldType::optional(FieldType::Str))
            .with_constraint(Constraint::MinLength(3))
            .with_constraint(Constraint::MaxLength(10))
            .with_constraint(Constraint::Pattern("^fixedquery$".into()));
        let patterns = cache(&["^fixedquery$"]);

        // "ab" is both too short and a pattern mismatch; both are reported.
        let errors = check(&field, &Value::Str("ab".into()), &loc::query("q"), &patterns);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, ErrorKind::StringTooShort);
        assert_eq!(errors[1].kind, ErrorKind::PatternMismatch);
    }

    #[test]
    fn test_numeric_bounds_honor_open_and_closed_edges() {
        let field = Field::required("item_id", Source::Path, FieldType::Int)
            .with_constraint(Constraint::Gt(0.0))
            .with_constraint(Constraint::Le(1000.0));
        let patterns = HashMap::new();
        let loc = loc::path("item_id");

        assert!(check(&field, &Value::Int(1), &loc, &patterns).is_empty());
        assert!(check(&field, &Value::Int(1000), &loc, &patterns).is_empty());

        let at_zero = check(&field, &Value::Int(0), &loc, &patterns);
        assert_eq!(at_zero[0].kind, ErrorKind::GreaterThan);

        let too_big = check(&field, &Value::Int(1001), &loc, &patterns);
        assert_eq!(too_big[0].kind, ErrorKind::LessThanEqual);
    }

    #[test]
    fn test_string_length_counts_characters_not_bytes() {
        let field = Field::required("name", Source::Body, FieldType::Str)
            .with_constraint(Constraint::MaxLength(4));
        let patterns = HashMap::new();

        // Four characters, twelve bytes.
        let errors = check(
            &field,
            &Value::Str("çççç".into()),
            &loc::body_field("name"),
            &patterns,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_enum_membership_is_exact_and_case_sensitive() {
        let field = Field::optional("order_by", Source::Query, FieldType::Str)
            .with_default(serde_json::json!("created_at"))
            .with_constraint(Constraint::EnumOf(vec![
                serde_json::json!("created_at"),
                serde_json::json!("updated_at"),
            ]));
        let patterns = HashMap::new();
        let loc = loc::query("order_by");

        assert!(check(&field, &Value::Str("created_at".into()), &loc, &patterns).is_empty());
        let errors = check(&field, &Value::Str("Created_At".into()), &loc, &patterns);
        assert_eq!(errors[0].kind, ErrorKind::Enum);
    }

    #[test]
    fn test_unique_items_flags_duplicates() {
        let field = Field::required(
            "ids",
            Source::Body,
            FieldType::sequence(FieldType::Int),
        )
        .with_constraint(Constraint::UniqueItems);
        let patterns = HashMap::new();

        let value = Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(1)]);
        let errors = check(&field, &value, &loc::body_field("ids"), &patterns);
        assert_eq!(errors[0].kind, ErrorKind::UniqueItems);
        assert!(errors[0].msg.contains("index 2"));
    }

    #[test]
    fn test_null_skips_constraints() {
        let field = Field::optional("q", Source::Query, FieldType::optional(FieldType::Str))
            .with_constraint(Constraint::MinLength(3));
        let patterns = HashMap::new();

        assert!(check(&field, &Value::Null, &loc::query("q"), &patterns).is_empty());
    }
}
