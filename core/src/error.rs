//! Request-time validation error model.
//!
//! Binding never stops at the first failure: every extraction, coercion,
//! constraint, and custom-validator error across a request is collected into
//! one ordered list of [`ValidationError`]s. Each error carries a location
//! path mirroring the nesting of the bound data (source, field, nested
//! field, index) and serializes to the `{"type", "loc", "msg"}` wire shape
//! a transport layer maps onto a structured 4xx response.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::value::Value;

/// One segment of an error location path.
///
/// Paths mix field names (strings) and collection indices (integers), e.g.
/// `["body", "items", 0, "name"]`.
///
/// # Examples
///
/// ```
/// use request_schema_core::LocItem;
///
/// let field = LocItem::field("email");
/// assert_eq!(field.as_str(), Some("email"));
///
/// let idx = LocItem::index(0);
/// assert_eq!(idx.as_index(), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocItem {
    /// Field or key name.
    Field(String),
    /// Collection index.
    Index(usize),
}

impl LocItem {
    /// Creates a field-name segment.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Creates an index segment.
    #[must_use]
    pub fn index(idx: usize) -> Self {
        Self::Index(idx)
    }

    /// The field name, if this is a `Field` segment.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Field(s) => Some(s),
            Self::Index(_) => None,
        }
    }

    /// The index, if this is an `Index` segment.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Field(_) => None,
            Self::Index(i) => Some(*i),
        }
    }
}

impl From<&str> for LocItem {
    fn from(s: &str) -> Self {
        Self::Field(s.to_owned())
    }
}

impl From<String> for LocItem {
    fn from(s: String) -> Self {
        Self::Field(s)
    }
}

impl From<usize> for LocItem {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl fmt::Display for LocItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(s) => f.write_str(s),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl Serialize for LocItem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Field(s) => serializer.serialize_str(s),
            Self::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

/// Kind of a request validation failure.
///
/// Serialized as a snake_case string in the `type` slot of the wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required field absent.
    Missing,
    /// Repeated raw occurrences for a single-valued field.
    MultipleValues,
    /// Value is not a valid string.
    StringType,
    /// Value is not a valid integer.
    IntType,
    /// Value is not a valid float.
    FloatType,
    /// Value is not a valid boolean.
    BoolType,
    /// JSON value has the wrong shape (array/object expected or found).
    JsonType,
    /// String shorter than `min_length`.
    StringTooShort,
    /// String longer than `max_length`.
    StringTooLong,
    /// Collection has fewer items than `min_length`.
    TooShort,
    /// Collection has more items than `max_length`.
    TooLong,
    /// String does not full-match the declared pattern.
    PatternMismatch,
    /// Numeric value below a `gt` bound.
    GreaterThan,
    /// Numeric value below a `ge` bound.
    GreaterThanEqual,
    /// Numeric value above an `lt` bound.
    LessThan,
    /// Numeric value above an `le` bound.
    LessThanEqual,
    /// Value not a member of the declared choices.
    Enum,
    /// Duplicate elements where `unique_items` was declared.
    UniqueItems,
    /// Key matches no declared field under the `Forbid` policy.
    ExtraForbidden,
    /// Custom validator rejection.
    ValueError,
}

impl ErrorKind {
    /// The snake_case wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::MultipleValues => "multiple_values",
            Self::StringType => "string_type",
            Self::IntType => "int_type",
            Self::FloatType => "float_type",
            Self::BoolType => "bool_type",
            Self::JsonType => "json_type",
            Self::StringTooShort => "string_too_short",
            Self::StringTooLong => "string_too_long",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::PatternMismatch => "pattern_mismatch",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanEqual => "greater_than_equal",
            Self::LessThan => "less_than",
            Self::LessThanEqual => "less_than_equal",
            Self::Enum => "enum",
            Self::UniqueItems => "unique_items",
            Self::ExtraForbidden => "extra_forbidden",
            Self::ValueError => "value_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request validation failure.
///
/// Serializes to `{"type": kind, "loc": [source, field, ...], "msg": text}`.
///
/// # Examples
///
/// ```
/// use request_schema_core::{loc, ErrorKind, ValidationError};
///
/// let error = ValidationError::missing(loc::query("q"));
/// assert_eq!(error.kind, ErrorKind::Missing);
/// assert_eq!(error.msg, "Field required");
///
/// let json = serde_json::to_value(&error).unwrap();
/// assert_eq!(json["loc"], serde_json::json!(["query", "q"]));
/// assert_eq!(json["type"], "missing");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Failure kind.
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Location path, outermost segment first.
    pub loc: Vec<LocItem>,
    /// Human-readable message; preserves the offending raw value where one
    /// exists.
    pub msg: String,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(kind: ErrorKind, loc: Vec<LocItem>, msg: impl Into<String>) -> Self {
        Self {
            kind,
            loc,
            msg: msg.into(),
        }
    }

    /// Creates a `missing` error for an absent required field.
    #[must_use]
    pub fn missing(loc: Vec<LocItem>) -> Self {
        Self::new(ErrorKind::Missing, loc, "Field required")
    }

    /// Creates a `multiple_values` error for a repeated single-valued field.
    #[must_use]
    pub fn multiple_values(loc: Vec<LocItem>, count: usize) -> Self {
        Self::new(
            ErrorKind::MultipleValues,
            loc,
            format!("Expected a single value but received {count}"),
        )
    }

    /// Creates an `extra_forbidden` error for an unknown key.
    #[must_use]
    pub fn extra_forbidden(loc: Vec<LocItem>) -> Self {
        Self::new(ErrorKind::ExtraForbidden, loc, "Extra inputs are not permitted")
    }

    /// Creates a `value_error` from a custom validator message.
    #[must_use]
    pub fn value_error(loc: Vec<LocItem>, msg: impl fmt::Display) -> Self {
        Self::new(ErrorKind::ValueError, loc, format!("Value error, {msg}"))
    }

    /// Prepends location segments, outermost first.
    #[must_use]
    pub fn with_loc_prefix(mut self, prefix: &[LocItem]) -> Self {
        let mut loc = prefix.to_vec();
        loc.append(&mut self.loc);
        self.loc = loc;
        self
    }

    /// Appends one location segment.
    #[must_use]
    pub fn with_loc_suffix(mut self, item: impl Into<LocItem>) -> Self {
        self.loc.push(item.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.loc.iter().map(ToString::to_string).collect();
        write!(f, "{}: {} ({})", path.join("."), self.msg, self.kind)
    }
}

/// Location path constructors for each extraction source.
pub mod loc {
    use super::LocItem;
    use crate::types::Source;

    /// `[source, name]` for any source.
    #[must_use]
    pub fn source(source: Source, name: &str) -> Vec<LocItem> {
        vec![LocItem::field(source.as_str()), LocItem::field(name)]
    }

    /// Path parameter location: `["path", name]`.
    #[must_use]
    pub fn path(name: &str) -> Vec<LocItem> {
        source(Source::Path, name)
    }

    /// Query parameter location: `["query", name]`.
    #[must_use]
    pub fn query(name: &str) -> Vec<LocItem> {
        source(Source::Query, name)
    }

    /// Header location: `["header", name]`.
    #[must_use]
    pub fn header(name: &str) -> Vec<LocItem> {
        source(Source::Header, name)
    }

    /// Cookie location: `["cookie", name]`.
    #[must_use]
    pub fn cookie(name: &str) -> Vec<LocItem> {
        source(Source::Cookie, name)
    }

    /// Body root location: `["body"]`.
    #[must_use]
    pub fn body() -> Vec<LocItem> {
        vec![LocItem::field("body")]
    }

    /// Body key location: `["body", name]`.
    #[must_use]
    pub fn body_field(name: &str) -> Vec<LocItem> {
        source(Source::Body, name)
    }
}

/// Outcome of binding one request against a schema set.
///
/// `Ok` holds the fully bound [`Value::Object`] keyed by declared field
/// names; `Err` holds a non-empty list of errors ordered by field
/// declaration order, then by sub-element index.
pub type BindResult = Result<Value, Vec<ValidationError>>;
