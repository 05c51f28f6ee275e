//! Bound value graph produced by a successful bind.
//!
//! A [`Value`] is the typed result of coercing raw request data against a
//! schema: scalars, sequences, sets, mappings, and nested objects. Values
//! are immutable once produced and convert losslessly to JSON for callers
//! that serialize responses.

use std::collections::BTreeMap;
use std::fmt;

/// Key of a bound mapping value.
///
/// Wire formats carry object keys as strings; binding coerces them to the
/// mapping's declared key type, so a bound mapping can be keyed by integers.
///
/// # Examples
///
/// ```
/// use request_schema_core::MapKey;
///
/// let k = MapKey::Int(3);
/// assert_eq!(k.to_string(), "3");
/// assert_eq!(MapKey::Str("x".into()).to_string(), "x");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    /// Integer key (coerced from its string wire form).
    Int(i64),
    /// String key.
    Str(String),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// A typed, validated value produced by binding.
///
/// The variants mirror the declarable field types: scalars, `Seq`/`Set`
/// collections, `Map` for mappings, and `Object` for nested schema results.
/// `Null` is the bound form of an absent optional field.
///
/// # Examples
///
/// ```
/// use request_schema_core::Value;
///
/// let v = Value::Seq(vec![Value::Str("foo".into()), Value::Str("bar".into())]);
/// assert_eq!(v.as_seq().unwrap().len(), 2);
/// assert_eq!(v.to_json(), serde_json::json!(["foo", "bar"]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent optional value.
    Null,
    /// String scalar.
    Str(String),
    /// Integer scalar.
    Int(i64),
    /// Float scalar.
    Float(f64),
    /// Boolean scalar.
    Bool(bool),
    /// Ordered sequence of values.
    Seq(Vec<Value>),
    /// De-duplicated collection, first-occurrence order preserved.
    Set(Vec<Value>),
    /// Mapping with coerced keys.
    Map(BTreeMap<MapKey, Value>),
    /// Nested schema result, keyed by declared field name.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string if this is a `Str` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int` value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float if this is a `Float` value.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool` value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the elements if this is a `Seq` or `Set` value.
    #[must_use]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a `Map` value.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<MapKey, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the fields if this is an `Object` value.
    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Looks up a field of an `Object` value by declared name.
    ///
    /// # Examples
    ///
    /// ```
    /// use request_schema_core::Value;
    /// use std::collections::BTreeMap;
    ///
    /// let mut fields = BTreeMap::new();
    /// fields.insert("q".to_string(), Value::Str("fixedquery".into()));
    /// let obj = Value::Object(fields);
    ///
    /// assert_eq!(obj.get("q").and_then(Value::as_str), Some("fixedquery"));
    /// assert!(obj.get("missing").is_none());
    /// ```
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|fields| fields.get(name))
    }

    /// Number of elements for collection values, fields for objects.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Seq(items) | Self::Set(items) => Some(items.len()),
            Self::Map(entries) => Some(entries.len()),
            Self::Object(fields) => Some(fields.len()),
            _ => None,
        }
    }

    /// Converts the bound value to its JSON representation.
    ///
    /// Integer map keys become JSON object keys in their decimal string
    /// form, since JSON objects cannot carry non-string keys.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Int(i) => serde_json::Value::Number((*i).into()),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Seq(items) | Self::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Self::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}
