//! Raw request model consumed by the binder.
//!
//! A [`RawRequest`] is the untyped view of one inbound request after the
//! transport layer has split it into its parts: path captures, query
//! parameters, headers, cookies, and an optional JSON body. Repeated query
//! and header occurrences are kept in request order. The type round-trips
//! through serde so captured requests can be stored as fixtures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Untyped request data for one bind call.
///
/// # Examples
///
/// ```
/// use request_schema_bind::RawRequest;
///
/// let req = RawRequest::new()
///     .with_path("item_id", "42")
///     .with_query("q", "foo")
///     .with_query("q", "bar")
///     .with_header("X-Token", "secret")
///     .with_body(serde_json::json!({"name": "Foo", "price": 42.0}));
///
/// assert_eq!(req.query["q"], vec!["foo", "bar"]);
/// assert!(req.body.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRequest {
    /// Path captures from the route template, one value per name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub path: BTreeMap<String, String>,
    /// Query parameters; repeated occurrences preserved in request order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, Vec<String>>,
    /// Headers; repeated occurrences preserved in request order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
    /// Cookies, one value per name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cookies: BTreeMap<String, String>,
    /// Parsed JSON body, when the request carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl RawRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a path capture.
    #[must_use]
    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    /// Appends a query parameter occurrence.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Appends a header occurrence.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Sets a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_query_preserves_order() {
        let req = RawRequest::new()
            .with_query("tag", "rock")
            .with_query("tag", "metal")
            .with_query("tag", "rock");

        assert_eq!(req.query["tag"], vec!["rock", "metal", "rock"]);
    }

    #[test]
    fn test_fixture_round_trip() {
        let req = RawRequest::new()
            .with_path("item_id", "7")
            .with_query("q", "foo")
            .with_body(serde_json::json!({"price": 9.5}));

        let json = serde_json::to_string(&req).unwrap();
        let back: RawRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }
}
