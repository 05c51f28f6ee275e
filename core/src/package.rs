use serde::{Deserialize, Serialize};

use crate::types::Schema;

/// Serializable schema bundle used for curation and distribution.
///
/// A bundle groups multiple [`Schema`] values with version metadata, making
/// it suitable for serializing to JSON or YAML and distributing as a single
/// file that a process registers at startup.
///
/// # Examples
///
/// ```
/// use request_schema_core::*;
///
/// let mut bundle = SchemaBundle::new("1.0.0", "2026-01-15T10:30:00Z");
/// bundle.name = Some("shop-api".into());
/// bundle.schemas.push(
///     Schema::new("Item").with_field(Field::required("name", Source::Body, FieldType::Str)),
/// );
///
/// assert_eq!(bundle.schema_count(), 1);
/// let registry = SchemaRegistry::builder()
///     .register_all(bundle.schemas)
///     .build()
///     .unwrap();
/// assert!(registry.get("Item").is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaBundle {
    /// Schema contract version (populated from
    /// [`SCHEMA_CONTRACT_VERSION`](crate::SCHEMA_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Bundle format version (semver string).
    pub version: String,
    /// Optional bundle name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional bundle description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO-8601 timestamp for bundle creation.
    pub generated_at: String,
    /// Schemas included in this bundle.
    #[serde(default)]
    pub schemas: Vec<Schema>,
}

impl SchemaBundle {
    /// Creates a bundle with required fields.
    ///
    /// The `schema_version` is automatically set from
    /// [`SCHEMA_CONTRACT_VERSION`](crate::SCHEMA_CONTRACT_VERSION).
    pub fn new(version: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            schema_version: Some(crate::SCHEMA_CONTRACT_VERSION.to_string()),
            version: version.into(),
            name: None,
            description: None,
            generated_at: generated_at.into(),
            schemas: Vec::new(),
        }
    }

    /// Returns the number of schemas in this bundle.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}
