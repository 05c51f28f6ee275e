//! Core schema model and shared request-binding primitives.
//!
//! This crate defines the foundational types for describing how an inbound
//! request binds to typed, validated values:
//!
//! - [`Schema`] — immutable description of a set of typed, constrained
//!   fields.
//! - [`Field`] — one named, typed, sourced, constrained unit within a
//!   schema, with optional alias, default, and custom validators.
//! - [`FieldType`] — declarable types: scalars, optionals, sequences, sets,
//!   mappings, and nested schema references.
//! - [`Constraint`] — structural rules (length, bounds, pattern, choice,
//!   uniqueness) applied after coercion.
//! - [`Value`] — the bound value graph produced by a successful bind.
//! - [`ValidationError`] — one request-time failure with a location path;
//!   binding aggregates every failure instead of stopping at the first.
//! - [`SchemaRegistry`] — startup-time registration with exhaustive
//!   configuration-error reporting ([`SchemaError`]).
//! - [`SchemaBundle`] — a versioned, serializable collection of schemas
//!   for distribution.
//!
//! The binding engine itself lives in the `request-schema-bind` crate.
//!
//! # Example
//!
//! ```
//! use request_schema_core::*;
//!
//! let registry = SchemaRegistry::builder()
//!     .register(
//!         Schema::new("UpdateItem")
//!             .with_field(
//!                 Field::required("item_id", Source::Path, FieldType::Int)
//!                     .with_constraint(Constraint::Gt(0.0))
//!                     .with_constraint(Constraint::Le(1000.0)),
//!             )
//!             .with_field(Field::optional(
//!                 "q",
//!                 Source::Query,
//!                 FieldType::optional(FieldType::Str),
//!             )),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert!(registry.get("UpdateItem").is_some());
//! ```

mod error;
mod package;
mod registry;
mod types;
mod validate;
mod value;

pub use error::{BindResult, ErrorKind, LocItem, ValidationError, loc};
pub use package::SchemaBundle;
pub use registry::{RegistryBuilder, SchemaRegistry};
pub use types::*;
pub use validate::{SchemaError, validate_schema};
pub use value::{MapKey, Value};
