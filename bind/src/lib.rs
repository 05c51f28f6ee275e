//! Request binding engine.
//!
//! Turns the untyped parts of one inbound request (path captures, query
//! parameters, headers, cookies, and a JSON body) into a typed, validated
//! value graph against schemas from `request-schema-core`, aggregating
//! every violation instead of stopping at the first:
//!
//! - [`RawRequest`] — the untyped request view a transport layer hands in.
//! - [`Binder`] — a compiled schema set, built once at startup, binding
//!   any number of requests afterwards.
//!
//! Binding is a pure, synchronous computation: no I/O, no locking, no
//! hidden state. Many requests can bind concurrently against the same
//! shared registry.
//!
//! # Example
//!
//! ```
//! use request_schema_bind::{Binder, RawRequest};
//! use request_schema_core::*;
//!
//! let registry = SchemaRegistry::builder()
//!     .register(
//!         Schema::new("Item")
//!             .with_field(Field::required("name", Source::Body, FieldType::Str))
//!             .with_field(Field::required("price", Source::Body, FieldType::Float)),
//!     )
//!     .register(
//!         Schema::new("UpdateItem")
//!             .with_field(Field::required("item_id", Source::Path, FieldType::Int))
//!             .with_field(Field::required("item", Source::Body, FieldType::nested("Item"))),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let binder = Binder::new(&registry, &["UpdateItem"]).unwrap();
//! let req = RawRequest::new()
//!     .with_path("item_id", "42")
//!     .with_body(serde_json::json!({"name": "Foo", "price": 42.0}));
//!
//! let bound = binder.bind(&req).unwrap();
//! assert_eq!(bound.get("item_id").and_then(Value::as_int), Some(42));
//! assert_eq!(
//!     bound.get("item").and_then(|i| i.get("name")).and_then(Value::as_str),
//!     Some("Foo"),
//! );
//! ```

mod binder;
mod body;
mod coerce;
mod constrain;
mod extract;
mod request;

pub use binder::Binder;
pub use request::RawRequest;
