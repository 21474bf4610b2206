//! # ejs-registry — Title-Indexed JSON Schema Registry
//!
//! Loads JSON Schema documents from inline data, files, and directories,
//! indexes them by their `title`, and validates JSON instances against a
//! schema selected by title.
//!
//! ```no_run
//! use ejs_registry::{RegistryConfig, SchemaRegistry};
//! use serde_json::json;
//!
//! let config = RegistryConfig::new().with_directory("schemas");
//! let registry = SchemaRegistry::new(&config)?;
//! let violations = registry.validate_data("Person", &json!({"name": "Alice"}))?;
//! assert!(violations.is_empty());
//! # Ok::<(), ejs_registry::RegistryError>(())
//! ```
//!
//! ## Responsibilities
//!
//! - **Ingestion** ([`registry`], [`source`], [`document`]): every schema
//!   must carry a string `title` and a URI-reference `id`; relative ids
//!   resolve against the schema's file (or a fixed inline base). Any failure
//!   aborts construction.
//! - **Indexing**: `title → id`, last registration wins unless
//!   [`DuplicateTitlePolicy::Reject`] is configured.
//! - **Dispatch** ([`engine`]): keyword evaluation and `$ref` resolution
//!   are delegated to a [`SchemaEngine`]; [`JsonSchemaEngine`] wraps the
//!   `jsonschema` crate.
//!
//! ## Design
//!
//! Each registry owns its engine and therefore its own schema store. Two
//! registries that both register `urn:person` never see each other's body.
//! Invalid instances are not errors: `validate_data` returns the full list
//! of [`Violation`]s and reserves `Err` for unknown titles.

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod registry;
pub mod source;

// Re-export primary types.
pub use config::{ConfigError, DirectoryOrder, DuplicateTitlePolicy, RegistryConfig, SchemaDraft};
pub use document::{SchemaDocument, SchemaId, SchemaOrigin};
pub use engine::{EngineError, JsonSchemaEngine, SchemaEngine, Violation};
pub use error::RegistryError;
pub use registry::SchemaRegistry;
