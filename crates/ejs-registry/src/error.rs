//! Registry error types.
//!
//! Ingestion errors abort construction: a registry is either fully built or
//! not returned at all. [`RegistryError::UnknownSchemaTitle`] is the only
//! error a lookup on a built registry produces for a well-formed instance.
//! Instances that fail their schema are not errors; they come back as a
//! non-empty list of violations.

use std::path::PathBuf;

use thiserror::Error;

use crate::document::{SchemaId, SchemaOrigin};
use crate::engine::EngineError;

/// Errors produced while building or querying a [`SchemaRegistry`](crate::SchemaRegistry).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A schema document has no `title` attribute.
    #[error("schema from {origin} is missing title attribute")]
    MissingSchemaTitle { origin: SchemaOrigin },

    /// A schema document has a `title` but no `id` attribute.
    #[error("schema from {origin} is missing id attribute")]
    MissingSchemaId { origin: SchemaOrigin },

    /// `title` or `id` is present but is not a string.
    #[error("schema from {origin} has a non-string {attribute} attribute (found {found})")]
    InvalidSchemaAttribute {
        origin: SchemaOrigin,
        attribute: &'static str,
        found: &'static str,
    },

    /// `id` is not a URI reference.
    #[error("schema from {origin} has an invalid id {id:?}: {reason}")]
    InvalidSchemaId {
        origin: SchemaOrigin,
        id: String,
        reason: String,
    },

    /// A title was registered twice while duplicates are rejected.
    #[error("duplicate schema title {title:?}: already registered as {existing}, now {id}")]
    DuplicateSchemaTitle {
        title: String,
        existing: SchemaId,
        id: SchemaId,
    },

    /// No schema is registered under the requested title.
    #[error("unknown schema title: {0}")]
    UnknownSchemaTitle(String),

    /// A schema file could not be read.
    #[error("failed to read schema file {path}: {source}")]
    SchemaLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A schema file is not valid JSON.
    #[error("failed to parse schema file {path}: {source}")]
    SchemaParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A schema directory could not be listed.
    #[error("failed to list schema directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Instance text handed to `validate_json` is not valid JSON.
    #[error("failed to parse instance data: {0}")]
    InstanceParse(#[source] serde_json::Error),

    /// The validation engine rejected a schema.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
