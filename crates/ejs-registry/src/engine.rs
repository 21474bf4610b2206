//! # Validation Engine
//!
//! The registry does not evaluate JSON Schema keywords itself. It hands
//! schema bodies to a [`SchemaEngine`] keyed by their `id` URI and later asks
//! the engine for every violation of an instance against one of those ids.
//!
//! [`JsonSchemaEngine`] is the production engine, backed by the `jsonschema`
//! crate. Each engine owns its own store, so `$ref`s resolve only against
//! schemas registered with the same engine and never over the network.
//!
//! ## Compiled validators
//!
//! Compiling is deferred until every schema has been registered, because a
//! schema may `$ref` one that is ingested after it. The registry calls
//! [`SchemaEngine::compile`] for each indexed id once ingestion is finished;
//! registering another body afterwards drops every cached validator.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::SchemaDraft;
use crate::document::SchemaId;

/// One way an instance fails to satisfy its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The `id` of the schema the instance was validated against.
    pub schema_id: String,
    /// JSON Pointer to the offending part of the instance (`""` is the root).
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that failed.
    pub schema_path: String,
    /// The failing keyword, e.g. `required` or `type`. A `false` subschema
    /// reports `false`.
    pub keyword: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "schema={}, path={}: {}",
            self.schema_id, self.instance_path, self.message
        )
    }
}

/// Errors raised by an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No body is registered under the id.
    #[error("schema not registered: {0}")]
    UnregisteredSchema(String),

    /// The body could not be compiled, including unresolvable `$ref`s.
    #[error("failed to compile schema {schema_id}: {reason}")]
    Compile { schema_id: String, reason: String },
}

/// A store of schema bodies keyed by URI that can validate instances.
pub trait SchemaEngine {
    /// Store `document` under `id`, replacing any body already stored there.
    fn register(&mut self, id: &SchemaId, document: Value);

    /// Build and keep the validator for `id`.
    fn compile(&mut self, id: &SchemaId) -> Result<(), EngineError>;

    /// Report every violation of `instance` against the schema at `id`.
    fn validate(&self, id: &SchemaId, instance: &Value) -> Result<Vec<Violation>, EngineError>;
}

/// Store key for a URI: the normalized URI without fragment.
fn store_key(uri: &Url) -> String {
    let mut uri = uri.clone();
    uri.set_fragment(None);
    uri.into()
}

/// Name of the keyword that produced an error.
///
/// A `false` subschema has no keyword of its own; its schema path ends at
/// the subschema location, which may be a property name or an array index.
fn failing_keyword(kind: &jsonschema::error::ValidationErrorKind, schema_path: &str) -> String {
    if matches!(kind, jsonschema::error::ValidationErrorKind::FalseSchema) {
        return "false".to_string();
    }
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .unwrap_or_default()
        .to_string()
}

/// Resolves `$ref` URIs against the bodies registered with one engine.
struct LocalSchemaRetriever {
    schemas: Arc<HashMap<String, Value>>,
}

impl jsonschema::Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        Url::parse(uri_str)
            .ok()
            .and_then(|parsed| self.schemas.get(&store_key(&parsed)))
            .cloned()
            .ok_or_else(|| format!("schema not registered for URI: {uri_str}").into())
    }
}

/// [`SchemaEngine`] backed by the `jsonschema` crate.
pub struct JsonSchemaEngine {
    draft: SchemaDraft,
    schemas: Arc<HashMap<String, Value>>,
    compiled: HashMap<String, jsonschema::Validator>,
}

impl fmt::Debug for JsonSchemaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaEngine")
            .field("draft", &self.draft)
            .field("schema_count", &self.schemas.len())
            .field("compiled_count", &self.compiled.len())
            .finish()
    }
}

impl Default for JsonSchemaEngine {
    fn default() -> Self {
        Self::new(SchemaDraft::default())
    }
}

impl JsonSchemaEngine {
    /// Create an empty engine. `draft` applies to schemas without `$schema`.
    pub fn new(draft: SchemaDraft) -> Self {
        Self {
            draft,
            schemas: Arc::new(HashMap::new()),
            compiled: HashMap::new(),
        }
    }

    pub fn draft(&self) -> SchemaDraft {
        self.draft
    }

    /// Number of distinct ids registered.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Whether a body is registered under `id`.
    pub fn is_registered(&self, id: &str) -> bool {
        self.schema(id).is_some()
    }

    /// The body registered under `id`, if any.
    ///
    /// `id` must be absolute; relative ids are stored under the URI they
    /// resolve to (see [`SchemaId::uri`]).
    pub fn schema(&self, id: &str) -> Option<&Value> {
        let uri = Url::parse(id).ok()?;
        self.schemas.get(&store_key(&uri))
    }

    fn build(&self, id: &SchemaId) -> Result<jsonschema::Validator, EngineError> {
        let key = store_key(id.uri());
        let schema = self
            .schemas
            .get(&key)
            .ok_or_else(|| EngineError::UnregisteredSchema(id.to_string()))?;

        let retriever = LocalSchemaRetriever {
            schemas: Arc::clone(&self.schemas),
        };

        jsonschema::options()
            .with_draft(self.draft.into())
            .with_retriever(retriever)
            .build(schema)
            .map_err(|e| EngineError::Compile {
                schema_id: id.to_string(),
                reason: e.to_string(),
            })
    }
}

impl SchemaEngine for JsonSchemaEngine {
    fn register(&mut self, id: &SchemaId, document: Value) {
        Arc::make_mut(&mut self.schemas).insert(store_key(id.uri()), document);
        self.compiled.clear();
    }

    fn compile(&mut self, id: &SchemaId) -> Result<(), EngineError> {
        let key = store_key(id.uri());
        if self.compiled.contains_key(&key) {
            return Ok(());
        }
        let validator = self.build(id)?;
        tracing::debug!(schema_id = %id, "compiled schema");
        self.compiled.insert(key, validator);
        Ok(())
    }

    fn validate(&self, id: &SchemaId, instance: &Value) -> Result<Vec<Violation>, EngineError> {
        let collect = |validator: &jsonschema::Validator| -> Vec<Violation> {
            validator
                .iter_errors(instance)
                .map(|err| {
                    let schema_path = err.schema_path.to_string();
                    let keyword = failing_keyword(&err.kind, &schema_path);
                    Violation {
                        schema_id: id.to_string(),
                        instance_path: err.instance_path.to_string(),
                        schema_path,
                        keyword,
                        message: err.to_string(),
                    }
                })
                .collect()
        };

        match self.compiled.get(&store_key(id.uri())) {
            Some(validator) => Ok(collect(validator)),
            None => Ok(collect(&self.build(id)?)),
        }
    }
}
