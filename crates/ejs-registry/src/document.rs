//! # Schema Documents
//!
//! A schema document is any JSON value handed to the registry. Before it can
//! be indexed it must carry a string `title` (the lookup key callers use) and
//! a string `id` that parses as a URI reference (the key the engine stores
//! the body under). [`SchemaDocument::ingest`] performs those checks and is
//! the only way to obtain a [`SchemaDocument`].
//!
//! A relative `id` is resolved against its origin: the schema file's
//! `file://` URL, or [`INLINE_BASE_URI`] for inline data. Callers keep
//! seeing the `id` as written.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use url::Url;

use crate::error::RegistryError;

/// Base URI for relative ids of inline schema documents.
pub const INLINE_BASE_URI: &str = "ejs://inline/";

/// Where a schema document was obtained from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOrigin {
    /// The `data` option of the registry configuration.
    Inline,
    /// A schema file, whether named directly or discovered in a directory.
    File(PathBuf),
}

impl fmt::Display for SchemaOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => f.write_str("inline data"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl SchemaOrigin {
    /// Base URI that relative ids from this origin resolve against.
    ///
    /// Falls back to [`INLINE_BASE_URI`] when a file path cannot be made
    /// absolute.
    pub fn base_uri(&self) -> Option<Url> {
        let file_url = match self {
            Self::Inline => None,
            Self::File(path) => path
                .canonicalize()
                .ok()
                .and_then(|abs| Url::from_file_path(abs).ok()),
        };
        file_url.or_else(|| Url::parse(INLINE_BASE_URI).ok())
    }
}

/// A schema identifier: the `id` exactly as written plus its parsed URI.
///
/// Display uses the raw string; equality compares both forms. The engine
/// keys its store by [`SchemaId::uri`].
#[derive(Debug, Clone)]
pub struct SchemaId {
    raw: String,
    uri: Url,
}

impl SchemaId {
    /// Parse an absolute `id`.
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Self::resolve(raw, None)
    }

    /// Parse an `id` that may be relative to `base`.
    pub fn resolve(raw: &str, base: Option<&Url>) -> Result<Self, url::ParseError> {
        let uri = match base {
            Some(base) => base.join(raw)?,
            None => Url::parse(raw)?,
        };
        Ok(Self {
            raw: raw.to_string(),
            uri,
        })
    }

    /// The `id` string as it appeared in the document.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed, normalized URI.
    pub fn uri(&self) -> &Url {
        &self.uri
    }
}

impl PartialEq for SchemaId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.uri == other.uri
    }
}

impl Eq for SchemaId {}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A schema document that passed ingestion checks.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    title: String,
    id: SchemaId,
    body: Value,
    origin: SchemaOrigin,
}

impl SchemaDocument {
    /// Check `body` for a usable `title` and `id`.
    ///
    /// The title is checked first, so a document missing both reports
    /// [`RegistryError::MissingSchemaTitle`]. A JSON `null` counts as absent.
    pub fn ingest(body: Value, origin: SchemaOrigin) -> Result<Self, RegistryError> {
        let title = match required_str(&body, "title", &origin)? {
            Some(title) => title.to_string(),
            None => return Err(RegistryError::MissingSchemaTitle { origin }),
        };

        let raw_id = match required_str(&body, "id", &origin)? {
            Some(id) => id,
            None => return Err(RegistryError::MissingSchemaId { origin }),
        };

        let base = origin.base_uri();
        let id = SchemaId::resolve(raw_id, base.as_ref()).map_err(|e| RegistryError::InvalidSchemaId {
            origin: origin.clone(),
            id: raw_id.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            title,
            id,
            body,
            origin,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn id(&self) -> &SchemaId {
        &self.id
    }

    pub fn origin(&self) -> &SchemaOrigin {
        &self.origin
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Split into the parts the registry and the engine each keep.
    pub fn into_parts(self) -> (String, SchemaId, Value, SchemaOrigin) {
        (self.title, self.id, self.body, self.origin)
    }
}

/// Fetch a string attribute. `Ok(None)` when absent or `null`.
fn required_str<'a>(
    body: &'a Value,
    attribute: &'static str,
    origin: &SchemaOrigin,
) -> Result<Option<&'a str>, RegistryError> {
    match body.get(attribute) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(RegistryError::InvalidSchemaAttribute {
            origin: origin.clone(),
            attribute,
            found: json_type_name(other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
