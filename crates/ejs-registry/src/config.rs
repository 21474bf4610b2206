//! Registry configuration.
//!
//! Every source option is independent and defaults to empty. Sources are
//! processed in a fixed order regardless of how the configuration was
//! written: `data`, `file`, `files`, `directory`, `directories`.
//!
//! A configuration can be built in code with the `with_*` methods or loaded
//! from a YAML (or JSON) file:
//!
//! ```yaml
//! directory: schemas
//! files:
//!   - extra/address.json
//! draft: draft7
//! duplicate_titles: reject
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

/// JSON Schema draft assumed for schemas that carry no `$schema` keyword.
///
/// Only `draft4` treats `id` as the schema's base URI; later drafts use
/// `$id`. Relative `$ref`s in documents identified solely by `id` resolve
/// only under `draft4`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SchemaDraft {
    #[default]
    #[serde(rename = "draft4")]
    Draft4,
    #[serde(rename = "draft6")]
    Draft6,
    #[serde(rename = "draft7")]
    Draft7,
    #[serde(rename = "draft2019-09")]
    Draft201909,
    #[serde(rename = "draft2020-12")]
    Draft202012,
}

impl From<SchemaDraft> for jsonschema::Draft {
    fn from(draft: SchemaDraft) -> Self {
        match draft {
            SchemaDraft::Draft4 => jsonschema::Draft::Draft4,
            SchemaDraft::Draft6 => jsonschema::Draft::Draft6,
            SchemaDraft::Draft7 => jsonschema::Draft::Draft7,
            SchemaDraft::Draft201909 => jsonschema::Draft::Draft201909,
            SchemaDraft::Draft202012 => jsonschema::Draft::Draft202012,
        }
    }
}

/// Order in which files discovered in a directory are ingested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryOrder {
    /// Sort by file name.
    #[default]
    Lexicographic,
    /// Keep the order the platform lists entries in.
    Filesystem,
}

/// What happens when a title is registered a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTitlePolicy {
    /// The later registration replaces the earlier one in the title index.
    #[default]
    Overwrite,
    /// Construction fails with `DuplicateSchemaTitle`.
    Reject,
}

/// Sources and options for building a [`SchemaRegistry`](crate::SchemaRegistry).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// A single in-memory schema document.
    pub data: Option<Value>,
    /// A single schema file.
    pub file: Option<PathBuf>,
    /// Schema files, ingested in order.
    pub files: Vec<PathBuf>,
    /// A directory whose immediate `*.json` files are ingested.
    pub directory: Option<PathBuf>,
    /// Directories, ingested in order.
    pub directories: Vec<PathBuf>,
    pub draft: SchemaDraft,
    pub directory_order: DirectoryOrder,
    pub duplicate_titles: DuplicateTitlePolicy,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from YAML text. JSON is accepted as well.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a configuration file.
    ///
    /// Relative source paths are resolved against the directory containing
    /// the configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_directories<I, P>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.directories
            .extend(directories.into_iter().map(Into::into));
        self
    }

    pub fn with_draft(mut self, draft: SchemaDraft) -> Self {
        self.draft = draft;
        self
    }

    pub fn with_directory_order(mut self, order: DirectoryOrder) -> Self {
        self.directory_order = order;
        self
    }

    pub fn with_duplicate_titles(mut self, policy: DuplicateTitlePolicy) -> Self {
        self.duplicate_titles = policy;
        self
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.file.iter_mut().for_each(resolve);
        self.files.iter_mut().for_each(resolve);
        self.directory.iter_mut().for_each(resolve);
        self.directories.iter_mut().for_each(resolve);
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid registry config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
