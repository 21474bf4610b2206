//! Schema file loading and directory discovery.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::DirectoryOrder;
use crate::error::RegistryError;

const SCHEMA_FILE_SUFFIX: &str = ".json";

/// Read and parse one schema file.
pub fn read_schema_file(path: &Path) -> Result<Value, RegistryError> {
    let content = std::fs::read_to_string(path).map_err(|source| RegistryError::SchemaLoad {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| RegistryError::SchemaParse {
        path: path.to_path_buf(),
        source,
    })
}

/// List the schema files directly inside `dir`.
///
/// Keeps regular files (symlinks are followed) whose name ends in `.json`.
/// Subdirectories are not descended into.
pub fn schema_files(dir: &Path, order: DirectoryOrder) -> Result<Vec<PathBuf>, RegistryError> {
    let read_err = |source| RegistryError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_schema_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .is_some_and(|name| name.ends_with(SCHEMA_FILE_SUFFIX));
        if is_schema_name && path.is_file() {
            files.push(path);
        }
    }

    if order == DirectoryOrder::Lexicographic {
        files.sort();
    }

    tracing::debug!(path = %dir.display(), files = files.len(), "discovered schema files");
    Ok(files)
}
