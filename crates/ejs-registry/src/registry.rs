//! # Schema Registry
//!
//! [`SchemaRegistry`] ingests every source named in a [`RegistryConfig`],
//! indexes the resulting schemas by `title`, and validates instances against
//! a schema selected by title.
//!
//! Construction is all-or-nothing. Sources are processed in the order
//! `data`, `file`, `files`, `directory`, `directories`; the first failing
//! source aborts construction and no registry is returned. Once built, the
//! registry is read-only.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::config::{DirectoryOrder, DuplicateTitlePolicy, RegistryConfig};
use crate::document::{SchemaDocument, SchemaId, SchemaOrigin};
use crate::engine::{JsonSchemaEngine, SchemaEngine, Violation};
use crate::error::RegistryError;
use crate::source;

/// Title-indexed view over the schemas registered with an engine.
pub struct SchemaRegistry<E = JsonSchemaEngine> {
    /// Titles in order of first registration.
    titles: Vec<String>,
    index: HashMap<String, SchemaId>,
    engine: E,
}

impl<E> std::fmt::Debug for SchemaRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("titles", &self.titles)
            .finish()
    }
}

impl SchemaRegistry {
    /// Build a registry backed by a fresh [`JsonSchemaEngine`].
    ///
    /// # Errors
    ///
    /// Any source that cannot be read, parsed, or ingested aborts
    /// construction; see [`RegistryError`].
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Self::with_engine(config, JsonSchemaEngine::new(config.draft))
    }
}

impl<E: SchemaEngine> SchemaRegistry<E> {
    /// Build a registry that registers schemas with `engine`.
    ///
    /// After every source is ingested, the schema behind each indexed title
    /// is compiled so broken schemas and dangling `$ref`s surface here rather
    /// than on first use.
    pub fn with_engine(config: &RegistryConfig, engine: E) -> Result<Self, RegistryError> {
        let mut registry = Self {
            titles: Vec::new(),
            index: HashMap::new(),
            engine,
        };
        let policy = config.duplicate_titles;

        if let Some(data) = &config.data {
            registry.ingest(data.clone(), SchemaOrigin::Inline, policy)?;
        }

        if let Some(file) = &config.file {
            registry.ingest_file(file, policy)?;
        }

        for file in &config.files {
            registry.ingest_file(file, policy)?;
        }

        if let Some(dir) = &config.directory {
            registry.ingest_directory(dir, config.directory_order, policy)?;
        }

        for dir in &config.directories {
            registry.ingest_directory(dir, config.directory_order, policy)?;
        }

        for title in &registry.titles {
            registry.engine.compile(&registry.index[title])?;
        }

        tracing::info!(schema_count = registry.titles.len(), "schema registry built");
        Ok(registry)
    }

    /// All registered titles, in order of first registration.
    pub fn list_schema_titles(&self) -> Vec<&str> {
        self.titles.iter().map(String::as_str).collect()
    }

    /// The id a title currently resolves to.
    pub fn schema_id(&self, title: &str) -> Option<&SchemaId> {
        self.index.get(title)
    }

    /// Number of registered titles.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Validate `data` against the schema registered under `schema_title`.
    ///
    /// Returns every violation found; an empty list means `data` is valid.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownSchemaTitle`] if no schema has that title.
    pub fn validate_data(
        &self,
        schema_title: &str,
        data: &Value,
    ) -> Result<Vec<Violation>, RegistryError> {
        let id = self.resolve(schema_title)?;
        Ok(self.engine.validate(id, data)?)
    }

    /// Parse `json` and validate it like [`validate_data`](Self::validate_data).
    ///
    /// The title is checked before the text is parsed.
    pub fn validate_json(
        &self,
        schema_title: &str,
        json: &str,
    ) -> Result<Vec<Violation>, RegistryError> {
        let id = self.resolve(schema_title)?;
        let data: Value = serde_json::from_str(json).map_err(RegistryError::InstanceParse)?;
        Ok(self.engine.validate(id, &data)?)
    }

    fn resolve(&self, schema_title: &str) -> Result<&SchemaId, RegistryError> {
        self.index
            .get(schema_title)
            .ok_or_else(|| RegistryError::UnknownSchemaTitle(schema_title.to_string()))
    }

    fn ingest_directory(
        &mut self,
        dir: &Path,
        order: DirectoryOrder,
        policy: DuplicateTitlePolicy,
    ) -> Result<(), RegistryError> {
        for file in source::schema_files(dir, order)? {
            self.ingest_file(&file, policy)?;
        }
        Ok(())
    }

    fn ingest_file(
        &mut self,
        path: &Path,
        policy: DuplicateTitlePolicy,
    ) -> Result<(), RegistryError> {
        let body = source::read_schema_file(path)?;
        self.ingest(body, SchemaOrigin::File(path.to_path_buf()), policy)
    }

    fn ingest(
        &mut self,
        body: Value,
        origin: SchemaOrigin,
        policy: DuplicateTitlePolicy,
    ) -> Result<(), RegistryError> {
        let (title, id, body, origin) = SchemaDocument::ingest(body, origin)?.into_parts();

        if let Some(existing) = self.index.get(&title) {
            if policy == DuplicateTitlePolicy::Reject {
                return Err(RegistryError::DuplicateSchemaTitle {
                    title,
                    existing: existing.clone(),
                    id,
                });
            }
            tracing::warn!(
                %title,
                previous = %existing,
                id = %id,
                %origin,
                "schema title registered again, later id wins"
            );
        } else {
            self.titles.push(title.clone());
        }

        self.engine.register(&id, body);
        tracing::debug!(%title, id = %id, %origin, "registered schema");
        self.index.insert(title, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Engine that records calls and reports one violation per instance
    /// that is not `true`.
    #[derive(Default)]
    struct RecordingEngine {
        registered: Vec<(String, Value)>,
        compiled: Vec<String>,
    }

    impl SchemaEngine for RecordingEngine {
        fn register(&mut self, id: &SchemaId, document: Value) {
            self.registered.push((id.to_string(), document));
        }

        fn compile(&mut self, id: &SchemaId) -> Result<(), crate::EngineError> {
            self.compiled.push(id.to_string());
            Ok(())
        }

        fn validate(
            &self,
            id: &SchemaId,
            instance: &Value,
        ) -> Result<Vec<Violation>, crate::EngineError> {
            if instance == &Value::Bool(true) {
                return Ok(Vec::new());
            }
            Ok(vec![Violation {
                schema_id: id.to_string(),
                instance_path: String::new(),
                schema_path: String::new(),
                keyword: "const".to_string(),
                message: "not true".to_string(),
            }])
        }
    }

    fn schema(title: &str, id: &str) -> Value {
        json!({"title": title, "id": id})
    }

    fn write_schema(dir: &Path, name: &str, title: &str, id: &str) {
        std::fs::write(dir.join(name), schema(title, id).to_string()).unwrap();
    }

    #[test]
    fn empty_config_builds_empty_registry() {
        let registry = SchemaRegistry::new(&RegistryConfig::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.list_schema_titles().is_empty());
    }

    #[test]
    fn sources_are_processed_in_fixed_order() {
        let tmp = tempfile::tempdir().unwrap();
        let dir_one = tmp.path().join("one");
        let dir_two = tmp.path().join("two");
        std::fs::create_dir(&dir_one).unwrap();
        std::fs::create_dir(&dir_two).unwrap();
        write_schema(tmp.path(), "file.json", "File", "urn:file");
        write_schema(tmp.path(), "files-a.json", "FilesA", "urn:files-a");
        write_schema(tmp.path(), "files-b.json", "FilesB", "urn:files-b");
        write_schema(&dir_one, "d.json", "Directory", "urn:directory");
        write_schema(&dir_two, "e.json", "Directories", "urn:directories");

        // Options set in reverse of processing order.
        let config = RegistryConfig::new()
            .with_directories([&dir_two])
            .with_directory(&dir_one)
            .with_files([tmp.path().join("files-b.json"), tmp.path().join("files-a.json")])
            .with_file(tmp.path().join("file.json"))
            .with_data(schema("Data", "urn:data"));

        let registry = SchemaRegistry::with_engine(&config, RecordingEngine::default()).unwrap();
        assert_eq!(
            registry.list_schema_titles(),
            vec!["Data", "File", "FilesB", "FilesA", "Directory", "Directories"]
        );
        let registered: Vec<_> = registry
            .engine()
            .registered
            .iter()
            .map(|(id, _)| id.as_str())
            .collect();
        assert_eq!(
            registered,
            vec![
                "urn:data",
                "urn:file",
                "urn:files-b",
                "urn:files-a",
                "urn:directory",
                "urn:directories"
            ]
        );
        assert_eq!(registry.engine().compiled.len(), 6);
    }

    #[test]
    fn directory_files_are_sorted_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        write_schema(tmp.path(), "c.json", "C", "urn:c");
        write_schema(tmp.path(), "a.json", "A", "urn:a");
        write_schema(tmp.path(), "b.json", "B", "urn:b");
        let config = RegistryConfig::new().with_directory(tmp.path());
        let registry = SchemaRegistry::with_engine(&config, RecordingEngine::default()).unwrap();
        assert_eq!(registry.list_schema_titles(), vec!["A", "B", "C"]);
    }

    #[test]
    fn duplicate_title_overwrites_and_keeps_first_position() {
        let tmp = tempfile::tempdir().unwrap();
        write_schema(tmp.path(), "other.json", "Other", "urn:other");
        write_schema(tmp.path(), "person.json", "Person", "urn:person-v2");
        let config = RegistryConfig::new()
            .with_data(schema("Person", "urn:person-v1"))
            .with_directory(tmp.path());

        let registry = SchemaRegistry::with_engine(&config, RecordingEngine::default()).unwrap();
        assert_eq!(registry.list_schema_titles(), vec!["Person", "Other"]);
        assert_eq!(registry.schema_id("Person").unwrap().as_str(), "urn:person-v2");
        assert_eq!(registry.len(), 2);
        assert!(registry
            .engine()
            .registered
            .iter()
            .any(|(id, _)| id == "urn:person-v1"));
    }

    #[test]
    fn duplicate_title_rejected_under_reject_policy() {
        let tmp = tempfile::tempdir().unwrap();
        write_schema(tmp.path(), "person.json", "Person", "urn:person-v2");
        let config = RegistryConfig::new()
            .with_data(schema("Person", "urn:person-v1"))
            .with_file(tmp.path().join("person.json"))
            .with_duplicate_titles(DuplicateTitlePolicy::Reject);

        let err = SchemaRegistry::with_engine(&config, RecordingEngine::default()).unwrap_err();
        match err {
            RegistryError::DuplicateSchemaTitle { title, existing, id } => {
                assert_eq!(title, "Person");
                assert_eq!(existing.as_str(), "urn:person-v1");
                assert_eq!(id.as_str(), "urn:person-v2");
            }
            other => panic!("expected DuplicateSchemaTitle, got: {other}"),
        }
    }

    #[test]
    fn ingestion_error_aborts_construction() {
        let tmp = tempfile::tempdir().unwrap();
        write_schema(tmp.path(), "a.json", "A", "urn:a");
        std::fs::write(tmp.path().join("b.json"), r#"{"id": "urn:b"}"#).unwrap();
        let config = RegistryConfig::new().with_directory(tmp.path());

        let err = SchemaRegistry::with_engine(&config, RecordingEngine::default()).unwrap_err();
        match err {
            RegistryError::MissingSchemaTitle { origin } => {
                assert_eq!(origin, SchemaOrigin::File(tmp.path().join("b.json")));
            }
            other => panic!("expected MissingSchemaTitle, got: {other}"),
        }
    }

    #[test]
    fn missing_file_in_files_aborts_construction() {
        let tmp = tempfile::tempdir().unwrap();
        let config = RegistryConfig::new().with_files([tmp.path().join("absent.json")]);
        let err = SchemaRegistry::new(&config).unwrap_err();
        assert!(matches!(err, RegistryError::SchemaLoad { .. }));
    }

    #[test]
    fn validate_dispatches_to_engine_by_resolved_id() {
        let config = RegistryConfig::new().with_data(schema("Flag", "urn:flag"));
        let registry = SchemaRegistry::with_engine(&config, RecordingEngine::default()).unwrap();
        assert!(registry.validate_data("Flag", &json!(true)).unwrap().is_empty());
        let violations = registry.validate_data("Flag", &json!(false)).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].schema_id, "urn:flag");
    }

    #[test]
    fn unknown_title_is_error() {
        let config = RegistryConfig::new().with_data(schema("Flag", "urn:flag"));
        let registry = SchemaRegistry::with_engine(&config, RecordingEngine::default()).unwrap();
        let err = registry.validate_data("Ghost", &json!({})).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSchemaTitle(ref t) if t == "Ghost"));
    }

    #[test]
    fn validate_json_parses_instance_text() {
        let config = RegistryConfig::new().with_data(schema("Flag", "urn:flag"));
        let registry = SchemaRegistry::with_engine(&config, RecordingEngine::default()).unwrap();
        assert!(registry.validate_json("Flag", "true").unwrap().is_empty());
        assert_eq!(registry.validate_json("Flag", " false ").unwrap().len(), 1);
        assert!(matches!(
            registry.validate_json("Flag", "{oops"),
            Err(RegistryError::InstanceParse(_))
        ));
    }

    #[test]
    fn validate_json_checks_title_before_parsing() {
        let registry = SchemaRegistry::new(&RegistryConfig::new()).unwrap();
        let err = registry.validate_json("Ghost", "{oops").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSchemaTitle(_)));
    }

    #[test]
    fn dangling_ref_fails_construction() {
        let config = RegistryConfig::new().with_data(json!({
            "title": "Broken",
            "id": "urn:broken",
            "$ref": "urn:nowhere"
        }));
        let err = SchemaRegistry::new(&config).unwrap_err();
        assert!(matches!(err, RegistryError::Engine(_)));
    }

    #[test]
    fn debug_lists_titles() {
        let config = RegistryConfig::new().with_data(schema("Flag", "urn:flag"));
        let registry = SchemaRegistry::new(&config).unwrap();
        let shown = format!("{registry:?}");
        assert!(shown.contains("SchemaRegistry"));
        assert!(shown.contains("Flag"));
    }
}
