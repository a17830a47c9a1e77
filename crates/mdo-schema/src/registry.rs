//! Central schema registry.
//!
//! The `SchemaRegistry` parses schema templates, validates each one against
//! the JSON Schema generated from [`SchemaDefinition`] via
//! [`schemars::schema_for!`], runs semantic checks, and then serves the
//! definitions read-only. Definitions are handed out as `Arc`s; nothing in the
//! registry is mutated after construction.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use mdo_core::schema::{SchemaDefinition, SchemaSummary};
use schemars::schema_for;

use crate::check::check_definition;
use crate::error::SchemaError;

/// Built-in templates compiled into the binary: `(source name, JSON)`.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "cosmx-v1.2.json",
        include_str!("../templates/cosmx-v1.2.json"),
    ),
    (
        "geomx-v2.0.json",
        include_str!("../templates/geomx-v2.0.json"),
    ),
];

/// Read-only store of canonical schema templates keyed by id.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<SchemaDefinition>>,
}

/// Compiles the template JSON Schema once per registry build.
struct TemplateValidator {
    validator: jsonschema::Validator,
}

impl TemplateValidator {
    fn new() -> Result<Self, SchemaError> {
        let schema = serde_json::to_value(schema_for!(SchemaDefinition))
            .map_err(|e| SchemaError::Generation(e.to_string()))?;
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| SchemaError::Generation(format!("{e}")))?;
        Ok(Self { validator })
    }

    fn parse(&self, source_name: &str, json: &str) -> Result<SchemaDefinition, SchemaError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| SchemaError::Parse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;

        let errors: Vec<String> = self
            .validator
            .iter_errors(&value)
            .map(|e| format!("{e}"))
            .collect();
        if !errors.is_empty() {
            return Err(SchemaError::ValidationFailed {
                source_name: source_name.to_string(),
                errors,
            });
        }

        let def: SchemaDefinition =
            serde_json::from_value(value).map_err(|e| SchemaError::Parse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        check_definition(&def)?;
        Ok(def)
    }
}

impl SchemaRegistry {
    /// Registry containing only the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if a built-in template fails validation, which
    /// indicates a packaging defect.
    pub fn builtin() -> Result<Self, SchemaError> {
        let validator = TemplateValidator::new()?;
        let mut registry = Self::default();
        for (source, json) in BUILTIN_TEMPLATES {
            registry.insert_unique(validator.parse(source, json)?)?;
        }
        Ok(registry)
    }

    /// Built-in templates plus every `*.json` template in `dir`.
    ///
    /// A directory template whose id matches a built-in replaces it; two
    /// directory templates with the same id are an error.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the directory cannot be read or any template in
    /// it is invalid.
    pub fn with_directory(dir: &Path) -> Result<Self, SchemaError> {
        let mut registry = Self::builtin()?;
        let validator = TemplateValidator::new()?;

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut from_dir = BTreeMap::new();
        for path in paths {
            let json = fs::read_to_string(&path)?;
            let source = path.display().to_string();
            let def = validator.parse(&source, &json)?;
            if from_dir.insert(def.id.clone(), ()).is_some() {
                return Err(SchemaError::Duplicate(def.id));
            }
            if registry.schemas.contains_key(&def.id) {
                tracing::info!(schema_id = %def.id, %source, "template overrides built-in schema");
            }
            registry.schemas.insert(def.id.clone(), Arc::new(def));
        }

        tracing::debug!(count = registry.schema_count(), dir = %dir.display(), "schema registry loaded");
        Ok(registry)
    }

    /// Build a registry from already-deserialized definitions.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Invalid` for inconsistent definitions and
    /// `SchemaError::Duplicate` for repeated ids.
    pub fn from_definitions(
        defs: impl IntoIterator<Item = SchemaDefinition>,
    ) -> Result<Self, SchemaError> {
        let mut registry = Self::default();
        for def in defs {
            check_definition(&def)?;
            registry.insert_unique(def)?;
        }
        Ok(registry)
    }

    fn insert_unique(&mut self, def: SchemaDefinition) -> Result<(), SchemaError> {
        if self.schemas.contains_key(&def.id) {
            return Err(SchemaError::Duplicate(def.id));
        }
        self.schemas.insert(def.id.clone(), Arc::new(def));
        Ok(())
    }

    /// Load a schema by id.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` if the id is unknown.
    pub fn load(&self, id: &str) -> Result<Arc<SchemaDefinition>, SchemaError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(id.to_string()))
    }

    /// Get a schema by id. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<SchemaDefinition>> {
        self.schemas.get(id)
    }

    /// Summaries of every registered schema, sorted by id.
    #[must_use]
    pub fn list(&self) -> Vec<SchemaSummary> {
        self.schemas.values().map(|def| def.summary()).collect()
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}
