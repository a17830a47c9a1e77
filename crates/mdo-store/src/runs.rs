//! Run aggregate persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use mdo_core::entities::{CanonicalEntity, MappingConfig, Run, UploadedFile, ValidationResult};
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Persistence for everything a run owns.
///
/// The orchestrator works exclusively through this trait. Writes for a single
/// run are serialized by the orchestrator's per-run lease, so implementations
/// only need per-call atomicity.
#[async_trait]
pub trait RunStore: Send + Sync {
    // ── Runs ──

    async fn insert_run(&self, run: &Run) -> Result<(), StoreError>;
    async fn get_run(&self, run_id: &str) -> Result<Option<Run>, StoreError>;
    async fn update_run(&self, run: &Run) -> Result<(), StoreError>;
    async fn list_runs(&self, user_id: &str) -> Result<Vec<Run>, StoreError>;

    /// Delete a run and everything it owns. Returns the ids of the uploaded
    /// files that were attached, so callers can drop their bytes.
    async fn delete_run(&self, run_id: &str) -> Result<Vec<String>, StoreError>;

    // ── Uploaded files ──

    async fn insert_file(&self, file: &UploadedFile) -> Result<(), StoreError>;
    async fn get_file(&self, file_id: &str) -> Result<Option<UploadedFile>, StoreError>;

    /// Files of a run in upload order.
    async fn list_files(&self, run_id: &str) -> Result<Vec<UploadedFile>, StoreError>;

    // ── Mappings ──

    async fn save_mapping(&self, mapping: &MappingConfig) -> Result<(), StoreError>;
    async fn get_mapping(&self, mapping_id: &str) -> Result<Option<MappingConfig>, StoreError>;

    /// Remove a mapping that no run references any more. Removing an unknown
    /// id is not an error.
    async fn delete_mapping(&self, mapping_id: &str) -> Result<(), StoreError>;

    // ── Canonical entities ──

    /// Replace the whole entity set of a run.
    async fn replace_entities(
        &self,
        run_id: &str,
        entities: Vec<CanonicalEntity>,
    ) -> Result<(), StoreError>;
    async fn find_entities(&self, run_id: &str) -> Result<Vec<CanonicalEntity>, StoreError>;

    // ── Validation results ──

    /// Store `result` as the run's current validation result, replacing any
    /// earlier one.
    async fn save_validation(&self, result: &ValidationResult) -> Result<(), StoreError>;
    async fn find_validation(&self, run_id: &str) -> Result<Option<ValidationResult>, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    runs: HashMap<String, Run>,
    files: HashMap<String, UploadedFile>,
    mappings: HashMap<String, MappingConfig>,
    entities: HashMap<String, Vec<CanonicalEntity>>,
    validations: HashMap<String, ValidationResult>,
}

/// In-memory [`RunStore`] behind a `tokio` read-write lock.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    tables: RwLock<Tables>,
}

impl MemoryRunStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn insert_run(&self, run: &Run) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.runs.contains_key(&run.id) {
            return Err(StoreError::conflict("run", &run.id));
        }
        tables.runs.insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> Result<Option<Run>, StoreError> {
        Ok(self.tables.read().await.runs.get(run_id).cloned())
    }

    async fn update_run(&self, run: &Run) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .runs
            .get_mut(&run.id)
            .ok_or_else(|| StoreError::not_found("run", &run.id))?;
        *slot = run.clone();
        Ok(())
    }

    async fn list_runs(&self, user_id: &str) -> Result<Vec<Run>, StoreError> {
        let tables = self.tables.read().await;
        let mut runs: Vec<Run> = tables
            .runs
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(runs)
    }

    async fn delete_run(&self, run_id: &str) -> Result<Vec<String>, StoreError> {
        let mut tables = self.tables.write().await;
        let run = tables
            .runs
            .remove(run_id)
            .ok_or_else(|| StoreError::not_found("run", run_id))?;
        for file_id in &run.files {
            tables.files.remove(file_id);
        }
        if let Some(mapping_id) = &run.mapping_id {
            tables.mappings.remove(mapping_id);
        }
        tables.entities.remove(run_id);
        tables.validations.remove(run_id);
        tracing::debug!(run_id, files = run.files.len(), "run deleted");
        Ok(run.files)
    }

    async fn insert_file(&self, file: &UploadedFile) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.runs.contains_key(&file.run_id) {
            return Err(StoreError::not_found("run", &file.run_id));
        }
        if tables.files.contains_key(&file.id) {
            return Err(StoreError::conflict("file", &file.id));
        }
        tables.files.insert(file.id.clone(), file.clone());
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<Option<UploadedFile>, StoreError> {
        Ok(self.tables.read().await.files.get(file_id).cloned())
    }

    async fn list_files(&self, run_id: &str) -> Result<Vec<UploadedFile>, StoreError> {
        let tables = self.tables.read().await;
        let run = tables
            .runs
            .get(run_id)
            .ok_or_else(|| StoreError::not_found("run", run_id))?;
        run.files
            .iter()
            .map(|id| {
                tables
                    .files
                    .get(id)
                    .cloned()
                    .ok_or_else(|| StoreError::not_found("file", id))
            })
            .collect()
    }

    async fn save_mapping(&self, mapping: &MappingConfig) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .mappings
            .insert(mapping.id.clone(), mapping.clone());
        Ok(())
    }

    async fn get_mapping(&self, mapping_id: &str) -> Result<Option<MappingConfig>, StoreError> {
        Ok(self.tables.read().await.mappings.get(mapping_id).cloned())
    }

    async fn delete_mapping(&self, mapping_id: &str) -> Result<(), StoreError> {
        self.tables.write().await.mappings.remove(mapping_id);
        Ok(())
    }

    async fn replace_entities(
        &self,
        run_id: &str,
        entities: Vec<CanonicalEntity>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.runs.contains_key(run_id) {
            return Err(StoreError::not_found("run", run_id));
        }
        tables.entities.insert(run_id.to_string(), entities);
        Ok(())
    }

    async fn find_entities(&self, run_id: &str) -> Result<Vec<CanonicalEntity>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .entities
            .get(run_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_validation(&self, result: &ValidationResult) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.runs.contains_key(&result.run_id) {
            return Err(StoreError::not_found("run", &result.run_id));
        }
        tables
            .validations
            .insert(result.run_id.clone(), result.clone());
        Ok(())
    }

    async fn find_validation(&self, run_id: &str) -> Result<Option<ValidationResult>, StoreError> {
        Ok(self.tables.read().await.validations.get(run_id).cloned())
    }
}
