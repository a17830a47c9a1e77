//! Pipeline Orchestrator: sequences mapping, harmonization, and validation per
//! run and drives the run state machine.
//!
//! ```text
//! uploading → mapped → harmonizing → harmonized → validating → validated_{passed,failed}
//!                                                                  │
//!            any state ───────────────────────────────────────► failed_fatal
//! ```
//!
//! Every mutating operation holds the run's lease for its whole duration.
//! CPU-bound stages run on the blocking pool; rule evaluation fans out further
//! onto rayon.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mdo_config::MdoConfig;
use mdo_core::entities::{
    CanonicalEntity, MappingConfig, RawRecord, Run, UploadedFile, ValidationFinding,
    ValidationResult,
};
use mdo_core::enums::RunStatus;
use mdo_core::ids::{PREFIX_FILE, PREFIX_MAPPING, PREFIX_RUN, PREFIX_VALIDATION, generate_id};
use mdo_core::schema::SchemaDefinition;
use mdo_schema::SchemaRegistry;
use mdo_store::{FileStore, MemoryFileStore, MemoryRunStore, RunStore, StoreError};
use serde::{Deserialize, Serialize};

use crate::cancel::{CancelToken, Cancelled};
use crate::error::PipelineError;
use crate::export::{ExportBundle, ExportSource};
use crate::harmonizer::{self, HarmonizeSummary};
use crate::lease::{LeaseGuard, LeaseMap};
use crate::mapper::{self, MappedSet, SourceFile};
use crate::rules::RuleSet;

/// Runtime knobs, usually taken from [`MdoConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_upload_size: u64,
    pub lease_ttl: Duration,
    pub parallel_rules: bool,
}

impl From<&MdoConfig> for PipelineSettings {
    fn from(config: &MdoConfig) -> Self {
        Self {
            max_upload_size: config.upload.max_upload_size,
            lease_ttl: config.pipeline.lease_ttl(),
            parallel_rules: config.pipeline.parallel_rules,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&MdoConfig::default())
    }
}

/// A mapping as submitted by a user, before it is attached to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMapping {
    pub name: String,
    pub schema_template_id: String,
    /// Canonical field -> source column.
    pub mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub allow_shared_columns: bool,
}

/// Outcome of a full harmonize-then-validate pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonizeReport {
    pub run: Run,
    pub summary: HarmonizeSummary,
    pub validation: ValidationResult,
}

/// Everything a stage needs, loaded up front so the CPU work owns its data.
struct RunInputs {
    schema: Arc<SchemaDefinition>,
    mapping: MappingConfig,
    files: Vec<LoadedFile>,
}

struct LoadedFile {
    file: UploadedFile,
    rows: Vec<RawRecord>,
}

impl RunInputs {
    fn map(&self, cancel: &CancelToken) -> Result<MappedSet, Cancelled> {
        let sources: Vec<SourceFile<'_>> = self
            .files
            .iter()
            .map(|f| SourceFile {
                file_id: &f.file.id,
                columns: &f.file.columns,
                rows: &f.rows,
            })
            .collect();
        mapper::map_files(&self.schema, &self.mapping, &sources, cancel)
    }

    /// All findings of one validation attempt, in stage order: mapper, field,
    /// row, table, relationship, merge audit.
    fn assess(
        &self,
        mapped: &MappedSet,
        entities: &[CanonicalEntity],
        parallel: bool,
    ) -> Result<Vec<ValidationFinding>, PipelineError> {
        let rules = RuleSet::compile(&self.schema)?.with_parallelism(parallel);
        let mut findings = mapped.findings.clone();
        findings.extend(rules.evaluate(mapped, entities).into_ordered());
        findings.extend(harmonizer::merge_findings(&self.schema, entities));
        Ok(findings)
    }
}

enum StageError {
    Cancelled,
    Failed(PipelineError),
}

impl From<Cancelled> for StageError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<PipelineError> for StageError {
    fn from(err: PipelineError) -> Self {
        Self::Failed(err)
    }
}

fn fatal_io(run_id: &str, message: impl Display) -> PipelineError {
    PipelineError::FatalIo {
        run_id: run_id.to_string(),
        message: message.to_string(),
    }
}

fn read_rows(files: &dyn FileStore, uploaded: Vec<UploadedFile>) -> Result<Vec<LoadedFile>, String> {
    uploaded
        .into_iter()
        .map(|file| {
            let rows = files
                .open(&file.id)
                .and_then(|iter| iter.collect::<Result<Vec<_>, StoreError>>())
                .map_err(|e| format!("file {} ({}): {e}", file.filename, file.id))?;
            Ok(LoadedFile { file, rows })
        })
        .collect()
}

fn mapping_problems(
    schema: &SchemaDefinition,
    mapping: &MappingConfig,
    files: &[UploadedFile],
) -> Vec<String> {
    let mut problems = Vec::new();
    for file in files {
        if file.schema_template_id != mapping.schema_template_id {
            problems.push(format!(
                "file {} was uploaded for schema {}, mapping targets {}",
                file.filename, file.schema_template_id, mapping.schema_template_id
            ));
        }
    }
    for file in files {
        if mapper::applicable_entities(schema, mapping, &file.columns).is_empty() {
            problems.push(format!(
                "no mapped column of file {} describes an entity type",
                file.filename
            ));
        }
    }
    let known = schema.field_names();
    for (field, column) in &mapping.mapping {
        if !known.contains(field.as_str()) {
            problems.push(format!("unknown canonical field '{field}'"));
        }
        if column.trim().is_empty() {
            problems.push(format!("field '{field}' maps to an empty column name"));
        }
    }
    if !mapping.allow_shared_columns {
        for (column, fields) in mapping.shared_columns() {
            problems.push(format!(
                "column '{column}' is mapped by several fields: {}",
                fields.join(", ")
            ));
        }
    }
    problems
}

/// Entry point for every run operation.
pub struct Orchestrator {
    registry: Arc<SchemaRegistry>,
    runs: Arc<dyn RunStore>,
    files: Arc<dyn FileStore>,
    leases: LeaseMap,
    settings: PipelineSettings,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        registry: Arc<SchemaRegistry>,
        runs: Arc<dyn RunStore>,
        files: Arc<dyn FileStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            runs,
            files,
            leases: LeaseMap::new(settings.lease_ttl),
            settings,
        }
    }

    /// Orchestrator over in-memory run and file stores.
    #[must_use]
    pub fn in_memory(registry: SchemaRegistry, settings: PipelineSettings) -> Self {
        Self::new(
            Arc::new(registry),
            Arc::new(MemoryRunStore::new()),
            Arc::new(MemoryFileStore::new()),
            settings,
        )
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Take the lease for `run_id` directly, blocking every stage on that run
    /// until the guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::ConcurrentHarmonizationConflict` if the run is
    /// already leased.
    pub fn lease(&self, run_id: &str) -> Result<LeaseGuard, PipelineError> {
        self.leases.acquire(run_id)
    }

    async fn load_run(&self, run_id: &str) -> Result<Run, PipelineError> {
        self.runs
            .get_run(run_id)
            .await?
            .ok_or_else(|| PipelineError::RunNotFound(run_id.to_string()))
    }

    /// Close a stage attempt that ended in `result`.
    ///
    /// A fatal error moves the run to `failed_fatal`. Any other error steps a
    /// run still parked in a stage status back to `restore`. The run is
    /// reloaded first so a half-applied in-memory copy is never written.
    async fn settle<T>(
        &self,
        run: &mut Run,
        restore: RunStatus,
        result: Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        let Err(err) = &result else {
            return result;
        };
        match self.runs.get_run(&run.id).await {
            Ok(Some(stored)) => *run = stored,
            Ok(None) => return result,
            Err(e) => {
                tracing::error!(run_id = %run.id, error = %e, "could not reload run after failed stage");
                return result;
            }
        }

        let target = if err.is_fatal() {
            RunStatus::FailedFatal
        } else if run.status.is_in_progress() {
            restore
        } else {
            return result;
        };
        match run.transition(target) {
            Ok(from) => {
                if let Err(e) = self.runs.update_run(run).await {
                    tracing::error!(run_id = %run.id, status = %target, error = %e, "could not record run status");
                } else if target == RunStatus::FailedFatal {
                    tracing::warn!(run_id = %run.id, from = %from, error = %err, "run failed");
                } else {
                    tracing::info!(run_id = %run.id, from = %from, restored = %target, error = %err, "stage aborted");
                }
            }
            Err(e) => tracing::error!(run_id = %run.id, error = %e, "could not settle run status"),
        }
        result
    }

    async fn load_inputs(&self, run: &Run) -> Result<RunInputs, PipelineError> {
        let mapping_id = run
            .mapping_id
            .as_deref()
            .ok_or_else(|| fatal_io(&run.id, "no mapping attached"))?;
        let mapping = self
            .runs
            .get_mapping(mapping_id)
            .await
            .map_err(|e| fatal_io(&run.id, e))?
            .ok_or_else(|| fatal_io(&run.id, format!("mapping {mapping_id} is missing")))?;
        let schema = self.registry.load(&mapping.schema_template_id)?;
        let uploaded = self
            .runs
            .list_files(&run.id)
            .await
            .map_err(|e| fatal_io(&run.id, e))?;

        let files = Arc::clone(&self.files);
        let loaded = tokio::task::spawn_blocking(move || read_rows(files.as_ref(), uploaded))
            .await
            .map_err(|e| fatal_io(&run.id, e))?
            .map_err(|e| fatal_io(&run.id, e))?;

        Ok(RunInputs {
            schema,
            mapping,
            files: loaded,
        })
    }

    // ── Runs ──

    /// # Errors
    ///
    /// Returns `PipelineError::Store` if the run cannot be persisted.
    pub async fn create_run(&self, user_id: &str) -> Result<Run, PipelineError> {
        let run = Run::new(generate_id(PREFIX_RUN)?, user_id.to_string(), Utc::now());
        self.runs.insert_run(&run).await?;
        tracing::info!(run_id = %run.id, user_id, "run created");
        Ok(run)
    }

    /// # Errors
    ///
    /// Returns `PipelineError::RunNotFound` for an unknown id.
    pub async fn get_run(&self, run_id: &str) -> Result<Run, PipelineError> {
        self.load_run(run_id).await
    }

    /// Runs owned by `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Store` on persistence failure.
    pub async fn list_runs(&self, user_id: &str) -> Result<Vec<Run>, PipelineError> {
        Ok(self.runs.list_runs(user_id).await?)
    }

    /// Delete a run with everything it owns, including stored file bytes.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::RunNotFound` for an unknown id and
    /// `PipelineError::ConcurrentHarmonizationConflict` while a stage runs.
    pub async fn delete_run(&self, run_id: &str) -> Result<(), PipelineError> {
        let _lease = self.leases.acquire(run_id)?;
        let file_ids = match self.runs.delete_run(run_id).await {
            Err(StoreError::NotFound { .. }) => {
                return Err(PipelineError::RunNotFound(run_id.to_string()));
            }
            other => other?,
        };
        for file_id in &file_ids {
            if let Err(e) = self.files.remove(file_id) {
                tracing::warn!(run_id, file_id = %file_id, error = %e, "could not remove stored file");
            }
        }
        tracing::info!(run_id, files = file_ids.len(), "run deleted");
        Ok(())
    }

    // ── Uploads and mapping ──

    /// Store an uploaded table and attach it to the run.
    ///
    /// # Errors
    ///
    /// Returns `UploadTooLarge`, `SchemaNotFound`, `InvalidUpload` for bytes
    /// that are not a CSV table with a header, and `WrongState` unless the run
    /// is `uploading`.
    pub async fn upload_file(
        &self,
        run_id: &str,
        filename: &str,
        schema_id: &str,
        bytes: &[u8],
    ) -> Result<UploadedFile, PipelineError> {
        let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if size > self.settings.max_upload_size {
            return Err(PipelineError::UploadTooLarge {
                size,
                limit: self.settings.max_upload_size,
            });
        }
        self.registry.load(schema_id)?;

        let _lease = self.leases.acquire(run_id)?;
        let mut run = self.load_run(run_id).await?;
        if run.status != RunStatus::Uploading {
            return Err(PipelineError::WrongState {
                run_id: run.id,
                status: run.status,
                operation: "upload files",
            });
        }

        let file_id = generate_id(PREFIX_FILE)?;
        let stored = self.files.put(&file_id, bytes).map_err(|e| match e {
            StoreError::Malformed { message, .. } => PipelineError::InvalidUpload {
                filename: filename.to_string(),
                message,
            },
            StoreError::Csv(e) => PipelineError::InvalidUpload {
                filename: filename.to_string(),
                message: e.to_string(),
            },
            other => other.into(),
        })?;

        let file = UploadedFile {
            id: file_id,
            run_id: run.id.clone(),
            filename: filename.to_string(),
            storage_path: stored.storage_path,
            schema_template_id: schema_id.to_string(),
            columns: stored.columns,
            row_count: stored.row_count,
            created_at: Utc::now(),
        };
        run.files.push(file.id.clone());
        if let Err(err) = self.record_upload(&run, &file).await {
            if let Err(e) = self.files.remove(&file.id) {
                tracing::error!(run_id, file_id = %file.id, error = %e, "could not remove orphaned upload");
            }
            return Err(err.into());
        }
        tracing::info!(
            run_id,
            file_id = %file.id,
            filename,
            rows = file.row_count,
            columns = file.columns.len(),
            "file uploaded"
        );
        Ok(file)
    }

    async fn record_upload(&self, run: &Run, file: &UploadedFile) -> Result<(), StoreError> {
        self.runs.insert_file(file).await?;
        self.runs.update_run(run).await
    }

    /// Validate `new` against the schema and the uploaded files, attach it,
    /// and move the run to `mapped`. Replaces an earlier mapping.
    ///
    /// # Errors
    ///
    /// Returns `NoFiles`, `EmptyFile`, `SchemaNotFound`, `MappingInvalid`, or
    /// `WrongState` outside `uploading`/`mapped`.
    pub async fn attach_mapping(
        &self,
        run_id: &str,
        new: NewMapping,
    ) -> Result<MappingConfig, PipelineError> {
        let _lease = self.leases.acquire(run_id)?;
        let mut run = self.load_run(run_id).await?;
        if !matches!(run.status, RunStatus::Uploading | RunStatus::Mapped) {
            return Err(PipelineError::WrongState {
                run_id: run.id,
                status: run.status,
                operation: "attach a mapping",
            });
        }

        let files = self.runs.list_files(run_id).await?;
        if files.is_empty() {
            return Err(PipelineError::NoFiles(run.id));
        }
        if let Some(empty) = files.iter().find(|f| f.row_count == 0) {
            return Err(PipelineError::EmptyFile {
                filename: empty.filename.clone(),
            });
        }
        let schema = self.registry.load(&new.schema_template_id)?;

        let mapping = MappingConfig {
            id: generate_id(PREFIX_MAPPING)?,
            user_id: run.user_id.clone(),
            name: new.name,
            schema_template_id: new.schema_template_id,
            mapping: new.mapping,
            allow_shared_columns: new.allow_shared_columns,
            created_at: Utc::now(),
        };
        let problems = mapping_problems(&schema, &mapping, &files);
        if !problems.is_empty() {
            return Err(PipelineError::MappingInvalid { problems });
        }
        for (field, column) in &mapping.mapping {
            if !files.iter().any(|f| f.columns.contains(column)) {
                tracing::warn!(run_id, field = %field, column = %column, "mapped column not present in any file");
            }
        }

        self.runs.save_mapping(&mapping).await?;
        let replaced = run.mapping_id.replace(mapping.id.clone());
        run.transition(RunStatus::Mapped)?;
        self.runs.update_run(&run).await?;
        if let Some(old) = replaced {
            self.runs.delete_mapping(&old).await?;
            tracing::debug!(run_id, mapping_id = %old, "replaced mapping deleted");
        }
        tracing::info!(run_id, mapping_id = %mapping.id, fields = mapping.mapping.len(), "mapping attached");
        Ok(mapping)
    }

    // ── Stages ──

    /// Map, harmonize, and commit the canonical entity set, then validate it.
    ///
    /// Cancellation is honoured between entity-type batches. An attempt that
    /// ends without a result (cancelled, lease lost, any non-fatal error)
    /// restores the run's last completed status; one that ends before the
    /// commit leaves the previous entity set in place.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentHarmonizationConflict` while another stage holds the
    /// run or after the lease was taken over, `InvalidTransition` from a state
    /// that cannot harmonize, `Cancelled`, or a fatal error after moving the
    /// run to `failed_fatal`.
    pub async fn harmonize(
        &self,
        run_id: &str,
        cancel: &CancelToken,
    ) -> Result<HarmonizeReport, PipelineError> {
        let lease = self.leases.acquire(run_id)?;
        let mut run = self.load_run(run_id).await?;
        let previous = run.transition(RunStatus::Harmonizing)?;
        self.runs.update_run(&run).await?;
        tracing::info!(run_id, from = %previous, "harmonization started");

        let mut restore = previous;
        let outcome = self
            .harmonize_attempt(&lease, &mut run, &mut restore, cancel)
            .await;
        self.settle(&mut run, restore, outcome).await
    }

    /// Body of [`Self::harmonize`] once the run is `harmonizing`. `restore`
    /// tracks the last status the attempt fully completed.
    async fn harmonize_attempt(
        &self,
        lease: &LeaseGuard,
        run: &mut Run,
        restore: &mut RunStatus,
        cancel: &CancelToken,
    ) -> Result<HarmonizeReport, PipelineError> {
        let run_id = run.id.clone();
        let inputs = self.load_inputs(run).await?;
        let prior = self
            .runs
            .find_entities(&run_id)
            .await
            .map_err(|e| fatal_io(&run_id, e))?;

        let token = cancel.clone();
        let parallel = self.settings.parallel_rules;
        let staged = tokio::task::spawn_blocking(move || {
            let mapped = inputs.map(&token)?;
            let set = harmonizer::harmonize(&inputs.schema, &mapped, &prior, &token)?;
            let findings = inputs.assess(&mapped, &set.entities, parallel)?;
            Ok::<_, StageError>((set, findings))
        })
        .await
        .map_err(|e| fatal_io(&run_id, e))?;

        let (set, findings) = match staged {
            Ok(done) => done,
            Err(StageError::Cancelled) => return Err(PipelineError::Cancelled(run_id)),
            Err(StageError::Failed(err)) => return Err(err),
        };

        if !lease.is_current() {
            tracing::warn!(run_id = %run_id, "lease lost before commit; discarding harmonized set");
            return Err(PipelineError::ConcurrentHarmonizationConflict { run_id });
        }
        self.runs
            .replace_entities(&run_id, set.entities)
            .await
            .map_err(|e| fatal_io(&run_id, e))?;
        run.transition(RunStatus::Harmonized)?;
        self.runs.update_run(run).await?;
        *restore = RunStatus::Harmonized;
        tracing::info!(
            run_id = %run_id,
            entities = set.summary.entity_count(),
            superseded = set.summary.superseded,
            "harmonization committed"
        );

        run.transition(RunStatus::Validating)?;
        self.runs.update_run(run).await?;
        let validation = self.finish_validation(lease, run, findings).await?;
        Ok(HarmonizeReport {
            run: run.clone(),
            summary: set.summary,
            validation,
        })
    }

    /// Re-run validation over the committed entity set.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentHarmonizationConflict` while another stage holds the
    /// run or after the lease was taken over, `InvalidTransition` unless the
    /// run is harmonized or validated, or a fatal error after moving the run
    /// to `failed_fatal`. Non-fatal failures restore the previous status.
    pub async fn validate(&self, run_id: &str) -> Result<ValidationResult, PipelineError> {
        let lease = self.leases.acquire(run_id)?;
        let mut run = self.load_run(run_id).await?;
        let previous = run.transition(RunStatus::Validating)?;
        self.runs.update_run(&run).await?;
        tracing::info!(run_id, from = %previous, "validation started");

        let outcome = self.validate_attempt(&lease, &mut run).await;
        self.settle(&mut run, previous, outcome).await
    }

    async fn validate_attempt(
        &self,
        lease: &LeaseGuard,
        run: &mut Run,
    ) -> Result<ValidationResult, PipelineError> {
        let run_id = run.id.clone();
        let inputs = self.load_inputs(run).await?;
        let entities = self
            .runs
            .find_entities(&run_id)
            .await
            .map_err(|e| fatal_io(&run_id, e))?;

        let parallel = self.settings.parallel_rules;
        let assessed = tokio::task::spawn_blocking(move || {
            let mapped = inputs.map(&CancelToken::new())?;
            Ok::<_, StageError>(inputs.assess(&mapped, &entities, parallel)?)
        })
        .await
        .map_err(|e| fatal_io(&run_id, e))?;
        let findings = match assessed {
            Ok(findings) => findings,
            Err(StageError::Failed(err)) => return Err(err),
            Err(StageError::Cancelled) => return Err(PipelineError::Cancelled(run_id)),
        };

        self.finish_validation(lease, run, findings).await
    }

    /// Store the result of `findings` and move the `validating` run to its
    /// validated outcome.
    async fn finish_validation(
        &self,
        lease: &LeaseGuard,
        run: &mut Run,
        findings: Vec<ValidationFinding>,
    ) -> Result<ValidationResult, PipelineError> {
        if !lease.is_current() {
            tracing::warn!(run_id = %run.id, "lease lost before recording validation");
            return Err(PipelineError::ConcurrentHarmonizationConflict {
                run_id: run.id.clone(),
            });
        }
        let result = ValidationResult::from_findings(
            generate_id(PREFIX_VALIDATION)?,
            run.id.clone(),
            findings,
            Utc::now(),
        );
        self.runs
            .save_validation(&result)
            .await
            .map_err(|e| fatal_io(&run.id, e))?;

        run.validation_result_id = Some(result.id.clone());
        run.transition(RunStatus::validated(result.status))?;
        self.runs.update_run(run).await?;
        tracing::info!(
            run_id = %run.id,
            status = %result.status,
            blockers = result.blocker_count,
            warnings = result.warning_count,
            infos = result.info_count,
            "validation finished"
        );
        Ok(result)
    }

    // ── Read-only accessors ──

    /// # Errors
    ///
    /// Returns `PipelineError::RunNotFound` for an unknown id.
    pub async fn validation_result(
        &self,
        run_id: &str,
    ) -> Result<Option<ValidationResult>, PipelineError> {
        self.load_run(run_id).await?;
        Ok(self.runs.find_validation(run_id).await?)
    }

    /// Committed canonical entities, sorted by (hierarchy level, identity).
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::RunNotFound` for an unknown id.
    pub async fn entities(&self, run_id: &str) -> Result<Vec<CanonicalEntity>, PipelineError> {
        self.load_run(run_id).await?;
        Ok(self.runs.find_entities(run_id).await?)
    }

    /// # Errors
    ///
    /// Returns `PipelineError::RunNotFound` for an unknown id.
    pub async fn mapping(&self, run_id: &str) -> Result<Option<MappingConfig>, PipelineError> {
        let run = self.load_run(run_id).await?;
        match run.mapping_id {
            Some(id) => Ok(self.runs.get_mapping(&id).await?),
            None => Ok(None),
        }
    }

    /// Uploaded files in upload order.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::RunNotFound` for an unknown id.
    pub async fn files(&self, run_id: &str) -> Result<Vec<UploadedFile>, PipelineError> {
        self.load_run(run_id).await?;
        Ok(self.runs.list_files(run_id).await?)
    }

    /// Assemble the export bundle of a validated run.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NotValidated` if the run has no validation
    /// result, `SchemaNotFound` if its schema was unregistered since.
    pub async fn export(&self, run_id: &str) -> Result<ExportBundle, PipelineError> {
        let run = self.load_run(run_id).await?;
        let validation = self
            .runs
            .find_validation(run_id)
            .await?
            .ok_or_else(|| PipelineError::NotValidated(run_id.to_string()))?;
        let mapping = self
            .mapping(run_id)
            .await?
            .ok_or_else(|| PipelineError::NotValidated(run_id.to_string()))?;
        let schema = self.registry.load(&mapping.schema_template_id)?;
        let entities = self.runs.find_entities(run_id).await?;

        ExportBundle::build(
            ExportSource {
                run: &run,
                schema: &schema,
                mapping: &mapping,
                entities: &entities,
                validation: &validation,
            },
            Utc::now(),
        )
    }
}
