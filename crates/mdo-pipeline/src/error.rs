//! Pipeline error types for mdo-pipeline.
//!
//! Recoverable data problems never surface here: they become
//! [`mdo_core::entities::ValidationFinding`]s. A `PipelineError` either rejects
//! a request outright (run untouched) or reports a fatal stage abort, after
//! which the run is `failed_fatal`.

use mdo_core::enums::RunStatus;
use mdo_core::errors::CoreError;
use mdo_schema::SchemaError;
use mdo_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The schema template id is not registered.
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    /// The run id is unknown.
    #[error("Run not found: {0}")]
    RunNotFound(String),

    /// The mapping does not fit the schema or the uploaded files.
    #[error("Invalid mapping: {}", .problems.join("; "))]
    MappingInvalid { problems: Vec<String> },

    /// Another harmonization or validation holds the run's lease.
    #[error("Run {run_id} is already being processed by another request")]
    ConcurrentHarmonizationConflict { run_id: String },

    /// A required collaborator (file, mapping, persistence) is unreachable.
    #[error("Fatal I/O on run {run_id}: {message}")]
    FatalIo { run_id: String, message: String },

    /// The run state machine does not allow the requested step.
    #[error("Invalid transition for run {run_id}: {from} -> {to}")]
    InvalidTransition {
        run_id: String,
        from: String,
        to: String,
    },

    /// The operation is not available in the run's current state.
    #[error("Run {run_id} is {status}; cannot {operation}")]
    WrongState {
        run_id: String,
        status: RunStatus,
        operation: &'static str,
    },

    /// Harmonization was cancelled; nothing was committed.
    #[error("Harmonization of run {0} was cancelled")]
    Cancelled(String),

    /// Upload payload exceeds the configured limit.
    #[error("Upload of {size} bytes exceeds the limit of {limit} bytes")]
    UploadTooLarge { size: u64, limit: u64 },

    /// Upload payload is not a readable table.
    #[error("Upload {filename} rejected: {message}")]
    InvalidUpload { filename: String, message: String },

    /// A file attached to the run has no data rows.
    #[error("File {filename} has no data rows")]
    EmptyFile { filename: String },

    /// The run has no uploaded files.
    #[error("Run {0} has no uploaded files")]
    NoFiles(String),

    /// The run has no validation result to export yet.
    #[error("Run {0} has not been validated")]
    NotValidated(String),

    /// Export bundle could not be assembled or written.
    #[error("Export failed: {0}")]
    Export(String),

    /// Persistence failure outside a harmonization stage.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(CoreError),
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransition { id, from, to, .. } => Self::InvalidTransition {
                run_id: id,
                from,
                to,
            },
            other => Self::Core(other),
        }
    }
}

impl From<SchemaError> for PipelineError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::NotFound(id) => Self::SchemaNotFound(id),
            other => Self::Core(CoreError::Validation(other.to_string())),
        }
    }
}

impl PipelineError {
    /// Whether this error aborts a stage and moves the run to `failed_fatal`.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FatalIo { .. } | Self::SchemaNotFound(_) | Self::Store(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_are_io_schema_and_store() {
        let io = PipelineError::FatalIo {
            run_id: "run-1".into(),
            message: "gone".into(),
        };
        let store = PipelineError::Store(StoreError::NotFound {
            entity_type: "file".into(),
            id: "fil-1".into(),
        });
        assert!(io.is_fatal());
        assert!(store.is_fatal());
        assert!(PipelineError::SchemaNotFound("x".into()).is_fatal());

        let conflict = PipelineError::ConcurrentHarmonizationConflict {
            run_id: "run-1".into(),
        };
        assert!(!conflict.is_fatal());
        assert!(!PipelineError::Cancelled("run-1".into()).is_fatal());
    }

    #[test]
    fn unknown_schema_keeps_its_id() {
        let err: PipelineError = SchemaError::NotFound("visium-v1.5".into()).into();
        assert!(matches!(err, PipelineError::SchemaNotFound(ref id) if id == "visium-v1.5"));
    }
}
