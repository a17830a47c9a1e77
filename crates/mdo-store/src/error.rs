//! Store error types for mdo-store.

use thiserror::Error;

/// Errors from run persistence and file storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lookup by id returned nothing where something was required.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// An insert collided with an existing id.
    #[error("{entity_type} already exists: {id}")]
    Conflict { entity_type: String, id: String },

    /// Uploaded bytes are not a usable table (no header, duplicate columns).
    #[error("Malformed file {file_id}: {message}")]
    Malformed { file_id: String, message: String },

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity_type: &str, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn conflict(entity_type: &str, id: &str) -> Self {
        Self::Conflict {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }
}
