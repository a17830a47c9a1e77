//! Cross-cutting error types.
//!
//! Domain-specific errors (`SchemaError`, `StoreError`, `PipelineError`) are
//! defined in their respective crates. The CLI converges them through `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any MDO crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The OS random source could not produce bytes for an ID.
    #[error("ID generation failed: {0}")]
    IdGeneration(String),
}
