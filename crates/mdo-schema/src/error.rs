//! Schema registry error types.

use thiserror::Error;

/// Errors from the schema registry.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Requested schema id was not found in the registry.
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// Template JSON did not pass structural validation.
    #[error("Template '{source_name}' failed validation: {errors:?}")]
    ValidationFailed {
        source_name: String,
        /// Individual error messages from the validator.
        errors: Vec<String>,
    },

    /// Template is well-formed but internally inconsistent.
    #[error("Schema '{schema_id}' is invalid: {errors:?}")]
    Invalid {
        schema_id: String,
        errors: Vec<String>,
    },

    /// Two templates in one load declared the same id.
    #[error("Duplicate schema id '{0}'")]
    Duplicate(String),

    /// Schema generation or compilation error.
    #[error("Schema generation error: {0}")]
    Generation(String),

    #[error("Template parse error in '{source_name}': {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("io error reading templates: {0}")]
    Io(#[from] std::io::Error),
}
