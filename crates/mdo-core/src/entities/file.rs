use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata for one uploaded tabular file. The rows live in the file store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
    pub run_id: String,
    pub filename: String,
    /// Location inside the file store (a path for directory-backed stores).
    pub storage_path: String,
    pub schema_template_id: String,
    /// Header columns in file order.
    pub columns: Vec<String>,
    pub row_count: usize,
    pub created_at: DateTime<Utc>,
}
