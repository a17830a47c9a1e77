use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::RunStatus;
use crate::errors::CoreError;

/// A harmonization run: the root aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub status: RunStatus,
    /// Uploaded file IDs in upload order. Harmonization reads them in this order.
    pub files: Vec<String>,
    pub mapping_id: Option<String>,
    pub validation_result_id: Option<String>,
}

impl Run {
    /// A fresh run in the `uploading` state.
    #[must_use]
    pub const fn new(id: String, user_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            created_at,
            status: RunStatus::Uploading,
            files: Vec::new(),
            mapping_id: None,
            validation_result_id: None,
        }
    }

    /// Move to `next`, enforcing the run state machine.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if `next` is not reachable from
    /// the current status.
    pub fn transition(&mut self, next: RunStatus) -> Result<RunStatus, CoreError> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                entity_type: "run".to_string(),
                id: self.id.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        let previous = self.status;
        self.status = next;
        Ok(previous)
    }
}
