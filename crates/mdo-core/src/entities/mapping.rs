use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A user-declared association from canonical fields to source columns.
///
/// Immutable once a harmonization attempt has started on the run it is
/// attached to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MappingConfig {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub schema_template_id: String,
    /// Canonical field name → source column name.
    pub mapping: BTreeMap<String, String>,
    /// Permit several canonical fields to read the same source column.
    #[serde(default)]
    pub allow_shared_columns: bool,
    pub created_at: DateTime<Utc>,
}

impl MappingConfig {
    /// Source column mapped to `field`, if any.
    #[must_use]
    pub fn source_column(&self, field: &str) -> Option<&str> {
        self.mapping.get(field).map(String::as_str)
    }

    /// Source columns claimed by more than one canonical field, with the
    /// fields that claim them.
    #[must_use]
    pub fn shared_columns(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut by_column: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (field, column) in &self.mapping {
            by_column
                .entry(column.as_str())
                .or_default()
                .push(field.as_str());
        }
        by_column.retain(|_, fields| fields.len() > 1);
        by_column
    }
}
