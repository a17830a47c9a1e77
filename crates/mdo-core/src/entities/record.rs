use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EntityKind;
use crate::value::FieldValue;

/// Location of a source row: file ID plus 0-based data row index.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct RecordRef {
    pub file_id: String,
    pub row_index: usize,
}

/// One source row exactly as read. Never mutated after ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RawRecord {
    pub file_id: String,
    pub row_index: usize,
    /// Source column → raw cell text.
    pub values: BTreeMap<String, String>,
}

impl RawRecord {
    #[must_use]
    pub fn record_ref(&self) -> RecordRef {
        RecordRef {
            file_id: self.file_id.clone(),
            row_index: self.row_index,
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// A raw record projected onto one entity type's canonical fields.
///
/// Every field of the entity schema has a key; absent or uncoercible values
/// are `None`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MappedRecord {
    pub entity: EntityKind,
    pub source: RecordRef,
    pub fields: BTreeMap<String, Option<FieldValue>>,
}

impl MappedRecord {
    /// Value of `field`, flattening "absent" and "unknown field" to `None`.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).and_then(Option::as_ref)
    }
}
