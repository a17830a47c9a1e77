use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::RecordRef;
use crate::enums::EntityKind;
use crate::value::FieldValue;

/// A harmonized, schema-conformant entity. Unique per `(entity, identity)`
/// within a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CanonicalEntity {
    pub entity: EntityKind,
    /// Stable identity derived from the identity-key fields.
    pub identity: String,
    pub fields: BTreeMap<String, Option<FieldValue>>,
    /// Resolved identity of the parent entity, `None` when unresolved or when
    /// the entity type has no parent.
    pub parent: Option<String>,
    /// Parent key exactly as declared by the winning record, kept even when
    /// it failed to resolve so relationship validation can report it.
    pub parent_key: Option<String>,
    /// Records merged into this entity, in merge order. The last one won.
    pub sources: Vec<RecordRef>,
}

impl CanonicalEntity {
    /// The record that first introduced this identity.
    #[must_use]
    pub fn origin(&self) -> Option<&RecordRef> {
        self.sources.first()
    }

    #[must_use]
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).and_then(Option::as_ref)
    }
}
