//! Relationship-level evaluation: every child must reference an existing
//! parent of the preceding hierarchy level.

use std::collections::{BTreeMap, BTreeSet};

use mdo_core::entities::{CanonicalEntity, ValidationFinding};
use mdo_core::enums::{EntityKind, Severity};
use mdo_core::schema::ParentRef;

use crate::rule_ids;

/// One `parent_unresolved` Blocker per child whose declared parent key is
/// absent or names no parent entity.
pub(crate) fn evaluate(
    parents: &BTreeMap<EntityKind, ParentRef>,
    entities: &[CanonicalEntity],
) -> Vec<ValidationFinding> {
    let mut identities: BTreeMap<EntityKind, BTreeSet<&str>> = BTreeMap::new();
    for entity in entities {
        identities
            .entry(entity.entity)
            .or_default()
            .insert(entity.identity.as_str());
    }

    let mut findings = Vec::new();
    for entity in entities {
        let Some(parent) = parents.get(&entity.entity) else {
            continue;
        };
        let resolved = entity.parent_key.as_deref().is_some_and(|key| {
            identities
                .get(&parent.entity)
                .is_some_and(|known| known.contains(key))
        });
        if resolved {
            continue;
        }
        // The winning record declared the parent key.
        let Some(location) = entity.sources.last() else {
            continue;
        };
        let column = parent.fields.first().map_or("", String::as_str);
        let finding = match &entity.parent_key {
            Some(key) => ValidationFinding::new(
                &location.file_id,
                location.row_index,
                column,
                Severity::Blocker,
                rule_ids::PARENT_UNRESOLVED,
                format!(
                    "{} '{key}' referenced by {} '{}' does not exist",
                    parent.entity, entity.entity, entity.identity
                ),
            )
            .with_value(key.clone()),
            None => ValidationFinding::new(
                &location.file_id,
                location.row_index,
                column,
                Severity::Blocker,
                rule_ids::PARENT_UNRESOLVED,
                format!(
                    "{} '{}' has no {} reference",
                    entity.entity, entity.identity, parent.entity
                ),
            ),
        };
        findings.push(finding);
    }
    findings
}
