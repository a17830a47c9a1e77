//! Entity Harmonizer: turns mapped records into the canonical entity graph.
//!
//! Entity types are processed strictly in hierarchy order so a child can only
//! resolve against parents that are already complete. Within a type the
//! entities live in a flat arena indexed by identity string; records with the
//! same identity merge into one entity, last write wins.

use std::collections::{BTreeMap, HashMap, HashSet};

use mdo_core::entities::{CanonicalEntity, ValidationFinding};
use mdo_core::enums::{EntityKind, Severity};
use mdo_core::schema::SchemaDefinition;
use mdo_core::value::FieldValue;
use serde::Serialize;

use crate::cancel::{CancelToken, Cancelled};
use crate::mapper::MappedSet;
use crate::rule_ids;

/// Separator between identity-key components.
pub const KEY_SEPARATOR: &str = ":";

/// Per-type harmonization counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    /// Mapped records consumed.
    pub records: usize,
    /// Distinct entities produced.
    pub entities: usize,
    /// Records merged into an entity that already existed.
    pub merged: usize,
    /// Records dropped for lack of a complete identity key.
    pub skipped: usize,
    /// Entities whose parent reference did not resolve.
    pub unresolved_parents: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarmonizeSummary {
    pub kinds: BTreeMap<EntityKind, KindSummary>,
    /// Prior entities whose identity no longer exists.
    pub superseded: usize,
    /// New entities whose identity already existed before.
    pub retained: usize,
}

impl HarmonizeSummary {
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.kinds.values().map(|k| k.entities).sum()
    }
}

/// The canonical entity set of a run, sorted by (hierarchy level, identity).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarmonizedSet {
    pub entities: Vec<CanonicalEntity>,
    pub summary: HarmonizeSummary,
}

/// Join the identity-key values of `fields`, or `None` if any is absent.
#[must_use]
pub fn identity_of(fields: &BTreeMap<String, Option<FieldValue>>, key: &[String]) -> Option<String> {
    let parts: Option<Vec<String>> = key
        .iter()
        .map(|k| fields.get(k).and_then(Option::as_ref).map(FieldValue::key_text))
        .collect();
    parts.map(|p| p.join(KEY_SEPARATOR))
}

/// Build the canonical entity set from one run's mapped records.
///
/// `prior` is the previously committed set; it only feeds the summary, the
/// returned set fully replaces it.
///
/// # Errors
///
/// Returns `Cancelled` if `cancel` fires between entity-type batches.
pub fn harmonize(
    schema: &SchemaDefinition,
    mapped: &MappedSet,
    prior: &[CanonicalEntity],
    cancel: &CancelToken,
) -> Result<HarmonizedSet, Cancelled> {
    let mut entities = Vec::new();
    let mut summary = HarmonizeSummary::default();
    let mut resolved: HashMap<EntityKind, HashSet<String>> = HashMap::new();

    for entity_schema in schema.entities_in_hierarchy_order() {
        cancel.check()?;
        let kind = entity_schema.entity;
        let records = mapped.records_of(kind);
        let mut stats = KindSummary {
            records: records.len(),
            ..KindSummary::default()
        };
        let mut arena: Vec<CanonicalEntity> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            let Some(identity) = identity_of(&record.fields, &entity_schema.identity_key) else {
                stats.skipped += 1;
                continue;
            };
            let parent_key = entity_schema
                .parent
                .as_ref()
                .and_then(|p| identity_of(&record.fields, &p.fields));
            let parent = entity_schema.parent.as_ref().and_then(|p| {
                parent_key
                    .as_ref()
                    .filter(|key| resolved.get(&p.entity).is_some_and(|ids| ids.contains(*key)))
                    .cloned()
            });

            if let Some(&slot) = index.get(&identity) {
                let existing = &mut arena[slot];
                existing.fields.clone_from(&record.fields);
                existing.parent_key = parent_key;
                existing.parent = parent;
                existing.sources.push(record.source.clone());
                stats.merged += 1;
            } else {
                index.insert(identity.clone(), arena.len());
                arena.push(CanonicalEntity {
                    entity: kind,
                    identity,
                    fields: record.fields.clone(),
                    parent,
                    parent_key,
                    sources: vec![record.source.clone()],
                });
            }
        }

        arena.sort_by(|a, b| a.identity.cmp(&b.identity));
        stats.entities = arena.len();
        if entity_schema.parent.is_some() {
            stats.unresolved_parents = arena.iter().filter(|e| e.parent.is_none()).count();
        }
        tracing::debug!(
            entity = %kind,
            records = stats.records,
            entities = stats.entities,
            merged = stats.merged,
            skipped = stats.skipped,
            "harmonized entity batch"
        );

        resolved.insert(kind, arena.iter().map(|e| e.identity.clone()).collect());
        summary.kinds.insert(kind, stats);
        entities.extend(arena);
    }

    let before: HashSet<(EntityKind, &str)> = prior
        .iter()
        .map(|e| (e.entity, e.identity.as_str()))
        .collect();
    summary.retained = entities
        .iter()
        .filter(|e| before.contains(&(e.entity, e.identity.as_str())))
        .count();
    summary.superseded = before.len().saturating_sub(summary.retained);

    Ok(HarmonizedSet { entities, summary })
}

/// Info `identity_merged` audit findings, one per merged record.
#[must_use]
pub fn merge_findings(
    schema: &SchemaDefinition,
    entities: &[CanonicalEntity],
) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for entity in entities {
        let Some((origin, merged)) = entity.sources.split_first() else {
            continue;
        };
        let column = schema
            .entity(entity.entity)
            .and_then(|s| s.identity_key.first())
            .map_or("", String::as_str);
        for source in merged {
            findings.push(
                ValidationFinding::new(
                    &source.file_id,
                    source.row_index,
                    column,
                    Severity::Info,
                    rule_ids::IDENTITY_MERGED,
                    format!(
                        "{} '{}' merged with the record at {} row {}; later values win",
                        entity.entity, entity.identity, origin.file_id, origin.row_index
                    ),
                )
                .with_value(entity.identity.clone()),
            );
        }
    }
    crate::rules::finalize(findings)
}
