//! Rule Engine.
//!
//! Rules are data. A [`RuleSet`] is compiled once per schema and dispatched by
//! one evaluator per level:
//!
//! | level        | input                          | rules                                   |
//! |--------------|--------------------------------|-----------------------------------------|
//! | field        | each mapped record             | `pattern`, enum membership              |
//! | row          | each mapped record             | template `row_rules` predicates         |
//! | table        | records or canonical entities  | template `unique` rules, per `scope`    |
//! | relationship | canonical entities             | parent references (`parent_unresolved`) |
//!
//! Field and row levels run per record on the rayon pool. Each level's
//! findings are sorted by location before the levels are concatenated, so the
//! result does not depend on scheduling.

mod field;
mod message;
mod relationship;
mod row;
mod table;

pub use field::{FieldCheck, FieldRule};

use std::collections::BTreeMap;

use mdo_core::entities::{CanonicalEntity, MappedRecord, ValidationFinding};
use mdo_core::enums::{EntityKind, FieldType};
use mdo_core::errors::CoreError;
use mdo_core::schema::{ParentRef, RowRuleDef, SchemaDefinition, UniqueRuleDef, UniqueScope};
use rayon::prelude::*;
use regex::Regex;

use crate::error::PipelineError;
use crate::mapper::MappedSet;
use table::Occurrence;

#[derive(Debug, Clone)]
struct EntityRules {
    kind: EntityKind,
    fields: Vec<FieldRule>,
    rows: Vec<RowRuleDef>,
    unique: Vec<UniqueRuleDef>,
}

/// Compiled rules of one schema.
#[derive(Debug, Clone)]
pub struct RuleSet {
    entities: Vec<EntityRules>,
    parents: BTreeMap<EntityKind, ParentRef>,
    parallel: bool,
}

/// Findings per rule level, each sorted by location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelFindings {
    pub field: Vec<ValidationFinding>,
    pub row: Vec<ValidationFinding>,
    pub table: Vec<ValidationFinding>,
    pub relationship: Vec<ValidationFinding>,
}

impl LevelFindings {
    /// Concatenate in evaluation order: field, row, table, relationship.
    #[must_use]
    pub fn into_ordered(self) -> Vec<ValidationFinding> {
        let mut all = self.field;
        all.extend(self.row);
        all.extend(self.table);
        all.extend(self.relationship);
        all
    }
}

/// Sort by location and drop exact duplicates (one cell can feed several
/// entity types through a shared field name).
pub(crate) fn finalize(mut findings: Vec<ValidationFinding>) -> Vec<ValidationFinding> {
    findings.sort_by(|a, b| {
        a.location_cmp(b)
            .then_with(|| a.description.cmp(&b.description))
    });
    findings.dedup();
    findings
}

impl RuleSet {
    /// Compile every rule the schema declares or implies.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Core` if a field pattern does not compile.
    pub fn compile(schema: &SchemaDefinition) -> Result<Self, PipelineError> {
        let mut entities = Vec::new();
        let mut parents = BTreeMap::new();

        for entity in schema.entities_in_hierarchy_order() {
            let mut fields = Vec::new();
            for field in &entity.fields {
                if let Some(pattern) = &field.pattern {
                    let regex = Regex::new(pattern).map_err(|e| {
                        CoreError::Validation(format!(
                            "{}: pattern for '{}' does not compile: {e}",
                            entity.entity, field.name
                        ))
                    })?;
                    fields.push(FieldRule {
                        field: field.name.clone(),
                        check: FieldCheck::Pattern(regex),
                    });
                }
                if field.field_type == FieldType::Enum {
                    fields.push(FieldRule {
                        field: field.name.clone(),
                        check: FieldCheck::Membership(field.allowed_values.clone()),
                    });
                }
            }
            if let Some(parent) = &entity.parent {
                parents.insert(entity.entity, parent.clone());
            }
            entities.push(EntityRules {
                kind: entity.entity,
                fields,
                rows: entity.row_rules.clone(),
                unique: entity.unique.clone(),
            });
        }

        Ok(Self {
            entities,
            parents,
            parallel: true,
        })
    }

    /// Toggle rayon evaluation of the field and row levels.
    #[must_use]
    pub const fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of compiled rules across all levels.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.entities
            .iter()
            .map(|e| e.fields.len() + e.rows.len() + e.unique.len())
            .sum::<usize>()
            + self.parents.len()
    }

    /// Evaluate all levels over the mapped records and the entity graph.
    #[must_use]
    pub fn evaluate(&self, mapped: &MappedSet, entities: &[CanonicalEntity]) -> LevelFindings {
        let mut levels = LevelFindings::default();

        for rules in &self.entities {
            let records = mapped.records_of(rules.kind);
            if !rules.fields.is_empty() {
                levels
                    .field
                    .extend(self.per_record(records, |r| field::evaluate(&rules.fields, r)));
            }
            if !rules.rows.is_empty() {
                levels.row.extend(
                    self.per_record(records, |r| row::evaluate(rules.kind, &rules.rows, r)),
                );
            }
            for rule in &rules.unique {
                let findings = match rule.scope {
                    UniqueScope::Records => table::evaluate(
                        rules.kind,
                        rule,
                        records.iter().map(|r| Occurrence {
                            location: &r.source,
                            fields: &r.fields,
                        }),
                    ),
                    UniqueScope::Entities => table::evaluate(
                        rules.kind,
                        rule,
                        entities
                            .iter()
                            .filter(|e| e.entity == rules.kind)
                            .filter_map(|e| {
                                e.origin().map(|location| Occurrence {
                                    location,
                                    fields: &e.fields,
                                })
                            }),
                    ),
                };
                levels.table.extend(findings);
            }
        }
        levels.relationship = relationship::evaluate(&self.parents, entities);

        levels.field = finalize(levels.field);
        levels.row = finalize(levels.row);
        levels.table = finalize(levels.table);
        levels.relationship = finalize(levels.relationship);
        tracing::debug!(
            field = levels.field.len(),
            row = levels.row.len(),
            table = levels.table.len(),
            relationship = levels.relationship.len(),
            "rules evaluated"
        );
        levels
    }

    fn per_record<F>(&self, records: &[MappedRecord], check: F) -> Vec<ValidationFinding>
    where
        F: Fn(&MappedRecord) -> Vec<ValidationFinding> + Send + Sync,
    {
        if self.parallel {
            records.par_iter().flat_map_iter(check).collect()
        } else {
            records.iter().flat_map(check).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdo_core::entities::RecordRef;
    use mdo_core::enums::Severity;
    use mdo_core::schema::{EntitySchema, FieldDef, RowPredicate};
    use mdo_core::value::FieldValue;
    use pretty_assertions::assert_eq;

    fn field(name: &str, ty: FieldType, allowed: &[&str], pattern: Option<&str>) -> FieldDef {
        FieldDef {
            name: name.into(),
            field_type: ty,
            required: false,
            allowed_values: allowed.iter().map(|a| (*a).to_string()).collect(),
            pattern: pattern.map(str::to_string),
            description: String::new(),
        }
    }

    fn schema() -> SchemaDefinition {
        SchemaDefinition {
            id: "t".into(),
            name: "T".into(),
            version: "1".into(),
            description: String::new(),
            vendor: None,
            ruleset_version: "1".into(),
            entities: vec![EntitySchema {
                entity: EntityKind::Block,
                fields: vec![
                    field("block_id", FieldType::String, &[], Some("^B\\d+$")),
                    field("tissue", FieldType::Enum, &["OCT", "FFPE"], None),
                    field("cut", FieldType::Number, &[], None),
                    field("max_cut", FieldType::Number, &[], None),
                ],
                identity_key: vec!["block_id".into()],
                parent: None,
                row_rules: vec![RowRuleDef {
                    id: "cut_within_max".into(),
                    predicate: RowPredicate::NotGreaterThan {
                        field: "cut".into(),
                        other: "max_cut".into(),
                    },
                    severity: Severity::Warning,
                    message: "{field} exceeds {other}".into(),
                }],
                unique: vec![UniqueRuleDef {
                    id: "tissue_rows".into(),
                    fields: vec!["tissue".into()],
                    scope: UniqueScope::Records,
                    severity: Severity::Info,
                    message: "{key} repeated".into(),
                }],
            }],
        }
    }

    fn record(row: usize, fields: &[(&str, FieldValue)]) -> MappedRecord {
        MappedRecord {
            entity: EntityKind::Block,
            source: RecordRef {
                file_id: "fil-1".into(),
                row_index: row,
            },
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), Some(v.clone())))
                .collect(),
        }
    }

    fn mapped(records: Vec<MappedRecord>) -> MappedSet {
        MappedSet {
            records: [(EntityKind::Block, records)].into_iter().collect(),
            findings: vec![],
        }
    }

    fn sample() -> MappedSet {
        mapped(vec![
            record(
                2,
                &[
                    ("block_id", FieldValue::String("X2".into())),
                    ("tissue", FieldValue::Enum("OCT".into())),
                ],
            ),
            record(
                0,
                &[
                    ("block_id", FieldValue::String("B0".into())),
                    ("tissue", FieldValue::Enum("oct".into())),
                    ("cut", FieldValue::Number(5.0)),
                    ("max_cut", FieldValue::Number(4.0)),
                ],
            ),
            record(1, &[("tissue", FieldValue::Enum("OCT".into()))]),
        ])
    }

    #[test]
    fn compile_counts_rules() {
        let rules = RuleSet::compile(&schema()).unwrap();
        // pattern + membership + row + unique
        assert_eq!(rules.rule_count(), 4);
    }

    #[test]
    fn levels_are_sorted_and_ordered() {
        let rules = RuleSet::compile(&schema()).unwrap();
        let levels = rules.evaluate(&sample(), &[]);

        let field: Vec<(usize, &str)> = levels
            .field
            .iter()
            .map(|f| (f.row_index, f.rule_id.as_str()))
            .collect();
        assert_eq!(
            field,
            vec![(0, "enum_case_mismatch"), (2, "pattern_mismatch")]
        );
        assert_eq!(levels.row.len(), 1);
        assert_eq!(levels.row[0].column_name, "cut");
        // "oct" is its own key; row 2 holds "OCT" first in run order, row 1 repeats it.
        assert_eq!(levels.table.len(), 1);
        assert_eq!(levels.table[0].row_index, 1);
        assert!(levels.relationship.is_empty());

        let ordered = levels.into_ordered();
        let ids: Vec<&str> = ordered.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["enum_case_mismatch", "pattern_mismatch", "cut_within_max", "tissue_rows"]
        );
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let parallel = RuleSet::compile(&schema()).unwrap();
        let sequential = parallel.clone().with_parallelism(false);
        assert_eq!(
            parallel.evaluate(&sample(), &[]),
            sequential.evaluate(&sample(), &[])
        );
    }
}
