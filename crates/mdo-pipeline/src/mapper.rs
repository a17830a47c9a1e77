//! Column Mapper: projects raw rows onto one entity type's canonical fields.
//!
//! Every raw record yields exactly one [`MappedRecord`] per applicable entity
//! type, whatever its cells contain. Problems with individual cells become
//! findings and null values; they never drop the row.

use std::collections::{BTreeMap, BTreeSet};

use mdo_core::entities::{MappedRecord, MappingConfig, RawRecord, ValidationFinding};
use mdo_core::enums::{EntityKind, Severity};
use mdo_core::schema::{EntitySchema, FieldDef, SchemaDefinition};
use mdo_core::value::FieldValue;

use crate::cancel::{CancelToken, Cancelled};
use crate::coerce::coerce;
use crate::rule_ids;

/// Mapped records and the findings raised while producing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapOutput {
    pub records: Vec<MappedRecord>,
    pub findings: Vec<ValidationFinding>,
}

/// One uploaded file ready for mapping.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub file_id: &'a str,
    /// Header columns.
    pub columns: &'a [String],
    pub rows: &'a [RawRecord],
}

/// Mapping-stage output for a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedSet {
    /// Records per entity type in run order (file upload order, then row).
    pub records: BTreeMap<EntityKind, Vec<MappedRecord>>,
    /// Mapper findings, sorted by location and deduplicated.
    pub findings: Vec<ValidationFinding>,
}

impl MappedSet {
    #[must_use]
    pub fn records_of(&self, kind: EntityKind) -> &[MappedRecord] {
        self.records.get(&kind).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

/// Apply `mapping` to `raw` for one entity type.
#[must_use]
pub fn apply(raw: &[RawRecord], mapping: &MappingConfig, schema: &EntitySchema) -> MapOutput {
    let mut out = MapOutput::default();
    for record in raw {
        let fields = schema
            .fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    map_field(record, mapping, field, &mut out.findings),
                )
            })
            .collect();
        out.records.push(MappedRecord {
            entity: schema.entity,
            source: record.record_ref(),
            fields,
        });
    }
    out
}

fn map_field(
    record: &RawRecord,
    mapping: &MappingConfig,
    field: &FieldDef,
    findings: &mut Vec<ValidationFinding>,
) -> Option<FieldValue> {
    let column = mapping.source_column(&field.name);
    let raw = column.and_then(|c| record.get(c));
    let finding = |severity, rule_id: &str, description: String| {
        ValidationFinding::new(
            &record.file_id,
            record.row_index,
            &field.name,
            severity,
            rule_id,
            description,
        )
    };

    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        if field.required {
            let description = if column.is_some() {
                format!("Required field '{}' is empty", field.name)
            } else {
                format!("Required field '{}' is not mapped to a source column", field.name)
            };
            findings.push(finding(
                Severity::Blocker,
                rule_ids::MISSING_REQUIRED_FIELD,
                description,
            ));
        }
        return None;
    };

    let text = raw.trim();
    if text != raw {
        findings.push(
            finding(
                Severity::Warning,
                rule_ids::WHITESPACE_TRIMMED,
                format!("Value of '{}' has leading or trailing whitespace", field.name),
            )
            .with_value(raw)
            .with_suggestion(text),
        );
    }

    if let Some(coerced) = coerce(text, field.field_type) {
        if coerced.reformatted {
            findings.push(
                finding(
                    Severity::Warning,
                    rule_ids::DATE_FORMAT_NORMALIZED,
                    format!("Date '{text}' for '{}' is not ISO-8601", field.name),
                )
                .with_value(text)
                .with_suggestion(coerced.value.key_text()),
            );
        }
        return Some(coerced.value);
    }

    findings.push(
        finding(
            Severity::Warning,
            rule_ids::TYPE_MISMATCH,
            format!(
                "Value '{text}' is not a valid {} for '{}'",
                field.field_type, field.name
            ),
        )
        .with_value(text),
    );
    if field.required {
        findings.push(
            finding(
                Severity::Blocker,
                rule_ids::MISSING_REQUIRED_FIELD,
                format!("Required field '{}' has no usable value", field.name),
            )
            .with_value(text),
        );
    }
    None
}

/// Entity types a file contributes records to, in hierarchy order.
///
/// A field is *descriptive* when no entity uses it to reference a parent. An
/// entity type applies to a file when one of its descriptive fields is mapped
/// to a column of the file. Failing that, it applies when its whole identity
/// key is present, unless every key field only serves as a parent reference of
/// a deeper type that already applies (a slides file carrying `block_id` does
/// not describe blocks).
#[must_use]
pub fn applicable_entities(
    schema: &SchemaDefinition,
    mapping: &MappingConfig,
    header: &[String],
) -> Vec<EntityKind> {
    let present = |field: &str| {
        mapping
            .source_column(field)
            .is_some_and(|column| header.iter().any(|h| h == column))
    };
    let reference_fields: BTreeSet<&str> = schema
        .entities
        .iter()
        .filter_map(|e| e.parent.as_ref())
        .flat_map(|p| p.fields.iter().map(String::as_str))
        .collect();

    let mut applicable: Vec<&EntitySchema> = Vec::new();
    for entity in schema.entities_in_hierarchy_order().into_iter().rev() {
        let descriptive = entity
            .own_fields()
            .filter(|f| !reference_fields.contains(f.name.as_str()))
            .any(|f| present(&f.name));
        let keyed = entity.identity_key.iter().all(|k| present(k))
            && !entity
                .identity_key
                .iter()
                .all(|k| applicable.iter().any(|deeper| deeper.is_parent_field(k)));
        if descriptive || keyed {
            applicable.push(entity);
        }
    }
    applicable.iter().rev().map(|e| e.entity).collect()
}

/// Map every file of a run, one entity type at a time.
///
/// # Errors
///
/// Returns `Cancelled` if `cancel` fires between entity-type batches.
pub fn map_files(
    schema: &SchemaDefinition,
    mapping: &MappingConfig,
    files: &[SourceFile<'_>],
    cancel: &CancelToken,
) -> Result<MappedSet, Cancelled> {
    let applicable: Vec<Vec<EntityKind>> = files
        .iter()
        .map(|f| applicable_entities(schema, mapping, f.columns))
        .collect();

    let mut set = MappedSet::default();
    for entity in schema.entities_in_hierarchy_order() {
        cancel.check()?;
        let mut batch = Vec::new();
        for (file, kinds) in files.iter().zip(&applicable) {
            if !kinds.contains(&entity.entity) {
                continue;
            }
            let out = apply(file.rows, mapping, entity);
            batch.extend(out.records);
            set.findings.extend(out.findings);
        }
        tracing::debug!(entity = %entity.entity, records = batch.len(), "mapped entity batch");
        set.records.insert(entity.entity, batch);
    }

    // The same cell feeds every entity type that shares its field name.
    set.findings.sort_by(|a, b| {
        a.location_cmp(b)
            .then_with(|| a.description.cmp(&b.description))
    });
    set.findings.dedup();
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mdo_core::enums::FieldType;
    use mdo_core::schema::ParentRef;
    use pretty_assertions::assert_eq;

    fn field(name: &str, ty: FieldType, required: bool) -> FieldDef {
        FieldDef {
            name: name.into(),
            field_type: ty,
            required,
            allowed_values: vec![],
            pattern: None,
            description: String::new(),
        }
    }

    fn entity(kind: EntityKind, fields: Vec<FieldDef>, key: &[&str], parent: Option<(EntityKind, &[&str])>) -> EntitySchema {
        EntitySchema {
            entity: kind,
            fields,
            identity_key: key.iter().map(|k| (*k).to_string()).collect(),
            parent: parent.map(|(entity, fields)| ParentRef {
                entity,
                fields: fields.iter().map(|f| (*f).to_string()).collect(),
            }),
            row_rules: vec![],
            unique: vec![],
        }
    }

    fn block() -> EntitySchema {
        entity(
            EntityKind::Block,
            vec![
                field("block_id", FieldType::String, true),
                field("tissue_type", FieldType::Enum, false),
                field("collection_date", FieldType::Date, false),
                field("weight_mg", FieldType::Number, false),
            ],
            &["block_id"],
            None,
        )
    }

    fn slide() -> EntitySchema {
        entity(
            EntityKind::Slide,
            vec![
                field("slide_id", FieldType::String, true),
                field("block_id", FieldType::String, true),
                field("stain", FieldType::String, false),
            ],
            &["slide_id"],
            Some((EntityKind::Block, &["block_id"])),
        )
    }

    fn schema() -> SchemaDefinition {
        SchemaDefinition {
            id: "t".into(),
            name: "T".into(),
            version: "1".into(),
            description: String::new(),
            vendor: None,
            ruleset_version: "1".into(),
            entities: vec![block(), slide()],
        }
    }

    fn mapping(pairs: &[(&str, &str)]) -> MappingConfig {
        MappingConfig {
            id: "map-1".into(),
            user_id: "u".into(),
            name: "m".into(),
            schema_template_id: "t".into(),
            mapping: pairs
                .iter()
                .map(|(f, c)| ((*f).to_string(), (*c).to_string()))
                .collect(),
            allow_shared_columns: false,
            created_at: Utc::now(),
        }
    }

    fn row(idx: usize, cells: &[(&str, &str)]) -> RawRecord {
        RawRecord {
            file_id: "fil-1".into(),
            row_index: idx,
            values: cells
                .iter()
                .map(|(c, v)| ((*c).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    fn rules(findings: &[ValidationFinding]) -> Vec<(&str, &str, Severity)> {
        findings
            .iter()
            .map(|f| (f.column_name.as_str(), f.rule_id.as_str(), f.severity))
            .collect()
    }

    #[test]
    fn one_record_per_row_even_when_everything_fails() {
        let raw = vec![
            row(0, &[("Block", ""), ("Date", "soon"), ("Weight", "heavy")]),
            row(1, &[("Date", "never")]),
        ];
        let m = mapping(&[("block_id", "Block"), ("collection_date", "Date"), ("weight_mg", "Weight")]);
        let out = apply(&raw, &m, &block());

        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[1].source.row_index, 1);
        for record in &out.records {
            assert!(record.fields.values().all(Option::is_none));
            assert_eq!(record.fields.len(), 4);
        }
    }

    #[test]
    fn unmapped_required_field_is_blocker_on_every_record() {
        let raw = vec![row(0, &[("Tissue", "OCT")]), row(1, &[("Tissue", "OCT")])];
        let out = apply(&raw, &mapping(&[("tissue_type", "Tissue")]), &block());

        for record in &out.records {
            assert_eq!(record.value("block_id"), None);
        }
        assert_eq!(
            rules(&out.findings),
            vec![
                ("block_id", rule_ids::MISSING_REQUIRED_FIELD, Severity::Blocker),
                ("block_id", rule_ids::MISSING_REQUIRED_FIELD, Severity::Blocker),
            ]
        );
        assert!(out.findings[0].description.contains("not mapped"));
    }

    #[test]
    fn uncoercible_required_field_gets_both_findings() {
        let mut schema = block();
        schema.fields[3].required = true;
        let raw = vec![row(0, &[("Block", "B1"), ("Weight", "n/a")])];
        let out = apply(&raw, &mapping(&[("block_id", "Block"), ("weight_mg", "Weight")]), &schema);

        assert_eq!(
            rules(&out.findings),
            vec![
                ("weight_mg", rule_ids::TYPE_MISMATCH, Severity::Warning),
                ("weight_mg", rule_ids::MISSING_REQUIRED_FIELD, Severity::Blocker),
            ]
        );
        assert_eq!(out.findings[0].value.as_deref(), Some("n/a"));
    }

    #[test]
    fn optional_absence_is_silent() {
        let raw = vec![row(0, &[("Block", "B1")])];
        let out = apply(&raw, &mapping(&[("block_id", "Block"), ("tissue_type", "Tissue")]), &block());
        assert!(out.findings.is_empty());
        assert_eq!(out.records[0].value("tissue_type"), None);
    }

    #[test]
    fn whitespace_and_us_dates_are_normalized_with_warnings() {
        let raw = vec![row(0, &[("Block", "  B1 "), ("Date", "03/15/2024")])];
        let out = apply(&raw, &mapping(&[("block_id", "Block"), ("collection_date", "Date")]), &block());

        assert_eq!(
            out.records[0].value("block_id"),
            Some(&FieldValue::String("B1".into()))
        );
        assert_eq!(
            out.records[0].value("collection_date").map(FieldValue::key_text),
            Some("2024-03-15".to_string())
        );
        assert_eq!(
            rules(&out.findings),
            vec![
                ("block_id", rule_ids::WHITESPACE_TRIMMED, Severity::Warning),
                ("collection_date", rule_ids::DATE_FORMAT_NORMALIZED, Severity::Warning),
            ]
        );
        assert_eq!(out.findings[0].suggestion.as_deref(), Some("B1"));
        assert_eq!(out.findings[1].suggestion.as_deref(), Some("2024-03-15"));
    }

    #[test]
    fn slides_file_does_not_describe_blocks() {
        let m = mapping(&[
            ("block_id", "Block_Number"),
            ("tissue_type", "Tissue"),
            ("slide_id", "Slide_Barcode"),
            ("stain", "Stain"),
        ]);
        let header = |cols: &[&str]| cols.iter().map(|c| (*c).to_string()).collect::<Vec<_>>();

        assert_eq!(
            applicable_entities(&schema(), &m, &header(&["Slide_Barcode", "Block_Number", "Stain"])),
            vec![EntityKind::Slide]
        );
        assert_eq!(
            applicable_entities(&schema(), &m, &header(&["Block_Number", "Tissue"])),
            vec![EntityKind::Block]
        );
        assert_eq!(
            applicable_entities(&schema(), &m, &header(&["Block_Number"])),
            vec![EntityKind::Block]
        );
        assert_eq!(
            applicable_entities(
                &schema(),
                &m,
                &header(&["Block_Number", "Tissue", "Slide_Barcode", "Stain"])
            ),
            vec![EntityKind::Block, EntityKind::Slide]
        );
        assert!(applicable_entities(&schema(), &m, &header(&["Unrelated"])).is_empty());
    }

    #[test]
    fn map_files_deduplicates_shared_cell_findings() {
        let m = mapping(&[("block_id", "Block"), ("tissue_type", "Tissue"), ("slide_id", "Slide"), ("stain", "Stain")]);
        let columns: Vec<String> = ["Block", "Tissue", "Slide", "Stain"].iter().map(|c| (*c).to_string()).collect();
        let rows = vec![row(0, &[("Block", " B1"), ("Tissue", "OCT"), ("Slide", "S1"), ("Stain", "HE")])];
        let files = [SourceFile {
            file_id: "fil-1",
            columns: &columns,
            rows: &rows,
        }];

        let set = map_files(&schema(), &m, &files, &CancelToken::new()).unwrap();
        assert_eq!(set.records_of(EntityKind::Block).len(), 1);
        assert_eq!(set.records_of(EntityKind::Slide).len(), 1);
        // block_id is read once for Block and once for Slide's parent reference.
        assert_eq!(rules(&set.findings), vec![("block_id", rule_ids::WHITESPACE_TRIMMED, Severity::Warning)]);
    }

    #[test]
    fn map_files_stops_when_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let result = map_files(&schema(), &mapping(&[]), &[], &token);
        assert_eq!(result, Err(Cancelled));
    }
}
