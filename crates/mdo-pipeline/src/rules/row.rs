//! Row-level evaluation: cross-field predicates over one record.

use mdo_core::entities::{MappedRecord, ValidationFinding};
use mdo_core::enums::EntityKind;
use mdo_core::schema::{RowPredicate, RowRuleDef};

use super::message::render;

/// `Some(true)` when the predicate is violated, `None` when it does not apply
/// because a referenced value is absent.
fn violated(predicate: &RowPredicate, record: &MappedRecord) -> Option<bool> {
    match predicate {
        RowPredicate::NotBefore { field, other } => {
            let (a, b) = (record.value(field)?.as_date()?, record.value(other)?.as_date()?);
            Some(a < b)
        }
        RowPredicate::NotGreaterThan { field, other } => {
            let (a, b) = (
                record.value(field)?.as_number()?,
                record.value(other)?.as_number()?,
            );
            Some(a > b)
        }
        // Presence is the point of this predicate, so absence is not skipped.
        RowPredicate::Requires { field, other } => {
            Some(record.value(other).is_some() && record.value(field).is_none())
        }
        RowPredicate::Distinct { field, other } => {
            let (a, b) = (record.value(field)?, record.value(other)?);
            Some(a.key_text() == b.key_text())
        }
    }
}

pub(crate) fn evaluate(
    kind: EntityKind,
    rules: &[RowRuleDef],
    record: &MappedRecord,
) -> Vec<ValidationFinding> {
    rules
        .iter()
        .filter(|rule| violated(&rule.predicate, record) == Some(true))
        .map(|rule| {
            let [field, other] = rule.predicate.fields();
            let value = record.value(field).map(|v| v.key_text());
            let description = render(
                &rule.message,
                &[
                    ("entity", kind.as_str()),
                    ("field", field),
                    ("other", other),
                    ("value", value.as_deref().unwrap_or("")),
                ],
            );
            let finding = ValidationFinding::new(
                &record.source.file_id,
                record.source.row_index,
                field,
                rule.severity,
                &rule.id,
                description,
            );
            match value {
                Some(v) => finding.with_value(v),
                None => finding,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mdo_core::entities::RecordRef;
    use mdo_core::enums::Severity;
    use mdo_core::value::FieldValue;
    use rstest::rstest;

    fn date(s: &str) -> Option<FieldValue> {
        Some(FieldValue::Date(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()))
    }

    fn record(fields: Vec<(&str, Option<FieldValue>)>) -> MappedRecord {
        MappedRecord {
            entity: EntityKind::Slide,
            source: RecordRef {
                file_id: "fil-1".into(),
                row_index: 0,
            },
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    fn rule(predicate: RowPredicate) -> RowRuleDef {
        RowRuleDef {
            id: "r1".into(),
            predicate,
            severity: Severity::Blocker,
            message: "{entity} {field} ({value}) vs {other}".into(),
        }
    }

    fn not_before() -> RowRuleDef {
        rule(RowPredicate::NotBefore {
            field: "imaged".into(),
            other: "stained".into(),
        })
    }

    #[test]
    fn date_order_violation_tagged_with_first_field() {
        let r = record(vec![("imaged", date("2024-01-01")), ("stained", date("2024-02-01"))]);
        let findings = evaluate(EntityKind::Slide, &[not_before()], &r);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].column_name, "imaged");
        assert_eq!(findings[0].description, "Slide imaged (2024-01-01) vs stained");
    }

    #[rstest]
    #[case::same_day(date("2024-02-01"))]
    #[case::later(date("2024-03-01"))]
    #[case::absent(None)]
    fn date_order_holds_or_is_skipped(#[case] imaged: Option<FieldValue>) {
        let r = record(vec![("imaged", imaged), ("stained", date("2024-02-01"))]);
        assert!(evaluate(EntityKind::Slide, &[not_before()], &r).is_empty());
    }

    #[test]
    fn not_greater_than() {
        let rules = [rule(RowPredicate::NotGreaterThan {
            field: "read".into(),
            other: "max".into(),
        })];
        let over = record(vec![("read", Some(FieldValue::Number(151.0))), ("max", Some(FieldValue::Number(150.0)))]);
        let equal = record(vec![("read", Some(FieldValue::Number(150.0))), ("max", Some(FieldValue::Number(150.0)))]);
        assert_eq!(evaluate(EntityKind::SequencingRun, &rules, &over).len(), 1);
        assert!(evaluate(EntityKind::SequencingRun, &rules, &equal).is_empty());
    }

    #[test]
    fn requires_fires_on_missing_dependent() {
        let rules = [rule(RowPredicate::Requires {
            field: "kit".into(),
            other: "barcode".into(),
        })];
        let missing = record(vec![("kit", None), ("barcode", Some(FieldValue::String("AC".into())))]);
        let neither = record(vec![("kit", None), ("barcode", None)]);
        let findings = evaluate(EntityKind::Library, &rules, &missing);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].value, None);
        assert!(evaluate(EntityKind::Library, &rules, &neither).is_empty());
    }

    #[test]
    fn distinct_compares_text() {
        let rules = [rule(RowPredicate::Distinct {
            field: "a".into(),
            other: "b".into(),
        })];
        let same = record(vec![("a", Some(FieldValue::String("X".into()))), ("b", Some(FieldValue::Enum("X".into())))]);
        assert_eq!(evaluate(EntityKind::Block, &rules, &same).len(), 1);
    }
}
