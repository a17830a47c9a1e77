//! Field-level evaluation: pattern and enum membership per value.

use mdo_core::entities::{MappedRecord, ValidationFinding};
use mdo_core::enums::Severity;
use regex::Regex;

use crate::rule_ids;

/// What a field rule checks.
#[derive(Debug, Clone)]
pub enum FieldCheck {
    /// The value's text must match.
    Pattern(Regex),
    /// Enum value must be one of these spellings.
    Membership(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: String,
    pub check: FieldCheck,
}

pub(crate) fn evaluate(rules: &[FieldRule], record: &MappedRecord) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for rule in rules {
        let Some(value) = record.value(&rule.field) else {
            continue;
        };
        let text = value.key_text();
        let finding = |severity, rule_id: &str, description: String| {
            ValidationFinding::new(
                &record.source.file_id,
                record.source.row_index,
                &rule.field,
                severity,
                rule_id,
                description,
            )
            .with_value(text.clone())
        };

        match &rule.check {
            FieldCheck::Pattern(regex) => {
                if !regex.is_match(&text) {
                    findings.push(finding(
                        Severity::Blocker,
                        rule_ids::PATTERN_MISMATCH,
                        format!(
                            "Value '{text}' of '{}' does not match pattern {}",
                            rule.field,
                            regex.as_str()
                        ),
                    ));
                }
            }
            FieldCheck::Membership(allowed) => {
                if allowed.iter().any(|a| *a == text) {
                    continue;
                }
                if let Some(canonical) = allowed.iter().find(|a| a.eq_ignore_ascii_case(&text)) {
                    findings.push(
                        finding(
                            Severity::Info,
                            rule_ids::ENUM_CASE_MISMATCH,
                            format!(
                                "Value '{text}' of '{}' differs from '{canonical}' only in case",
                                rule.field
                            ),
                        )
                        .with_suggestion(canonical.clone()),
                    );
                } else {
                    findings.push(finding(
                        Severity::Blocker,
                        rule_ids::ENUM_MEMBERSHIP,
                        format!(
                            "Value '{text}' of '{}' is not one of: {}",
                            rule.field,
                            allowed.join(", ")
                        ),
                    ));
                }
            }
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdo_core::entities::RecordRef;
    use mdo_core::enums::EntityKind;
    use mdo_core::value::FieldValue;

    fn record(field: &str, value: FieldValue) -> MappedRecord {
        MappedRecord {
            entity: EntityKind::Block,
            source: RecordRef {
                file_id: "fil-1".into(),
                row_index: 4,
            },
            fields: [(field.to_string(), Some(value))].into_iter().collect(),
        }
    }

    fn membership() -> Vec<FieldRule> {
        vec![FieldRule {
            field: "tissue_type".into(),
            check: FieldCheck::Membership(vec!["FFPE_Tumor".into(), "OCT".into()]),
        }]
    }

    #[test]
    fn enum_member_passes() {
        let r = record("tissue_type", FieldValue::Enum("OCT".into()));
        assert!(evaluate(&membership(), &r).is_empty());
    }

    #[test]
    fn enum_case_mismatch_is_info_with_suggestion() {
        let r = record("tissue_type", FieldValue::Enum("ffpe_tumor".into()));
        let findings = evaluate(&membership(), &r);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[0].rule_id, rule_ids::ENUM_CASE_MISMATCH);
        assert_eq!(findings[0].suggestion.as_deref(), Some("FFPE_Tumor"));
    }

    #[test]
    fn enum_non_member_is_blocker() {
        let r = record("tissue_type", FieldValue::Enum("Paraffin".into()));
        let findings = evaluate(&membership(), &r);
        assert_eq!(findings[0].severity, Severity::Blocker);
        assert_eq!(findings[0].rule_id, rule_ids::ENUM_MEMBERSHIP);
        assert_eq!(findings[0].row_index, 4);
    }

    #[test]
    fn pattern_mismatch_is_blocker() {
        let rules = vec![FieldRule {
            field: "slide_id".into(),
            check: FieldCheck::Pattern(Regex::new(r"^SLD-\d{4}-\d{4}$").unwrap()),
        }];
        assert!(evaluate(&rules, &record("slide_id", FieldValue::String("SLD-2024-0001".into()))).is_empty());
        let findings = evaluate(&rules, &record("slide_id", FieldValue::String("slide 1".into())));
        assert_eq!(findings[0].rule_id, rule_ids::PATTERN_MISMATCH);
        assert_eq!(findings[0].value.as_deref(), Some("slide 1"));
    }

    #[test]
    fn absent_values_are_skipped() {
        let r = record("other", FieldValue::String("x".into()));
        assert!(evaluate(&membership(), &r).is_empty());
    }
}
