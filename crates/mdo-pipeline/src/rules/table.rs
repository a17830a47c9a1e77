//! Table-level evaluation: uniqueness over one entity type.
//!
//! Occurrences are keyed by the constrained field tuple. The first holder of a
//! key is never flagged; every later one is, so `N` sharers yield `N - 1`
//! findings. Tuples with an absent component are ignored.

use std::collections::{BTreeMap, HashMap};

use mdo_core::entities::{RecordRef, ValidationFinding};
use mdo_core::enums::EntityKind;
use mdo_core::schema::UniqueRuleDef;
use mdo_core::value::FieldValue;

use super::message::render;

/// One row or entity as seen by a uniqueness rule.
pub(crate) struct Occurrence<'a> {
    pub location: &'a RecordRef,
    pub fields: &'a BTreeMap<String, Option<FieldValue>>,
}

fn key_of(rule: &UniqueRuleDef, fields: &BTreeMap<String, Option<FieldValue>>) -> Option<String> {
    let parts: Option<Vec<String>> = rule
        .fields
        .iter()
        .map(|f| fields.get(f).and_then(Option::as_ref).map(FieldValue::key_text))
        .collect();
    parts.map(|p| p.join(":"))
}

pub(crate) fn evaluate<'a>(
    kind: EntityKind,
    rule: &UniqueRuleDef,
    occurrences: impl IntoIterator<Item = Occurrence<'a>>,
) -> Vec<ValidationFinding> {
    let column = rule.fields.first().map_or("", String::as_str);
    let mut first_seen: HashMap<String, &RecordRef> = HashMap::new();
    let mut findings = Vec::new();

    for occurrence in occurrences {
        let Some(key) = key_of(rule, occurrence.fields) else {
            continue;
        };
        match first_seen.get(&key) {
            None => {
                first_seen.insert(key, occurrence.location);
            }
            Some(first) => {
                let description = render(
                    &rule.message,
                    &[
                        ("entity", kind.as_str()),
                        ("field", column),
                        ("key", key.as_str()),
                        ("value", key.as_str()),
                    ],
                );
                findings.push(
                    ValidationFinding::new(
                        &occurrence.location.file_id,
                        occurrence.location.row_index,
                        column,
                        rule.severity,
                        &rule.id,
                        format!(
                            "{description} (first seen in {} row {})",
                            first.file_id, first.row_index
                        ),
                    )
                    .with_value(key),
                );
            }
        }
    }
    findings
}
