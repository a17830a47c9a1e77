//! Semantic checks on a structurally valid [`SchemaDefinition`].
//!
//! Structural validity (required keys, enum spellings, no unknown keys) is
//! handled by the JSON Schema pass. This module catches what a JSON Schema
//! cannot express: cross-references between fields, keys, rules, and parents.

use std::collections::{BTreeMap, BTreeSet};

use mdo_core::enums::FieldType;
use mdo_core::schema::{EntitySchema, RowPredicate, SchemaDefinition};
use regex::Regex;

use crate::error::SchemaError;

/// Run every semantic check and report all problems at once.
pub(crate) fn check_definition(def: &SchemaDefinition) -> Result<(), SchemaError> {
    let mut errors = Vec::new();

    if def.id.trim().is_empty() {
        errors.push("schema id is empty".to_string());
    }
    if def.entities.is_empty() {
        errors.push("schema declares no entities".to_string());
    }

    let mut seen_kinds = BTreeSet::new();
    for entity in &def.entities {
        if !seen_kinds.insert(entity.entity) {
            errors.push(format!("entity {} declared twice", entity.entity));
        }
    }

    // Fields sharing a canonical name read the same source column, so their
    // types must agree across entities.
    let mut field_types: BTreeMap<&str, (FieldType, String)> = BTreeMap::new();
    for entity in &def.entities {
        for field in &entity.fields {
            match field_types.get(field.name.as_str()) {
                Some((ty, owner)) if *ty != field.field_type => errors.push(format!(
                    "field '{}' is {} in {} but {} in {}",
                    field.name, ty, owner, field.field_type, entity.entity
                )),
                Some(_) => {}
                None => {
                    field_types.insert(&field.name, (field.field_type, entity.entity.to_string()));
                }
            }
        }
    }

    let mut rule_ids = BTreeSet::new();
    for entity in &def.entities {
        check_entity(def, entity, &mut errors);
        for id in entity
            .row_rules
            .iter()
            .map(|r| r.id.as_str())
            .chain(entity.unique.iter().map(|u| u.id.as_str()))
        {
            if !rule_ids.insert(id) {
                errors.push(format!("rule id '{id}' declared more than once"));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Invalid {
            schema_id: def.id.clone(),
            errors,
        })
    }
}

fn check_entity(def: &SchemaDefinition, entity: &EntitySchema, errors: &mut Vec<String>) {
    let kind = entity.entity;
    let mut names = BTreeSet::new();

    for field in &entity.fields {
        if !names.insert(field.name.as_str()) {
            errors.push(format!("{kind}: field '{}' declared twice", field.name));
        }
        match field.field_type {
            FieldType::Enum if field.allowed_values.is_empty() => errors.push(format!(
                "{kind}: enum field '{}' has no allowed values",
                field.name
            )),
            FieldType::String | FieldType::Number | FieldType::Date
                if !field.allowed_values.is_empty() =>
            {
                errors.push(format!(
                    "{kind}: allowed_values on non-enum field '{}'",
                    field.name
                ));
            }
            _ => {}
        }
        if let Some(pattern) = &field.pattern {
            if let Err(e) = Regex::new(pattern) {
                errors.push(format!("{kind}: field '{}' pattern: {e}", field.name));
            }
        }
    }

    if entity.identity_key.is_empty() {
        errors.push(format!("{kind}: identity_key is empty"));
    }
    for key in &entity.identity_key {
        match entity.field(key) {
            None => errors.push(format!("{kind}: identity key '{key}' is not a field")),
            Some(f) if !f.required => {
                errors.push(format!("{kind}: identity key '{key}' must be required"));
            }
            Some(_) => {}
        }
    }

    if let Some(parent) = &entity.parent {
        if parent.entity.level() >= kind.level() {
            errors.push(format!(
                "{kind}: parent {} does not precede it in the hierarchy",
                parent.entity
            ));
        }
        match def.entity(parent.entity) {
            None => errors.push(format!(
                "{kind}: parent {} is not declared by this schema",
                parent.entity
            )),
            Some(parent_schema) if parent_schema.identity_key.len() != parent.fields.len() => {
                errors.push(format!(
                    "{kind}: parent reference has {} fields but {} identity key has {}",
                    parent.fields.len(),
                    parent.entity,
                    parent_schema.identity_key.len()
                ));
            }
            Some(_) => {}
        }
        for field in &parent.fields {
            if entity.field(field).is_none() {
                errors.push(format!("{kind}: parent field '{field}' is not a field"));
            }
        }
    }

    for rule in &entity.row_rules {
        for field in rule.predicate.fields() {
            if entity.field(field).is_none() {
                errors.push(format!(
                    "{kind}: row rule '{}' references unknown field '{field}'",
                    rule.id
                ));
            }
        }
        let expected = match &rule.predicate {
            RowPredicate::NotBefore { .. } => Some(FieldType::Date),
            RowPredicate::NotGreaterThan { .. } => Some(FieldType::Number),
            RowPredicate::Requires { .. } | RowPredicate::Distinct { .. } => None,
        };
        if let Some(expected) = expected {
            for field in rule.predicate.fields() {
                if let Some(def) = entity.field(field) {
                    if def.field_type != expected {
                        errors.push(format!(
                            "{kind}: row rule '{}' needs {expected} field, '{field}' is {}",
                            rule.id, def.field_type
                        ));
                    }
                }
            }
        }
    }

    for rule in &entity.unique {
        if rule.fields.is_empty() {
            errors.push(format!("{kind}: unique rule '{}' has no fields", rule.id));
        }
        for field in &rule.fields {
            if entity.field(field).is_none() {
                errors.push(format!(
                    "{kind}: unique rule '{}' references unknown field '{field}'",
                    rule.id
                ));
            }
        }
    }
}
