//! Canonical schema definitions.
//!
//! A schema template (e.g. `cosmx-v1.2`) describes every entity type a vendor
//! export can populate. Templates are plain JSON documents deserialized into
//! [`SchemaDefinition`]; the registry in `mdo-schema` validates them against
//! the JSON Schema generated from these types before use.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityKind, FieldType, Severity};

const fn default_blocker() -> Severity {
    Severity::Blocker
}

fn default_ruleset_version() -> String {
    "1".to_string()
}

/// Lightweight listing entry returned by `SchemaRegistry::list`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SchemaSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
}

/// A complete schema template.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SchemaDefinition {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vendor: Option<String>,
    /// Version of the rule declarations, reported in export manifests.
    #[serde(default = "default_ruleset_version")]
    pub ruleset_version: String,
    pub entities: Vec<EntitySchema>,
}

impl SchemaDefinition {
    #[must_use]
    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
        }
    }

    /// Entity schema for `kind`, if the template declares it.
    #[must_use]
    pub fn entity(&self, kind: EntityKind) -> Option<&EntitySchema> {
        self.entities.iter().find(|e| e.entity == kind)
    }

    /// Declared entity schemas in hierarchy order.
    #[must_use]
    pub fn entities_in_hierarchy_order(&self) -> Vec<&EntitySchema> {
        let mut entities: Vec<&EntitySchema> = self.entities.iter().collect();
        entities.sort_by_key(|e| e.entity.level());
        entities
    }

    /// Every canonical field name declared by any entity.
    #[must_use]
    pub fn field_names(&self) -> BTreeSet<&str> {
        self.entities
            .iter()
            .flat_map(|e| e.fields.iter().map(|f| f.name.as_str()))
            .collect()
    }
}

/// Field layout, identity, lineage, and rules for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EntitySchema {
    pub entity: EntityKind,
    /// Ordered field definitions.
    pub fields: Vec<FieldDef>,
    /// Fields whose values together identify one real-world entity.
    pub identity_key: Vec<String>,
    #[serde(default)]
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub row_rules: Vec<RowRuleDef>,
    #[serde(default)]
    pub unique: Vec<UniqueRuleDef>,
}

impl EntitySchema {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is one of the fields carrying the parent's identity.
    #[must_use]
    pub fn is_parent_field(&self, name: &str) -> bool {
        self.parent
            .as_ref()
            .is_some_and(|p| p.fields.iter().any(|f| f == name))
    }

    /// Fields describing this entity itself (not its parent reference).
    pub fn own_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !self.is_parent_field(&f.name))
    }

    #[must_use]
    pub fn is_identity_field(&self, name: &str) -> bool {
        self.identity_key.iter().any(|k| k == name)
    }
}

/// One canonical field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Allowed values for `enum` fields.
    #[serde(default)]
    pub allowed_values: Vec<String>,
    /// Regular expression the textual value must match.
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Declares which parent entity a child belongs to and which child fields
/// carry the parent's identity key (same order as the parent's key).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ParentRef {
    pub entity: EntityKind,
    pub fields: Vec<String>,
}

/// A row-level rule: a predicate over a single record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RowRuleDef {
    pub id: String,
    pub predicate: RowPredicate,
    #[serde(default = "default_blocker")]
    pub severity: Severity,
    /// Message template; supports `{field}`, `{other}`, `{value}`, `{entity}`.
    pub message: String,
}

/// Cross-field predicates. `field` is always the first referenced field and
/// is the one findings are tagged with.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowPredicate {
    /// Date `field` must not be earlier than date `other`.
    NotBefore { field: String, other: String },
    /// Number `field` must not exceed number `other`.
    NotGreaterThan { field: String, other: String },
    /// `field` must be present whenever `other` is present.
    Requires { field: String, other: String },
    /// `field` and `other` must not hold the same value.
    Distinct { field: String, other: String },
}

impl RowPredicate {
    /// Referenced fields, first field first.
    #[must_use]
    pub fn fields(&self) -> [&str; 2] {
        match self {
            Self::NotBefore { field, other }
            | Self::NotGreaterThan { field, other }
            | Self::Requires { field, other }
            | Self::Distinct { field, other } => [field.as_str(), other.as_str()],
        }
    }

    #[must_use]
    pub fn first_field(&self) -> &str {
        self.fields()[0]
    }
}

/// Which cardinality a uniqueness rule observes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UniqueScope {
    /// Canonical entities after identity merge.
    #[default]
    Entities,
    /// Mapped records before identity merge.
    Records,
}

/// A table-level uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UniqueRuleDef {
    pub id: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub scope: UniqueScope,
    #[serde(default = "default_blocker")]
    pub severity: Severity,
    /// Message template; supports `{field}`, `{key}`, `{entity}`.
    pub message: String,
}
