use mdo_config::MdoConfig;
use mdo_core::schema::SchemaDefinition;
use serde::Serialize;

use crate::bootstrap;
use crate::cli::subcommands::SchemaCommands;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;

/// One field per row for `mdo schema show --format table`.
#[derive(Debug, Serialize)]
struct FieldRow<'a> {
    entity: String,
    field: &'a str,
    #[serde(rename = "type")]
    field_type: String,
    required: bool,
    key: bool,
    parent: bool,
    allowed: String,
}

fn field_rows(schema: &SchemaDefinition) -> Vec<FieldRow<'_>> {
    schema
        .entities_in_hierarchy_order()
        .into_iter()
        .flat_map(|entity| {
            entity.fields.iter().map(move |field| FieldRow {
                entity: entity.entity.to_string(),
                field: &field.name,
                field_type: field.field_type.to_string(),
                required: field.required,
                key: entity.is_identity_field(&field.name),
                parent: entity.is_parent_field(&field.name),
                allowed: field
                    .pattern
                    .clone()
                    .unwrap_or_else(|| field.allowed_values.join("|")),
            })
        })
        .collect()
}

/// Handle `mdo schema`.
pub fn handle(action: &SchemaCommands, config: &MdoConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let registry = bootstrap::load_registry(config)?;
    match action {
        SchemaCommands::List => output(&registry.list(), flags.format),
        SchemaCommands::Show { id } => {
            let schema = registry.load(id)?;
            if flags.format == OutputFormat::Table {
                output(&field_rows(&schema), flags.format)
            } else {
                output(&*schema, flags.format)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mdo_schema::SchemaRegistry;
    use pretty_assertions::assert_eq;

    use super::field_rows;

    #[test]
    fn field_rows_follow_hierarchy() {
        let registry = SchemaRegistry::builtin().unwrap();
        let schema = registry.load("geomx-v2.0").unwrap();
        let rows = field_rows(&schema);

        let entities: Vec<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities.first(), Some(&"Block"));
        assert_eq!(entities.last(), Some(&"ROI"));

        let slide_block = rows
            .iter()
            .find(|r| r.entity == "Slide" && r.field == "block_id")
            .unwrap();
        assert!(slide_block.parent);
        assert!(!slide_block.key);
    }
}
