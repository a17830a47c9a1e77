//! Loading extra templates from a directory on top of the built-ins.

use std::fs;

use mdo_core::enums::EntityKind;
use mdo_schema::{SchemaError, SchemaRegistry};
use pretty_assertions::assert_eq;
use rstest::rstest;

const VISIUM: &str = r#"{
  "id": "visium-v1.5",
  "name": "Visium v1.5",
  "version": "1.5.0",
  "entities": [
    {
      "entity": "Block",
      "fields": [{ "name": "block_id", "type": "string", "required": true }],
      "identity_key": ["block_id"]
    },
    {
      "entity": "Slide",
      "fields": [
        { "name": "capture_area", "type": "enum", "required": true, "allowed_values": ["A1", "B1", "C1", "D1"] },
        { "name": "block_id", "type": "string", "required": true }
      ],
      "identity_key": ["capture_area"],
      "parent": { "entity": "Block", "fields": ["block_id"] }
    }
  ]
}"#;

fn dir_with(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in files {
        fs::write(dir.path().join(name), body).unwrap();
    }
    dir
}

#[test]
fn directory_templates_extend_builtins() {
    let dir = dir_with(&[("visium.json", VISIUM), ("notes.txt", "ignored")]);
    let registry = SchemaRegistry::with_directory(dir.path()).unwrap();

    assert_eq!(registry.schema_count(), 3);
    let visium = registry.load("visium-v1.5").unwrap();
    assert_eq!(visium.ruleset_version, "1");
    let order: Vec<EntityKind> = visium
        .entities_in_hierarchy_order()
        .iter()
        .map(|e| e.entity)
        .collect();
    assert_eq!(order, vec![EntityKind::Block, EntityKind::Slide]);
}

#[test]
fn directory_template_overrides_builtin_with_same_id() {
    let replacement = VISIUM
        .replace("visium-v1.5", "geomx-v2.0")
        .replace("Visium v1.5", "GeoMx (site copy)");
    let dir = dir_with(&[("geomx.json", &replacement)]);
    let registry = SchemaRegistry::with_directory(dir.path()).unwrap();

    assert_eq!(registry.schema_count(), 2);
    assert_eq!(registry.load("geomx-v2.0").unwrap().name, "GeoMx (site copy)");
}

#[test]
fn two_directory_templates_with_one_id_conflict() {
    let dir = dir_with(&[("a.json", VISIUM), ("b.json", VISIUM)]);
    let err = SchemaRegistry::with_directory(dir.path()).unwrap_err();
    assert!(matches!(err, SchemaError::Duplicate(id) if id == "visium-v1.5"));
}

#[rstest]
#[case::unknown_key(r#""identity_key": ["capture_area"],"#, r#""identity_key": ["capture_area"], "colour": "red","#)]
#[case::bad_type(r#""type": "string", "required": true }],"#, r#""type": "text", "required": true }],"#)]
fn structurally_invalid_templates_are_rejected(#[case] from: &str, #[case] to: &str) {
    let broken = VISIUM.replacen(from, to, 1);
    assert_ne!(broken, VISIUM);
    let dir = dir_with(&[("visium.json", &broken)]);
    let err = SchemaRegistry::with_directory(dir.path()).unwrap_err();
    assert!(matches!(err, SchemaError::ValidationFailed { .. }), "{err}");
}

#[test]
fn semantic_errors_name_the_schema() {
    let broken = VISIUM.replace(r#""fields": ["block_id"]"#, r#""fields": ["block_id", "capture_area"]"#);
    let dir = dir_with(&[("visium.json", &broken)]);
    match SchemaRegistry::with_directory(dir.path()).unwrap_err() {
        SchemaError::Invalid { schema_id, errors } => {
            assert_eq!(schema_id, "visium-v1.5");
            assert!(errors.iter().any(|e| e.contains("identity key has 1")), "{errors:?}");
        }
        other => panic!("expected Invalid, got {other}"),
    }
}

#[test]
fn missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SchemaRegistry::with_directory(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, SchemaError::Io(_)));
}
