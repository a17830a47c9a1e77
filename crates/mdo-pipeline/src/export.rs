//! Export bundle builder.
//!
//! Assembles the read-only view of a validated run into named parts:
//!
//! ```text
//! manifest.json               run, schema, counts, status, SHA-256 per part
//! metadata.json               the run aggregate
//! mapping.json                the attached mapping
//! validation_report.json      the current validation result
//! entities/<Type>.jsonl       one canonical entity per line, per type
//! ```
//!
//! Zipping is left to the caller; [`ExportBundle::write_to_dir`] lays the
//! parts out on disk as-is.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mdo_core::entities::{CanonicalEntity, MappingConfig, Run, ValidationResult};
use mdo_core::enums::{EntityKind, ValidationStatus};
use mdo_core::schema::SchemaDefinition;
use serde::Serialize;
use serde_jsonlines::WriteExt;
use sha2::{Digest, Sha256};

use crate::error::PipelineError;

/// Bumped whenever the bundle layout changes.
pub const BUNDLE_VERSION: &str = "1";

pub const MANIFEST_PATH: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartDigest {
    pub path: String,
    pub sha256: String,
    pub bytes: usize,
}

/// Top-level description of a bundle. Its own digest is not listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub bundle_version: String,
    pub run_id: String,
    pub exported_at: DateTime<Utc>,
    pub schema_id: String,
    pub schema_version: String,
    pub ruleset_version: String,
    pub validation_status: ValidationStatus,
    pub entity_counts: BTreeMap<EntityKind, usize>,
    /// Sorted by path.
    pub parts: Vec<PartDigest>,
}

/// One file of the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePart {
    pub path: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub manifest: Manifest,
    /// Every part including `manifest.json`, sorted by path.
    pub parts: Vec<BundlePart>,
}

/// Read-only inputs of an export.
#[derive(Debug, Clone, Copy)]
pub struct ExportSource<'a> {
    pub run: &'a Run,
    pub schema: &'a SchemaDefinition,
    pub mapping: &'a MappingConfig,
    pub entities: &'a [CanonicalEntity],
    pub validation: &'a ValidationResult,
}

fn json_part(path: &str, value: &impl Serialize) -> Result<BundlePart, PipelineError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| PipelineError::Export(format!("{path}: {e}")))?;
    Ok(BundlePart {
        path: path.to_string(),
        bytes,
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl ExportBundle {
    /// Build a bundle from a run's committed state.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Export` if a part cannot be serialized.
    pub fn build(source: ExportSource<'_>, exported_at: DateTime<Utc>) -> Result<Self, PipelineError> {
        let mut parts = vec![
            json_part("metadata.json", source.run)?,
            json_part("mapping.json", source.mapping)?,
            json_part("validation_report.json", source.validation)?,
        ];

        let mut by_kind: BTreeMap<EntityKind, Vec<&CanonicalEntity>> = BTreeMap::new();
        for entity in source.entities {
            by_kind.entry(entity.entity).or_default().push(entity);
        }
        for (kind, entities) in &by_kind {
            let path = format!("entities/{kind}.jsonl");
            let mut bytes = Vec::new();
            bytes
                .write_json_lines(entities)
                .map_err(|e| PipelineError::Export(format!("{path}: {e}")))?;
            parts.push(BundlePart { path, bytes });
        }
        parts.sort_by(|a, b| a.path.cmp(&b.path));

        let manifest = Manifest {
            bundle_version: BUNDLE_VERSION.to_string(),
            run_id: source.run.id.clone(),
            exported_at,
            schema_id: source.schema.id.clone(),
            schema_version: source.schema.version.clone(),
            ruleset_version: source.schema.ruleset_version.clone(),
            validation_status: source.validation.status,
            entity_counts: by_kind.iter().map(|(k, v)| (*k, v.len())).collect(),
            parts: parts
                .iter()
                .map(|p| PartDigest {
                    path: p.path.clone(),
                    sha256: sha256_hex(&p.bytes),
                    bytes: p.bytes.len(),
                })
                .collect(),
        };

        parts.push(json_part(MANIFEST_PATH, &manifest)?);
        parts.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self { manifest, parts })
    }

    #[must_use]
    pub fn part(&self, path: &str) -> Option<&BundlePart> {
        self.parts.iter().find(|p| p.path == path)
    }

    /// Write every part below `dir`, creating directories as needed.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Export` on any filesystem failure.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let mut written = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let path = dir.join(&part.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| PipelineError::Export(format!("{}: {e}", parent.display())))?;
            }
            fs::write(&path, &part.bytes)
                .map_err(|e| PipelineError::Export(format!("{}: {e}", path.display())))?;
            written.push(path);
        }
        tracing::info!(dir = %dir.display(), parts = written.len(), "export bundle written");
        Ok(written)
    }
}
