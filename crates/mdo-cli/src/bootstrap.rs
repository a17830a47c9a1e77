use std::sync::Arc;

use anyhow::Context;
use mdo_config::MdoConfig;
use mdo_pipeline::{Orchestrator, PipelineSettings};
use mdo_schema::SchemaRegistry;
use mdo_store::{CsvDirStore, MemoryRunStore};

/// Load layered configuration, honouring a `.env` in the working directory.
pub fn load_config() -> anyhow::Result<MdoConfig> {
    MdoConfig::load_with_dotenv().context("failed to load mdo configuration")
}

/// Built-in templates plus `schemas.templates_dir`, when configured.
pub fn load_registry(config: &MdoConfig) -> anyhow::Result<SchemaRegistry> {
    match config.schemas.templates_path() {
        Some(dir) => SchemaRegistry::with_directory(&dir)
            .with_context(|| format!("failed to load schema templates from {}", dir.display())),
        None => SchemaRegistry::builtin().context("built-in schema templates are invalid"),
    }
}

/// One-process orchestrator: runs live in memory, uploads under `upload.upload_dir`.
pub fn orchestrator(config: &MdoConfig, registry: SchemaRegistry) -> Orchestrator {
    tracing::debug!(upload_dir = %config.upload.upload_dir, "using CSV upload directory");
    Orchestrator::new(
        Arc::new(registry),
        Arc::new(MemoryRunStore::new()),
        Arc::new(CsvDirStore::new(&config.upload.upload_dir)),
        PipelineSettings::from(config),
    )
}
