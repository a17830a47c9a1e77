use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, bail};
use mdo_config::MdoConfig;
use mdo_core::entities::ValidationFinding;
use mdo_core::enums::{EntityKind, RunStatus, ValidationStatus};
use mdo_pipeline::{CancelToken, NewMapping, Orchestrator};
use serde::{Deserialize, Serialize};

use crate::bootstrap;
use crate::cli::root_commands::HarmonizeArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;

/// On-disk mapping file. `schema_template_id` may be omitted and is then
/// taken from `--schema`.
#[derive(Debug, Deserialize)]
struct MappingFile {
    name: Option<String>,
    schema_template_id: Option<String>,
    mapping: BTreeMap<String, String>,
    #[serde(default)]
    allow_shared_columns: bool,
}

#[derive(Debug, Serialize)]
struct HarmonizeResponse<'a> {
    run_id: &'a str,
    status: RunStatus,
    validation_status: ValidationStatus,
    blockers: usize,
    warnings: usize,
    infos: usize,
    entities: BTreeMap<EntityKind, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<String>,
    findings: &'a [ValidationFinding],
}

fn parse_mapping(path: &Path, text: &str, schema: &str) -> anyhow::Result<NewMapping> {
    let file: MappingFile = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(text).with_context(|| format!("invalid TOML mapping {}", path.display()))?
    } else {
        serde_json::from_str(text).with_context(|| format!("invalid JSON mapping {}", path.display()))?
    };

    let schema_template_id = match file.schema_template_id {
        Some(declared) if declared != schema => {
            bail!("mapping {} targets schema {declared}, not {schema}", path.display())
        }
        Some(declared) => declared,
        None => schema.to_string(),
    };
    let name = file.name.unwrap_or_else(|| {
        path.file_stem()
            .map_or_else(|| "mapping".to_string(), |s| s.to_string_lossy().into_owned())
    });

    Ok(NewMapping {
        name,
        schema_template_id,
        mapping: file.mapping,
        allow_shared_columns: file.allow_shared_columns,
    })
}

/// Handle `mdo harmonize`.
///
/// The run only lives for this process, so it is deleted with its stored
/// uploads however the command ends.
pub async fn handle(args: &HarmonizeArgs, config: &MdoConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.mapping)
        .with_context(|| format!("failed to read mapping {}", args.mapping.display()))?;
    let mapping = parse_mapping(&args.mapping, &text, &args.schema)?;

    let orchestrator = bootstrap::orchestrator(config, bootstrap::load_registry(config)?);
    let user = args.user.as_deref().unwrap_or(&config.general.user_id);
    let run = orchestrator.create_run(user).await?;

    let outcome = harmonize_run(&orchestrator, &run.id, args, mapping, flags).await;
    if let Err(error) = orchestrator.delete_run(&run.id).await {
        tracing::warn!(run_id = %run.id, %error, "could not clean up run uploads");
    }
    outcome
}

async fn harmonize_run(
    orchestrator: &Orchestrator,
    run_id: &str,
    args: &HarmonizeArgs,
    mapping: NewMapping,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    for path in &args.files {
        let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        orchestrator
            .upload_file(run_id, &filename, &args.schema, &bytes)
            .await?;
    }
    orchestrator.attach_mapping(run_id, mapping).await?;

    let cancel = CancelToken::new();
    let on_interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; cancelling harmonization");
                cancel.cancel();
            }
        })
    };
    let report = orchestrator.harmonize(run_id, &cancel).await;
    on_interrupt.abort();
    let report = report?;

    let export = match &args.export {
        Some(dir) => {
            let bundle = orchestrator.export(run_id).await?;
            bundle.write_to_dir(dir)?;
            Some(dir.display().to_string())
        }
        None => None,
    };

    let validation = &report.validation;
    if flags.format == OutputFormat::Table {
        output(&validation.findings, flags.format)?;
        if !flags.quiet {
            eprintln!(
                "run {}: {} ({} blocker(s), {} warning(s), {} info)",
                report.run.id,
                report.run.status,
                validation.blocker_count,
                validation.warning_count,
                validation.info_count
            );
        }
    } else {
        output(
            &HarmonizeResponse {
                run_id: &report.run.id,
                status: report.run.status,
                validation_status: validation.status,
                blockers: validation.blocker_count,
                warnings: validation.warning_count,
                infos: validation.info_count,
                entities: report
                    .summary
                    .kinds
                    .iter()
                    .map(|(kind, stats)| (*kind, stats.entities))
                    .collect(),
                export,
                findings: &validation.findings,
            },
            flags.format,
        )?;
    }

    if !validation.passed() {
        bail!("validation failed with {} blocker(s)", validation.blocker_count);
    }
    Ok(())
}
