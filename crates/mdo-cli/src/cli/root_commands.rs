use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::subcommands::SchemaCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Inspect registered schema templates.
    Schema {
        #[command(subcommand)]
        action: SchemaCommands,
    },
    /// Upload CSV files, apply a mapping, harmonize, and validate in one run.
    Harmonize(HarmonizeArgs),
}

/// Arguments for `mdo harmonize`.
#[derive(Clone, Debug, Args)]
pub struct HarmonizeArgs {
    /// Schema template id the files follow.
    #[arg(long)]
    pub schema: String,
    /// Mapping file (`.toml` or `.json`): canonical field -> source column.
    #[arg(long)]
    pub mapping: PathBuf,
    /// CSV file to upload; repeat for several files, processed in order.
    #[arg(long = "file", required = true)]
    pub files: Vec<PathBuf>,
    /// Write the export bundle to this directory.
    #[arg(long)]
    pub export: Option<PathBuf>,
    /// Owner of the run (defaults to general.user_id).
    #[arg(long)]
    pub user: Option<String>,
}
