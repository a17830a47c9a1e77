use clap::Subcommand;

/// Schema template inspection.
#[derive(Clone, Debug, Subcommand)]
pub enum SchemaCommands {
    /// List registered templates.
    List,
    /// Show one template's entities and fields.
    Show {
        /// Template id, e.g. cosmx-v1.2.
        id: String,
    },
}
