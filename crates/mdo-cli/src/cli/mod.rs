use clap::Parser;
use mdo_config::MdoConfig;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `mdo` binary.
#[derive(Debug, Parser)]
#[command(
    name = "mdo",
    version,
    about = "Multiomic data orchestrator - harmonize and validate sample sheets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw (defaults to general.default_format)
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract global flags, falling back to configured defaults.
    #[must_use]
    pub fn global_flags(&self, config: &MdoConfig) -> GlobalFlags {
        GlobalFlags {
            format: self
                .format
                .or_else(|| OutputFormat::from_config(&config.general.default_format))
                .unwrap_or(OutputFormat::Json),
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}
