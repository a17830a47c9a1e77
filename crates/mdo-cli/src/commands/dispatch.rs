use mdo_config::MdoConfig;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, config: &MdoConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Schema { action } => commands::schema::handle(&action, config, flags),
        Commands::Harmonize(args) => commands::harmonize::handle(&args, config, flags).await,
    }
}
