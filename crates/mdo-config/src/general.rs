//! General application configuration.

use serde::{Deserialize, Serialize};

/// Output formats understood by the CLI.
pub const OUTPUT_FORMATS: [&str; 3] = ["json", "table", "raw"];

fn default_user_id() -> String {
    "local".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Owner recorded on runs and mappings created from this machine.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Output format used when `--format` is not given.
    #[serde(default = "default_format")]
    pub default_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            default_format: default_format(),
        }
    }
}
