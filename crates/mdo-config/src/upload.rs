//! Upload limits and staging directory.

use serde::{Deserialize, Serialize};

/// 100 MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

const fn default_max_upload_size() -> u64 {
    DEFAULT_MAX_UPLOAD_SIZE
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Directory the CSV file store writes uploaded files into.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_upload_size: default_max_upload_size(),
        }
    }
}
