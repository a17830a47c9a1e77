//! Schema template locations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemasConfig {
    /// Extra directory of `*.json` templates layered over the built-ins.
    #[serde(default)]
    pub templates_dir: Option<String>,
}

impl SchemasConfig {
    #[must_use]
    pub fn templates_path(&self) -> Option<PathBuf> {
        self.templates_dir
            .as_deref()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_directory_is_ignored() {
        let config = SchemasConfig {
            templates_dir: Some("  ".into()),
        };
        assert!(config.templates_path().is_none());
        assert!(SchemasConfig::default().templates_path().is_none());
    }
}
