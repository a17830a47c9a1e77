//! Harmonization pipeline tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_lease_ttl_secs() -> u64 {
    600
}

const fn default_parallel_rules() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// How long a harmonization lease stays valid before another request may
    /// take it over.
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,

    /// Evaluate field- and row-level rules on the rayon pool.
    #[serde(default = "default_parallel_rules")]
    pub parallel_rules: bool,
}

impl PipelineConfig {
    #[must_use]
    pub const fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lease_ttl_secs: default_lease_ttl_secs(),
            parallel_rules: default_parallel_rules(),
        }
    }
}
