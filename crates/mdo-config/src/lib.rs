//! # mdo-config
//!
//! Layered configuration loading for MDO using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`MDO_*` prefix, `__` as separator)
//! 2. Project-level `.mdo/config.toml`
//! 3. User-level `~/.config/mdo/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `MDO_UPLOAD__MAX_UPLOAD_SIZE` -> `upload.max_upload_size`,
//! `MDO_PIPELINE__LEASE_TTL_SECS` -> `pipeline.lease_ttl_secs`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use mdo_config::MdoConfig;
//!
//! let config = MdoConfig::load_with_dotenv().expect("config");
//! println!("uploads go to {}", config.upload.upload_dir);
//! ```

mod error;
mod general;
mod pipeline;
mod schemas;
mod upload;

pub use error::ConfigError;
pub use general::{GeneralConfig, OUTPUT_FORMATS};
pub use pipeline::PipelineConfig;
pub use schemas::SchemasConfig;
pub use upload::{DEFAULT_MAX_UPLOAD_SIZE, UploadConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MdoConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub schemas: SchemasConfig,
}

impl MdoConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed and
    /// `ConfigError::InvalidValue` if a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer extra providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".mdo/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("MDO_").split("__"))
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_upload_size == 0 {
            return Err(invalid("upload.max_upload_size", "must be greater than zero"));
        }
        if self.upload.upload_dir.trim().is_empty() {
            return Err(invalid("upload.upload_dir", "must not be empty"));
        }
        if self.pipeline.lease_ttl_secs == 0 {
            return Err(invalid("pipeline.lease_ttl_secs", "must be greater than zero"));
        }
        if self.general.user_id.trim().is_empty() {
            return Err(invalid("general.user_id", "must not be empty"));
        }
        if !OUTPUT_FORMATS.contains(&self.general.default_format.as_str()) {
            return Err(invalid(
                "general.default_format",
                &format!("expected one of {}", OUTPUT_FORMATS.join(", ")),
            ));
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mdo").join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MdoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.general.user_id, "local");
        assert!(config.schemas.templates_dir.is_none());
    }

    #[test]
    fn zero_lease_ttl_rejected() {
        let mut config = MdoConfig::default();
        config.pipeline.lease_ttl_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "pipeline.lease_ttl_secs")
        );
    }

    #[test]
    fn unknown_format_rejected() {
        let mut config = MdoConfig::default();
        config.general.default_format = "yaml".into();
        assert!(config.validate().is_err());
    }
}
