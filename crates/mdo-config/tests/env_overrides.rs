use figment::Jail;
use mdo_config::{ConfigError, MdoConfig};

#[test]
fn env_sets_nested_values() {
    Jail::expect_with(|jail| {
        jail.set_env("MDO_UPLOAD__MAX_UPLOAD_SIZE", "2048");
        jail.set_env("MDO_PIPELINE__PARALLEL_RULES", "false");
        jail.set_env("MDO_SCHEMAS__TEMPLATES_DIR", "./templates");

        let config = MdoConfig::load().expect("config loads");
        assert_eq!(config.upload.max_upload_size, 2048);
        assert!(!config.pipeline.parallel_rules);
        assert_eq!(config.schemas.templates_dir.as_deref(), Some("./templates"));
        Ok(())
    });
}

#[test]
fn env_zero_ttl_is_invalid() {
    Jail::expect_with(|jail| {
        jail.set_env("MDO_PIPELINE__LEASE_TTL_SECS", "0");

        let err = MdoConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }), "{err}");
        Ok(())
    });
}

#[test]
fn malformed_env_value_is_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("MDO_UPLOAD__MAX_UPLOAD_SIZE", "a lot");

        let err = MdoConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)), "{err}");
        Ok(())
    });
}
