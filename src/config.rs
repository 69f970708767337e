//! Session configuration.
//!
//! [`MappingConfig`] is read from the `[mapping]` section of
//! `config/tidemark.toml` and from `TIDEMARK__MAPPING__*` environment
//! variables, environment taking precedence.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/tidemark.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MappingConfig {
    /// Product name used instead of the one the driver reports
    #[serde(default)]
    pub dialect: Option<String>,
    /// Create tables and indexes on first use of a model
    #[serde(default = "default_true")]
    pub create_tables: bool,
    /// Compare declared model versions with the stored version records
    #[serde(default = "default_true")]
    pub check_versions: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            dialect: None,
            create_tables: true,
            check_versions: true,
        }
    }
}

impl MappingConfig {
    /// Load from `config/tidemark.toml`, falling back to env vars.
    ///
    /// A missing `[mapping]` section yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("TIDEMARK").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("Failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix("TIDEMARK").separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };
        Self::from_settings(&settings)
    }

    /// Parse a TOML document holding a `[mapping]` section.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<MappingConfig>("mapping") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Mapping configuration could not be loaded: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MappingConfig::default();
        assert!(config.create_tables);
        assert!(config.check_versions);
        assert_eq!(config.dialect, None);
    }

    #[test]
    fn test_from_toml() {
        let config = MappingConfig::from_toml("[mapping]\ndialect = \"H2\"\ncheck_versions = false\n").unwrap();
        assert_eq!(config.dialect.as_deref(), Some("H2"));
        assert!(config.create_tables);
        assert!(!config.check_versions);
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let config = MappingConfig::from_toml("[other]\nkey = 1\n").unwrap();
        assert_eq!(config, MappingConfig::default());
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        assert!(MappingConfig::from_toml("[mapping]\ncreate_tables = \"often\"\n").is_err());
    }
}
