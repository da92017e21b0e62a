#![forbid(unsafe_code)]

//! Layered settings: built-in defaults, then a TOML file, then `ALM_*` environment variables.

use alm_storage::StoreConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_STORAGE_DIR: &str = ".alm";
pub const CONFIG_FILE_NAME: &str = "alm.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage_dir: PathBuf,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `alm_storage=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Loads the configuration.
///
/// An explicit `config_file` must exist. Without one, `alm.toml` inside the storage directory is
/// read when present. `storage_dir` from the command line wins over every other source.
pub fn load(config_file: Option<&Path>, storage_dir: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();
    let mut builder = Config::builder().add_source(Config::try_from(&defaults)?);

    builder = match config_file {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => {
            let dir = storage_dir.unwrap_or(&defaults.storage_dir);
            builder.add_source(File::from(dir.join(CONFIG_FILE_NAME)).required(false))
        }
    };

    builder = builder.add_source(
        Environment::with_prefix("ALM")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    if let Some(dir) = storage_dir {
        builder = builder.set_override("storage_dir", dir.to_string_lossy().into_owned())?;
    }

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load(None, Some(dir.path())).expect("load");
        assert_eq!(config.storage_dir, dir.path());
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn file_in_storage_dir_overrides_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[store]\nbusy_timeout_ms = 250\nexclusive_locking = false\n\n[logging]\nformat = \"json\"\n",
        )
        .expect("write config");

        let config = load(None, Some(dir.path())).expect("load");
        assert_eq!(config.store.busy_timeout_ms, 250);
        assert!(!config.store.exclusive_locking);
        assert_eq!(config.store.database_file, "database.db3");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.toml");
        assert!(load(Some(&missing), Some(dir.path())).is_err());
    }
}
